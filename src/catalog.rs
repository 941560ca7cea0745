use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info};

use crate::adapter::Row;
use crate::error::KplrError;
use crate::query::parse_archive_csv;
use crate::spatial::SpatialIndex;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Catalog {
    Planets,
    Kois,
    Stars,
    K2Targets,
}

impl Catalog {
    pub const ALL: [Catalog; 4] = [
        Catalog::Planets,
        Catalog::Kois,
        Catalog::Stars,
        Catalog::K2Targets,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Catalog::Planets => "planets",
            Catalog::Kois => "cumulative",
            Catalog::Stars => "keplerstellar",
            Catalog::K2Targets => "k2targets",
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

pub struct CatalogStore<T: Transport> {
    data_root: Utf8PathBuf,
    archive_url: String,
    transport: T,
}

impl<T: Transport> CatalogStore<T> {
    pub fn new(
        data_root: impl Into<Utf8PathBuf>,
        archive_url: impl Into<String>,
        transport: T,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            archive_url: archive_url.into(),
            transport,
        }
    }

    pub fn path(&self, catalog: Catalog) -> Utf8PathBuf {
        self.data_root
            .join("catalogs")
            .join(format!("{}.csv", catalog.table()))
    }

    pub fn url(&self, catalog: Catalog) -> String {
        format!("{}?table={}&select=*", self.archive_url, catalog.table())
    }

    pub fn fetch(&self, catalog: Catalog, overwrite: bool) -> Result<Utf8PathBuf, KplrError> {
        let path = self.path(catalog);
        if !overwrite && path.as_std_path().exists() {
            info!(%path, "found local catalog");
            return Ok(path);
        }

        let url = self.url(catalog);
        info!(%url, "downloading catalog");
        let response = self.transport.get(&url)?;
        if !response.is_ok() {
            return Err(KplrError::Status {
                status: response.status,
                url,
                message: response.text(),
            });
        }

        // Status only: a full table can hold the error marker as data.
        write_atomic(&path, &response.body)?;
        info!(%path, bytes = response.body.len(), "saved catalog");
        Ok(path)
    }

    pub fn rows(&self, catalog: Catalog) -> Result<Vec<Row>, KplrError> {
        let path = self.fetch(catalog, false)?;
        let bytes = fs::read(path.as_std_path())
            .map_err(|err| KplrError::Filesystem(format!("read {path}: {err}")))?;
        let corrupt = |message: String| KplrError::CorruptCatalog {
            path: path.to_string(),
            message,
        };
        let text = String::from_utf8(bytes).map_err(|err| corrupt(err.to_string()))?;
        parse_archive_csv(&text).map_err(|err| corrupt(err.to_string()))
    }

    /// KOI rows merged with the stellar rows of the same `kepid`. Columns
    /// present in both get `_x` (KOI) and `_y` (star) suffixes.
    pub fn join_stars(&self) -> Result<Vec<Row>, KplrError> {
        let kois = self.rows(Catalog::Kois)?;
        let stars = self.rows(Catalog::Stars)?;
        Ok(join_on_kepid(&kois, &stars))
    }

    pub fn spatial(&self, catalog: Catalog) -> Result<SpatialIndex, KplrError> {
        Ok(SpatialIndex::build(self.rows(catalog)?))
    }

    pub fn download_all(&self, overwrite: bool) -> Result<Vec<Utf8PathBuf>, KplrError> {
        Catalog::ALL
            .iter()
            .map(|catalog| self.fetch(*catalog, overwrite))
            .collect()
    }
}

fn join_on_kepid(left: &[Row], right: &[Row]) -> Vec<Row> {
    const KEY: &str = "kepid";

    let mut by_kepid: HashMap<i64, Vec<&Row>> = HashMap::new();
    for row in right {
        if let Some(kepid) = row.int(KEY) {
            by_kepid.entry(kepid).or_default().push(row);
        }
    }

    let mut joined = Vec::new();
    for row in left {
        let Some(matches) = row.int(KEY).and_then(|kepid| by_kepid.get(&kepid)) else {
            continue;
        };
        for other in matches {
            joined.push(merge_rows(KEY, row, other));
        }
    }
    debug!(left = left.len(), right = right.len(), joined = joined.len(), "join on kepid");
    joined
}

fn merge_rows(key: &str, left: &Row, right: &Row) -> Row {
    let mut merged = Row::new();
    let mut put = |row: &Row, other: &Row, suffix: &str| {
        for (name, value) in row.iter() {
            let name = if name != key && other.contains(name) {
                format!("{name}{suffix}")
            } else {
                name.to_string()
            };
            merged.insert(name, value.clone());
        }
    };
    put(left, right, "_x");
    put(right, left, "_y");
    merged
}

fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), KplrError> {
    let parent = path
        .parent()
        .ok_or_else(|| KplrError::Filesystem(format!("invalid destination path {path}")))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KplrError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".kplr-catalog")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KplrError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| KplrError::Filesystem(err.to_string()))?;
    temp.flush()
        .map_err(|err| KplrError::Filesystem(err.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| KplrError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| KplrError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_existing() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let path = root.join("catalogs").join("planets.csv");
        write_atomic(&path, b"a\n1\n").unwrap();
        write_atomic(&path, b"a\n2\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n2\n");
        let leftovers = fs::read_dir(root.join("catalogs")).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
