use std::fmt;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::domain::{Cadence, KeplerId};
use crate::error::KplrError;
use crate::records::{Dataset, KeplerTarget, Record};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataProduct {
    LightCurve,
    TargetPixelFile,
}

impl DataProduct {
    pub fn directory(&self) -> &'static str {
        match self {
            DataProduct::LightCurve => "lightcurves",
            DataProduct::TargetPixelFile => "target_pixel_files",
        }
    }

    pub fn suffixes(&self) -> [&'static str; 2] {
        match self {
            DataProduct::LightCurve => ["llc", "slc"],
            DataProduct::TargetPixelFile => ["lpd-targ", "spd-targ"],
        }
    }

    pub fn suffix(&self, cadence: Cadence) -> &'static str {
        let [long, short] = self.suffixes();
        match cadence {
            Cadence::Long => long,
            Cadence::Short => short,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DataProduct::LightCurve => ".fits",
            DataProduct::TargetPixelFile => ".fits.gz",
        }
    }
}

impl fmt::Display for DataProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataProduct::LightCurve => write!(f, "LightCurve"),
            DataProduct::TargetPixelFile => write!(f, "TargetPixelFile"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub product: DataProduct,
    pub kepid: KeplerId,
    pub filename: String,
}

impl CacheEntry {
    pub fn new(product: DataProduct, kepid: KeplerId, dataset_name: &str, cadence: Cadence) -> Self {
        let filename = format!(
            "{dataset_name}_{}{}",
            product.suffix(cadence),
            product.extension()
        )
        .to_lowercase();
        Self {
            product,
            kepid,
            filename,
        }
    }

    pub fn from_dataset(product: DataProduct, dataset: &Dataset) -> Result<Self, KplrError> {
        Ok(Self::new(
            product,
            dataset.kepler_id()?,
            dataset.dataset_name()?,
            dataset.cadence()?,
        ))
    }

    pub fn local_dir(&self, data_root: &Utf8Path) -> Utf8PathBuf {
        data_root
            .join("data")
            .join(self.product.directory())
            .join(self.kepid.padded())
    }

    pub fn local_path(&self, data_root: &Utf8Path) -> Utf8PathBuf {
        self.local_dir(data_root).join(&self.filename)
    }

    pub fn remote_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.product.directory(),
            self.kepid.prefix(),
            self.kepid.padded(),
            self.filename
        )
    }
}

#[derive(Debug, Clone)]
pub struct DataFile {
    pub dataset: Dataset,
    pub entry: CacheEntry,
}

impl DataFile {
    pub fn new(product: DataProduct, dataset: Dataset) -> Result<Self, KplrError> {
        let entry = CacheEntry::from_dataset(product, &dataset)?;
        Ok(Self { dataset, entry })
    }

    pub fn product(&self) -> DataProduct {
        self.entry.product
    }
}

impl fmt::Display for DataFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}({})>", self.entry.product, self.dataset.natural_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataOptions {
    pub short_cadence: bool,
    pub fetch: bool,
    pub overwrite: bool,
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            short_cadence: true,
            fetch: false,
            overwrite: false,
        }
    }
}

/// Downloads data files into the local tree. Writes are not atomic; two
/// concurrent fetches of the same entry race and the last writer wins.
pub struct FileCache<T: Transport> {
    data_root: Utf8PathBuf,
    base_url: String,
    transport: T,
}

impl<T: Transport> FileCache<T> {
    pub fn new(data_root: impl Into<Utf8PathBuf>, base_url: impl Into<String>, transport: T) -> Self {
        Self {
            data_root: data_root.into(),
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn path(&self, entry: &CacheEntry) -> Utf8PathBuf {
        entry.local_path(&self.data_root)
    }

    pub fn url(&self, entry: &CacheEntry) -> String {
        entry.remote_url(&self.base_url)
    }

    pub fn is_cached(&self, entry: &CacheEntry) -> bool {
        self.path(entry).as_std_path().exists()
    }

    pub fn fetch(&self, entry: &CacheEntry, overwrite: bool) -> Result<Utf8PathBuf, KplrError> {
        let path = self.path(entry);
        if !overwrite && path.as_std_path().exists() {
            info!(%path, "found local file");
            return Ok(path);
        }

        let url = self.url(entry);
        info!(%url, "downloading file");
        let response = self.transport.get(&url)?;
        if !response.is_ok() {
            return Err(KplrError::Status {
                status: response.status,
                url,
                message: response.text(),
            });
        }

        let dir = entry.local_dir(&self.data_root);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| KplrError::Filesystem(format!("create {dir}: {err}")))?;

        info!(%path, bytes = response.body.len(), "saving file");
        let mut file = fs::File::create(path.as_std_path())
            .map_err(|err| KplrError::Filesystem(format!("create {path}: {err}")))?;
        file.write_all(&response.body)
            .map_err(|err| KplrError::Filesystem(format!("write {path}: {err}")))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_curve_layout() {
        let entry = CacheEntry::new(
            DataProduct::LightCurve,
            KeplerId::new(10593626),
            "KPLR010593626-2009166043257",
            Cadence::Long,
        );
        assert_eq!(entry.filename, "kplr010593626-2009166043257_llc.fits");
        assert_eq!(
            entry.local_path(Utf8Path::new("/root/.kplr")),
            Utf8PathBuf::from(
                "/root/.kplr/data/lightcurves/010593626/kplr010593626-2009166043257_llc.fits"
            )
        );
        assert_eq!(
            entry.remote_url("https://archive.stsci.edu/pub/kepler/"),
            "https://archive.stsci.edu/pub/kepler/lightcurves/0105/010593626/kplr010593626-2009166043257_llc.fits"
        );
    }

    #[test]
    fn short_cadence_target_pixel_file() {
        let entry = CacheEntry::new(
            DataProduct::TargetPixelFile,
            KeplerId::new(757450),
            "KPLR000757450-2010296114515",
            Cadence::Short,
        );
        assert_eq!(entry.filename, "kplr000757450-2010296114515_spd-targ.fits.gz");
        let url = entry.remote_url("https://archive.stsci.edu/pub/kepler");
        assert!(url.contains("/target_pixel_files/0007/000757450/"));
    }

    #[test]
    fn default_options_include_short_cadence() {
        let options = DataOptions::default();
        assert!(options.short_cadence);
        assert!(!options.fetch);
        assert!(!options.overwrite);
    }
}
