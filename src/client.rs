use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::adapter::{DATASET_ADAPTER, PLANET_ADAPTER, STAR_ADAPTER};
use crate::cache::{DataFile, DataOptions, DataProduct, FileCache};
use crate::catalog::CatalogStore;
use crate::config::{ConfigLoader, Settings};
use crate::domain::{KeplerId, KoiNumber, PlanetName};
use crate::error::KplrError;
use crate::query::{ArchiveClient, MastClient, Query};
use crate::records::{Dataset, KeplerTarget, Koi, Planet, Record, Star};
use crate::transport::{HttpTransport, Transport};

pub const DEFAULT_STAR_LIMIT: u64 = 100;

pub struct Kplr<T: Transport> {
    settings: Settings,
    transport: T,
}

impl Kplr<HttpTransport> {
    pub fn from_env(
        data_root: Option<&str>,
        config_path: Option<&str>,
    ) -> Result<Self, KplrError> {
        let settings = ConfigLoader::resolve(data_root, config_path)?;
        Ok(Self::new(settings, HttpTransport::new()?))
    }
}

impl<T: Transport> Kplr<T> {
    pub fn new(settings: Settings, transport: T) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn data_root(&self) -> &Utf8Path {
        &self.settings.data_root
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn archive(&self) -> ArchiveClient<&T> {
        ArchiveClient::new(self.settings.archive_url.as_str(), &self.transport)
    }

    pub fn mast(&self) -> MastClient<&T> {
        MastClient::new(self.settings.mast_url.as_str(), &self.transport)
    }

    pub fn file_cache(&self) -> FileCache<&T> {
        FileCache::new(
            self.settings.data_root.clone(),
            self.settings.data_url.as_str(),
            &self.transport,
        )
    }

    pub fn catalogs(&self) -> CatalogStore<&T> {
        CatalogStore::new(
            self.settings.data_root.clone(),
            self.settings.archive_url.as_str(),
            &self.transport,
        )
    }

    pub fn kois(&self, query: &Query) -> Result<Vec<Koi>, KplrError> {
        let rows = self.archive().search("cumulative", query)?;
        Ok(rows.into_iter().map(Koi::from_row).collect())
    }

    pub fn koi(&self, number: KoiNumber) -> Result<Koi, KplrError> {
        let query = Query::new()
            .where_clause(format!("kepoi_name like '{}'", number.kepoi_name()))
            .max_records(1);
        first_or_not_found(self.kois(&query)?, "KOI", number.to_string())
    }

    pub fn kois_for_star(&self, kepid: KeplerId) -> Result<Vec<Koi>, KplrError> {
        self.kois(&Query::new().where_clause(format!("kepid like '{kepid}'")))
    }

    pub fn planets(&self, query: &Query) -> Result<Vec<Planet>, KplrError> {
        let rows = self
            .mast()
            .search("confirmed_planets", query, Some(&PLANET_ADAPTER))?;
        Ok(rows.into_iter().map(Planet::from_row).collect())
    }

    pub fn planet(&self, name: &str) -> Result<Planet, KplrError> {
        let name: PlanetName = name.parse()?;
        let kepler_name = name.kepler_name();
        let query = Query::new()
            .param("kepler_name", kepler_name.as_str())
            .max_records(1);
        first_or_not_found(self.planets(&query)?, "planet", kepler_name)
    }

    pub fn stars(&self, query: &Query) -> Result<Vec<Star>, KplrError> {
        let query = match query.limit() {
            Some(_) => query.clone(),
            None => query.clone().max_records(DEFAULT_STAR_LIMIT),
        };
        let rows = self.mast().search("kic10", &query, Some(&STAR_ADAPTER))?;
        Ok(rows.into_iter().map(Star::from_row).collect())
    }

    pub fn star(&self, kepid: KeplerId) -> Result<Star, KplrError> {
        let query = Query::new().param("kic_kepler_id", kepid).max_records(1);
        first_or_not_found(self.stars(&query)?, "KIC target", kepid.to_string())
    }

    pub fn datasets(&self, kepid: KeplerId, short_cadence: bool) -> Result<Vec<Dataset>, KplrError> {
        let mut query = Query::new().param("ktc_kepler_id", kepid);
        if !short_cadence {
            query.set("ktc_target_type", "LC");
        }
        let rows = self
            .mast()
            .search("data_search", &query, Some(&DATASET_ADAPTER))?;
        if rows.is_empty() {
            return Err(KplrError::NotFound {
                kind: "data files",
                id: kepid.to_string(),
            });
        }
        Ok(rows.into_iter().map(Dataset::from_row).collect())
    }

    pub fn light_curves(
        &self,
        kepid: KeplerId,
        options: DataOptions,
    ) -> Result<Vec<DataFile>, KplrError> {
        self.data_files(DataProduct::LightCurve, kepid, options)
    }

    pub fn target_pixel_files(
        &self,
        kepid: KeplerId,
        options: DataOptions,
    ) -> Result<Vec<DataFile>, KplrError> {
        self.data_files(DataProduct::TargetPixelFile, kepid, options)
    }

    pub fn data_files(
        &self,
        product: DataProduct,
        kepid: KeplerId,
        options: DataOptions,
    ) -> Result<Vec<DataFile>, KplrError> {
        let files = self
            .datasets(kepid, options.short_cadence)?
            .into_iter()
            .map(|dataset| DataFile::new(product, dataset))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(%kepid, %product, count = files.len(), "data files");
        if options.fetch {
            for file in &files {
                self.fetch(file, options.overwrite)?;
            }
        }
        Ok(files)
    }

    pub fn light_curves_for(
        &self,
        record: &impl KeplerTarget,
        options: DataOptions,
    ) -> Result<Vec<DataFile>, KplrError> {
        self.light_curves(record.kepler_id()?, options)
    }

    pub fn target_pixel_files_for(
        &self,
        record: &impl KeplerTarget,
        options: DataOptions,
    ) -> Result<Vec<DataFile>, KplrError> {
        self.target_pixel_files(record.kepler_id()?, options)
    }

    pub fn fetch(&self, file: &DataFile, overwrite: bool) -> Result<Utf8PathBuf, KplrError> {
        self.file_cache().fetch(&file.entry, overwrite)
    }
}

fn first_or_not_found<R>(
    records: Vec<R>,
    kind: &'static str,
    id: String,
) -> Result<R, KplrError> {
    records
        .into_iter()
        .next()
        .ok_or(KplrError::NotFound { kind, id })
}
