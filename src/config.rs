use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::KplrError;

pub const DATA_DIR_ENV: &str = "KPLR_DATA_DIR";

pub const DEFAULT_ARCHIVE_URL: &str =
    "https://exoplanetarchive.ipac.caltech.edu/cgi-bin/nstedAPI/nph-nstedAPI";
pub const DEFAULT_MAST_URL: &str = "https://archive.stsci.edu/kepler";
pub const DEFAULT_DATA_URL: &str = "https://archive.stsci.edu/pub/kepler";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub data_root: Option<String>,
    #[serde(default)]
    pub archive_url: Option<String>,
    #[serde(default)]
    pub mast_url: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_root: Utf8PathBuf,
    pub archive_url: String,
    pub mast_url: String,
    pub data_url: String,
}

impl Settings {
    pub fn with_data_root(data_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            mast_url: DEFAULT_MAST_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Data root precedence: `data_root` argument, config file, `KPLR_DATA_DIR`,
    /// then `~/.kplr`.
    pub fn resolve(
        data_root: Option<&str>,
        config_path: Option<&str>,
    ) -> Result<Settings, KplrError> {
        let file = match config_path {
            Some(path) => Self::read_file(PathBuf::from(path))?,
            None => ConfigFile::default(),
        };
        let env = std::env::var(DATA_DIR_ENV).ok();
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self::resolve_with(data_root, file, env, home)
    }

    pub fn read_file(path: PathBuf) -> Result<ConfigFile, KplrError> {
        let content = fs::read_to_string(&path).map_err(|_| KplrError::ConfigRead(path.clone()))?;
        serde_json::from_str(&content).map_err(|err| KplrError::ConfigParse(err.to_string()))
    }

    pub fn resolve_with(
        data_root: Option<&str>,
        file: ConfigFile,
        env: Option<String>,
        home: Option<PathBuf>,
    ) -> Result<Settings, KplrError> {
        let home = home
            .map(|path| {
                Utf8PathBuf::from_path_buf(path)
                    .map_err(|_| KplrError::Filesystem("non-utf8 home directory".to_string()))
            })
            .transpose()?;

        let chosen = data_root
            .map(str::to_string)
            .or(file.data_root)
            .or_else(|| env.filter(|value| !value.trim().is_empty()));

        let data_root = match chosen {
            Some(value) => expand_home(value.trim(), home.as_ref())?,
            None => home
                .map(|home| home.join(".kplr"))
                .ok_or_else(|| {
                    KplrError::Filesystem("unable to resolve home directory".to_string())
                })?,
        };

        Ok(Settings {
            data_root,
            archive_url: file
                .archive_url
                .unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string()),
            mast_url: file
                .mast_url
                .unwrap_or_else(|| DEFAULT_MAST_URL.to_string()),
            data_url: file
                .data_url
                .unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
        })
    }
}

fn expand_home(value: &str, home: Option<&Utf8PathBuf>) -> Result<Utf8PathBuf, KplrError> {
    let rest = match value.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(Utf8PathBuf::from(value)),
    };
    let home = home.ok_or_else(|| {
        KplrError::Filesystem("unable to resolve home directory".to_string())
    })?;
    if rest.is_empty() {
        Ok(home.clone())
    } else {
        Ok(home.join(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Option<PathBuf> {
        Some(PathBuf::from("/home/astro"))
    }

    #[test]
    fn explicit_root_wins() {
        let settings = ConfigLoader::resolve_with(
            Some("/data/kepler"),
            ConfigFile::default(),
            Some("/env/root".to_string()),
            home(),
        )
        .unwrap();
        assert_eq!(settings.data_root, Utf8PathBuf::from("/data/kepler"));
    }

    #[test]
    fn env_root_used_when_no_argument() {
        let settings = ConfigLoader::resolve_with(
            None,
            ConfigFile::default(),
            Some("~/kepler".to_string()),
            home(),
        )
        .unwrap();
        assert_eq!(settings.data_root, Utf8PathBuf::from("/home/astro/kepler"));
    }

    #[test]
    fn default_root_under_home() {
        let settings = ConfigLoader::resolve_with(
            None,
            ConfigFile::default(),
            Some("  ".to_string()),
            home(),
        )
        .unwrap();
        assert_eq!(settings.data_root, Utf8PathBuf::from("/home/astro/.kplr"));
        assert_eq!(settings.archive_url, DEFAULT_ARCHIVE_URL);
    }

    #[test]
    fn file_overrides_endpoints_and_env() {
        let file = ConfigFile {
            data_root: Some("/file/root".to_string()),
            archive_url: None,
            mast_url: Some("http://localhost:8080/kepler".to_string()),
            data_url: None,
        };
        let settings =
            ConfigLoader::resolve_with(None, file, Some("/env/root".to_string()), home()).unwrap();
        assert_eq!(settings.data_root, Utf8PathBuf::from("/file/root"));
        assert_eq!(settings.mast_url, "http://localhost:8080/kepler");
        assert_eq!(settings.data_url, DEFAULT_DATA_URL);
    }
}
