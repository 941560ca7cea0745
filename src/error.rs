use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KplrError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("the API returned code {status} for URL: '{url}' with message:\n{message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("the API reported an error (code {status}) for URL: '{url}' with message:\n{message}")]
    #[diagnostic(help("the service answered with HTTP 200 but flagged the request as failed"))]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("no {kind} found with id: '{id}'")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid planet name '{0}'")]
    #[diagnostic(help("expected a name like \"6b\" or \"Kepler-62 f\""))]
    InvalidPlanetName(String),

    #[error("invalid KOI number: {0}")]
    InvalidKoiNumber(String),

    #[error("invalid Kepler id: {0}")]
    InvalidKeplerId(String),

    #[error("{record} record has no value for '{field}'")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("missing optional dependency: {0}")]
    MissingDependency(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("cached catalog {path} is unreadable: {message}")]
    #[diagnostic(help("download it again with overwrite"))]
    CorruptCatalog { path: String, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl KplrError {
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            KplrError::NotFound { .. }
                | KplrError::InvalidPlanetName(_)
                | KplrError::InvalidKoiNumber(_)
                | KplrError::InvalidKeplerId(_)
        )
    }
}
