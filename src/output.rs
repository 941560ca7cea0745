use std::io::{self, Write};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::adapter::Row;
use crate::cache::{DataFile, DataProduct};
use crate::catalog::Catalog;
use crate::domain::KeplerId;
use crate::records::Record;

#[derive(Debug, Serialize)]
pub struct FileListing {
    pub product: DataProduct,
    pub kepid: KeplerId,
    pub filename: String,
    pub url: String,
    pub path: Utf8PathBuf,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct CatalogListing {
    pub catalog: Catalog,
    pub table: &'static str,
    pub path: Utf8PathBuf,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_record<R: Record>(record: &R) -> io::Result<()> {
        Self::print_json(record.row())
    }

    pub fn print_records<R: Record>(records: &[R]) -> io::Result<()> {
        let rows: Vec<&Row> = records.iter().map(Record::row).collect();
        Self::print_json(&rows)
    }

    pub fn print_files(files: &[FileListing]) -> io::Result<()> {
        Self::print_json(&files)
    }

    pub fn print_catalogs(catalogs: &[CatalogListing]) -> io::Result<()> {
        Self::print_json(&catalogs)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl FileListing {
    pub fn new(file: &DataFile, url: String, path: Utf8PathBuf) -> Self {
        let cached = path.as_std_path().exists();
        Self {
            product: file.product(),
            kepid: file.entry.kepid,
            filename: file.entry.filename.clone(),
            url,
            path,
            cached,
        }
    }
}
