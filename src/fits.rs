use camino::Utf8Path;

use crate::cache::DataFile;
use crate::client::Kplr;
use crate::error::KplrError;
use crate::transport::Transport;

pub trait FitsReader {
    type Handle;

    fn open(&self, path: &Utf8Path) -> Result<Self::Handle, KplrError>;
}

impl<T: Transport> Kplr<T> {
    pub fn open<R: FitsReader>(
        &self,
        file: &DataFile,
        reader: Option<&R>,
        overwrite: bool,
    ) -> Result<R::Handle, KplrError> {
        let reader = reader.ok_or_else(|| {
            KplrError::MissingDependency("a FITS reader is required to read data files".to_string())
        })?;
        let path = self.fetch(file, overwrite)?;
        reader.open(&path)
    }
}
