use crate::client::Kplr;
use crate::error::KplrError;
use crate::records::{KeplerTarget, Koi, Planet, Star};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct Related<T> {
    value: Option<T>,
}

impl<T> Default for Related<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Related<T> {
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// Runs `fetch` only when the slot is empty. A failed fetch leaves the slot
    /// empty so the next call tries again.
    pub fn resolve_with<F>(&mut self, fetch: F) -> Result<&T, KplrError>
    where
        F: FnOnce() -> Result<T, KplrError>,
    {
        let value = match self.value.take() {
            Some(value) => value,
            None => fetch()?,
        };
        Ok(self.value.insert(value))
    }
}

impl Koi {
    pub fn star<T: Transport>(&mut self, api: &Kplr<T>) -> Result<&Star, KplrError> {
        let kepid = self.kepler_id()?;
        self.star.resolve_with(|| api.star(kepid))
    }

    pub fn resolved_star(&self) -> Option<&Star> {
        self.star.get()
    }
}

impl Planet {
    pub fn koi<T: Transport>(&mut self, api: &Kplr<T>) -> Result<&Koi, KplrError> {
        let number = self.koi_id()?;
        self.koi.resolve_with(|| api.koi(number))
    }

    pub fn star<T: Transport>(&mut self, api: &Kplr<T>) -> Result<&Star, KplrError> {
        let kepid = self.kepler_id()?;
        self.star.resolve_with(|| api.star(kepid))
    }

    pub fn resolved_koi(&self) -> Option<&Koi> {
        self.koi.get()
    }

    pub fn resolved_star(&self) -> Option<&Star> {
        self.star.get()
    }
}

impl Star {
    pub fn kois<T: Transport>(&mut self, api: &Kplr<T>) -> Result<&[Koi], KplrError> {
        let kepid = self.kepler_id()?;
        self.kois
            .resolve_with(|| api.kois_for_star(kepid))
            .map(Vec::as_slice)
    }

    pub fn resolved_kois(&self) -> Option<&[Koi]> {
        self.kois.get().map(Vec::as_slice)
    }
}
