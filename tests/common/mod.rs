#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use kplr::client::Kplr;
use kplr::config::Settings;
use kplr::error::KplrError;
use kplr::transport::{HttpResponse, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

/// Answers requests from a queue and records every call.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<(u16, Vec<u8>)>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn respond(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .push_back((status, body.into()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer(&self, call: Call) -> Result<HttpResponse, KplrError> {
        let url = call.url.clone();
        self.calls.lock().unwrap().push(call);
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KplrError::Http(format!("no response queued for {url}")))?;
        Ok(HttpResponse { status, url, body })
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, KplrError> {
        self.answer(Call {
            method: "GET",
            url: url.to_string(),
            body: None,
        })
    }

    fn post(&self, url: &str, body: String) -> Result<HttpResponse, KplrError> {
        self.answer(Call {
            method: "POST",
            url: url.to_string(),
            body: Some(body),
        })
    }
}

pub fn data_root(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("kplr")).unwrap()
}

pub fn client(temp: &TempDir) -> Kplr<MockTransport> {
    Kplr::new(Settings::with_data_root(data_root(temp)), MockTransport::default())
}

pub const STAR_JSON: &str = r#"[{"Kepler ID": "9787239", "Kepler Mag": "15.2", "Teff (deg K)": "5780", "2MASS ID": "J19344300+4638297"}]"#;

pub const KOI_CSV: &str = "kepid,kepoi_name,kepler_name,koi_period,koi_disposition\n\
9787239,K00145.01,,29.72,CANDIDATE\n";

pub const DATASETS_JSON: &str = r#"[
    {"Kepler ID": "9787239", "Dataset Name": "KPLR009787239-2009166043257", "Target Type": "LC", "Quarter": "1"},
    {"Kepler ID": "9787239", "Dataset Name": "KPLR009787239-2009231120729", "Target Type": "SC", "Quarter": "2"}
]"#;
