use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::KplrError;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, KplrError>;
    fn post(&self, url: &str, body: String) -> Result<HttpResponse, KplrError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<HttpResponse, KplrError> {
        (**self).get(url)
    }

    fn post(&self, url: &str, body: String) -> Result<HttpResponse, KplrError> {
        (**self).post(url, body)
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, KplrError> {
        Self::build(None)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, KplrError> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self, KplrError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kplr/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KplrError::Http(err.to_string()))?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| KplrError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn read(response: reqwest::blocking::Response) -> Result<HttpResponse, KplrError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response
            .bytes()
            .map_err(|err| KplrError::Http(err.to_string()))?
            .to_vec();
        debug!(%url, status, bytes = body.len(), "response");
        Ok(HttpResponse { status, url, body })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, KplrError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| KplrError::Http(err.to_string()))?;
        Self::read(response)
    }

    fn post(&self, url: &str, body: String) -> Result<HttpResponse, KplrError> {
        debug!(%url, %body, "POST");
        let response = self
            .client
            .post(url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .map_err(|err| KplrError::Http(err.to_string()))?;
        Self::read(response)
    }
}
