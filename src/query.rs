use std::fmt::{self, Write as _};

use reqwest::Url;
use serde_json::Value as Json;
use tracing::debug;

use crate::adapter::{Adapter, Row, munge, munge_json};
use crate::domain::{KeplerId, Sort, SortOrder};
use crate::error::KplrError;
use crate::transport::{HttpResponse, Transport};

/// The archive answers HTTP 200 even for failed queries; failures are only
/// visible as this marker in the body. A legitimate value containing it is
/// misreported as a failure.
pub const ARCHIVE_ERROR_MARKER: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Text(value) => write!(f, "{value}"),
            Param::Int(value) => write!(f, "{value}"),
            Param::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<KeplerId> for Param {
    fn from(value: KeplerId) -> Self {
        Param::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, Param)>,
    sort: Option<Sort>,
    max_records: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Param>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn where_clause(self, expression: impl Into<String>) -> Self {
        self.param("where", expression.into())
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn max_records(mut self, limit: u64) -> Self {
        self.max_records = Some(limit);
        self
    }

    pub fn limit(&self) -> Option<u64> {
        self.max_records
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.params
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn sort_order(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }
}

/// `quote_plus` with `"`, `'` and `+` left alone. The archive never
/// percent-decodes parameters, so anything else must be escaped exactly once.
pub fn quote_archive(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b' ' => out.push('+'),
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'_'
            | b'.'
            | b'-'
            | b'"'
            | b'\''
            | b'+' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

pub fn archive_params(table: &str, query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("table".to_string(), table.to_string())];
    for (key, value) in query.params() {
        if key != "table" {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    if let Some(sort) = query.sort_order() {
        let order = match sort.order {
            SortOrder::Ascending => sort.column.clone(),
            SortOrder::Descending => format!("{} desc", sort.column),
        };
        pairs.push(("order".to_string(), order));
    }
    if let Some(limit) = query.limit() {
        pairs.push(("max_records".to_string(), limit.to_string()));
    }
    pairs
}

pub fn archive_body(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", quote_archive(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn parse_archive_csv(text: &str) -> Result<Vec<Row>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(munge(headers.iter().zip(record.iter())));
    }
    Ok(rows)
}

pub struct ArchiveClient<T: Transport> {
    url: String,
    transport: T,
}

impl<T: Transport> ArchiveClient<T> {
    pub fn new(url: impl Into<String>, transport: T) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    pub fn search(&self, table: &str, query: &Query) -> Result<Vec<Row>, KplrError> {
        let body = archive_body(&archive_params(table, query));
        let response = self.transport.post(&self.url, body.clone())?;
        let full_url = format!("{}?{}", response.url, body);
        let text = response.text();

        if !response.is_ok() {
            return Err(KplrError::Status {
                status: response.status,
                url: full_url,
                message: text,
            });
        }
        if text.contains(ARCHIVE_ERROR_MARKER) {
            return Err(KplrError::Api {
                status: response.status,
                url: full_url,
                message: text,
            });
        }

        let rows = parse_archive_csv(&text).map_err(|err| KplrError::Api {
            status: response.status,
            url: full_url.clone(),
            message: format!("malformed CSV ({err}).\n{text}"),
        })?;
        debug!(table, rows = rows.len(), "archive search");
        Ok(rows)
    }
}

pub fn mast_params(query: &Query) -> Vec<(String, String)> {
    const FIXED: [(&str, &str); 3] = [("outputformat", "JSON"), ("coordformat", "dec"), ("verb", "3")];

    let action = query
        .get("action")
        .map(ToString::to_string)
        .unwrap_or_else(|| "Search".to_string());
    let mut pairs = vec![("action".to_string(), action)];
    for (key, value) in query.params() {
        if key == "action" || FIXED.iter().any(|(fixed, _)| *fixed == key) {
            continue;
        }
        pairs.push((key.to_string(), value.to_string()));
    }
    pairs.extend(
        FIXED
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    );
    if let Some(sort) = query.sort_order() {
        pairs.push(("ordercolumn1".to_string(), sort.column.clone()));
        if sort.order == SortOrder::Descending {
            pairs.push(("descending1".to_string(), "on".to_string()));
        }
    }
    if let Some(limit) = query.limit() {
        pairs.push(("max_records".to_string(), limit.to_string()));
    }
    pairs
}

pub struct MastClient<T: Transport> {
    base_url: String,
    transport: T,
}

impl<T: Transport> MastClient<T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn endpoint(&self, category: &str) -> String {
        format!(
            "{}/{}/search.php",
            self.base_url.trim_end_matches('/'),
            category
        )
    }

    pub fn search(
        &self,
        category: &str,
        query: &Query,
        adapter: Option<&Adapter>,
    ) -> Result<Vec<Row>, KplrError> {
        let endpoint = self.endpoint(category);
        let encoded = Url::parse_with_params(&endpoint, mast_params(query))
            .map_err(|err| KplrError::Http(format!("invalid URL {endpoint}: {err}")))?;
        let body = encoded.query().unwrap_or_default().to_string();

        let response = self.transport.post(&endpoint, body.clone())?;
        let full_url = format!("{}?{}", response.url, body);
        if !response.is_ok() {
            return Err(KplrError::Status {
                status: response.status,
                url: full_url,
                message: response.text(),
            });
        }

        let objects = decode_mast_json(&response).map_err(|message| KplrError::Api {
            status: response.status,
            url: full_url,
            message,
        })?;
        let rows = objects
            .iter()
            .map(|object| match adapter {
                Some(adapter) => adapter.adapt(object),
                None => munge_json(object),
            })
            .collect::<Vec<_>>();
        debug!(category, rows = rows.len(), "mast search");
        Ok(rows)
    }
}

fn decode_mast_json(
    response: &HttpResponse,
) -> Result<Vec<serde_json::Map<String, Json>>, String> {
    let undecodable = || format!("No JSON object could be decoded.\n{}", response.text());
    let value: Json = serde_json::from_slice(&response.body).map_err(|_| undecodable())?;
    let Json::Array(items) = value else {
        return Err(undecodable());
    };
    items
        .into_iter()
        .map(|item| match item {
            Json::Object(object) => Ok(object),
            _ => Err(undecodable()),
        })
        .collect()
}
