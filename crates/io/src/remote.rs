//! HTTP-backed reference source.
//!
//! Blocking reqwest client (no Tokio runtime required). The endpoint serves
//! one sheet as CSV; the sheet name travels as the `sheet` query parameter
//! and the token, when present, as a bearer credential.

use std::time::Duration;

use stuffcheck_recon::model::ReferenceRow;
use stuffcheck_recon::{ReferenceSource, SourceError};

use crate::csv;

pub struct HttpSource {
    http: reqwest::blocking::Client,
    url: reqwest::Url,
    sheet: String,
    token: Option<String>,
    table: Option<Vec<Vec<String>>>,
}

impl HttpSource {
    pub fn new(url: &str, sheet: &str, token: Option<String>) -> Result<Self, SourceError> {
        let mut url = reqwest::Url::parse(url)
            .map_err(|e| SourceError::Read(format!("invalid source url '{}': {}", url, e)))?;
        url.query_pairs_mut().append_pair("sheet", sheet);

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("stuffcheck/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SourceError::Remote { status: None, message: e.to_string() })?;

        Ok(Self { http, url, sheet: sheet.to_string(), token, table: None })
    }

    fn fetch(&self) -> Result<String, SourceError> {
        let mut request = self.http.get(self.url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .map_err(|e| SourceError::Remote { status: None, message: e.to_string() })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(SourceError::SheetNotFound(self.sheet.clone()));
        }
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SourceError::Remote {
                status: Some(status),
                message: body.trim().to_string(),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| SourceError::Remote { status: Some(status), message: e.to_string() })?;
        Ok(csv::decode_text(bytes.to_vec()))
    }

    fn load(&mut self) -> Result<&[Vec<String>], SourceError> {
        if self.table.is_none() {
            let body = self.fetch()?;
            let delimiter = csv::sniff_delimiter(&body);
            let rows = csv::records_from_str(&body, delimiter).map_err(SourceError::Read)?;
            log::debug!("{}: fetched {} row(s) including header", self.describe(), rows.len());
            self.table = Some(rows);
        }
        Ok(self.table.as_deref().unwrap_or_default())
    }
}

impl ReferenceSource for HttpSource {
    fn describe(&self) -> String {
        format!("http:{}{}#{}", self.url.host_str().unwrap_or(""), self.url.path(), self.sheet)
    }

    fn header_row(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(self.load()?.first().cloned().unwrap_or_default())
    }

    fn rows(&mut self, limit: usize) -> Result<Vec<ReferenceRow>, SourceError> {
        Ok(self
            .load()?
            .iter()
            .skip(1)
            .take(limit)
            .map(|values| values.iter().map(|v| v.trim()).collect())
            .collect())
    }
}
