//! HTTP client for the Google Sheets `values` REST API.
//!
//! Only the three calls the pipeline needs are wrapped: `values.clear`,
//! `values.update` and `values.get`. Authentication is a caller-supplied
//! OAuth bearer token; obtaining one is left to the deployment.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Method, Url};
use serde_json::{json, Value};

use crate::error::SheetsError;
use crate::retry::retry_with_backoff;
use crate::store::RowStore;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Client bound to a single spreadsheet.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SheetsClient {
    /// Creates a client for `spreadsheet_id` against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`SheetsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        spreadsheet_id: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SheetsError> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| SheetsError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: trimmed.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables retries on quota and server errors.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}` with the id and
    /// range percent-encoded.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let raw = format!(
            "{}/v4/spreadsheets/{}/values/{}{suffix}",
            self.base_url,
            utf8_percent_encode(&self.spreadsheet_id, NON_ALPHANUMERIC),
            utf8_percent_encode(range, NON_ALPHANUMERIC),
        );
        Url::parse(&raw).map_err(|e| SheetsError::InvalidBaseUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// Sends one authenticated request and parses the JSON body.
    ///
    /// # Errors
    ///
    /// - [`SheetsError::Api`] for a non-2xx status, carrying Google's error message.
    /// - [`SheetsError::Http`] on network failure.
    /// - [`SheetsError::Deserialize`] if a 2xx body is not JSON.
    async fn execute(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Value, SheetsError> {
        let mut request = self
            .client
            .request(method, url.clone())
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SheetsError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }

    async fn execute_with_retry(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<Value, SheetsError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.execute(method.clone(), url, body)
        })
        .await
    }
}

/// Extracts `error.message` from a Google API error body, falling back to
/// the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Renders a cell value as the string a spreadsheet user would see.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl RowStore for SheetsClient {
    async fn clear(&self, range: &str) -> Result<(), SheetsError> {
        let url = self.values_url(range, ":clear")?;
        self.execute_with_retry(&Method::POST, &url, Some(&json!({})))
            .await?;
        tracing::debug!(range, "sheet range cleared");
        Ok(())
    }

    async fn write_rows(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.execute_with_retry(&Method::PUT, &url, Some(&body)).await?;
        tracing::debug!(range, rows = rows.len(), "sheet rows written");
        Ok(())
    }

    async fn read_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(range, "")?;
        let body = self.execute_with_retry(&Method::GET, &url, None).await?;
        let rows = body
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(cell_text).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }
}
