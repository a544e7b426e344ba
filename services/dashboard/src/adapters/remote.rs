//! services/dashboard/src/adapters/remote.rs
//!
//! The shared HTTP client for the remote dairyTrack API, plus the small
//! helpers every adapter needs to read its loosely typed JSON: numbers that
//! arrive as strings, several timestamp spellings, and `{success, message}`
//! envelopes.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use dairy_track_core::ports::{PortError, PortResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

//=========================================================================================
// The Client
//=========================================================================================

/// A thin wrapper over `reqwest::Client` bound to the remote base URL.
///
/// `local_offset` is the zone the remote writes its offset-less timestamps in.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    local_offset: FixedOffset,
}

impl RemoteClient {
    pub fn new(base_url: &str, timeout: Duration, local_offset: FixedOffset) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            local_offset,
        })
    }

    pub fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends the request and decodes a JSON body.
    ///
    /// Transport and decoding failures become `Network`. A 404 becomes `NotFound`
    /// and any other non-2xx status becomes `Remote`, both carrying the server's
    /// message, or `fallback` when it sent none.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> PortResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(%url, %status, "remote call returned non-2xx status");
            return Err(status_error(status, &body, fallback));
        }

        debug!(%url, %status, "remote call succeeded");
        serde_json::from_str(&body)
            .map_err(|e| PortError::Network(format!("invalid response from {}: {}", url, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> PortResult<T> {
        self.send(self.request(Method::GET, path), fallback).await
    }

    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> PortResult<()> {
        let envelope: Envelope = self.send(self.request(method, path).json(body), fallback).await?;
        envelope.into_result(fallback)
    }

    /// A request whose only interesting part is the `{success, message}` envelope.
    pub async fn command(&self, method: Method, path: &str, fallback: &str) -> PortResult<()> {
        let envelope: Envelope = self.send(self.request(method, path), fallback).await?;
        envelope.into_result(fallback)
    }
}

fn status_error(status: StatusCode, body: &str, fallback: &str) -> PortError {
    let message = remote_message(body).unwrap_or_else(|| fallback.to_string());
    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        _ => PortError::Remote(message),
    }
}

fn remote_message(body: &str) -> Option<String> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    envelope.message.or(envelope.error).filter(|m| !m.is_empty())
}

//=========================================================================================
// Wire Helpers
//=========================================================================================

fn default_true() -> bool {
    true
}

/// The status part every remote response carries.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// `success: false` is a `Remote` error with the server's message passed through.
    pub fn into_result(self, fallback: &str) -> PortResult<()> {
        if self.success {
            return Ok(());
        }
        let message = self
            .message
            .or(self.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Err(PortError::Remote(message))
    }
}

/// A number the remote may send either as JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Int(v) => Some(*v as f64),
            Numeric::Float(v) => Some(*v),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(v) => Some(*v),
            Numeric::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Numeric::Float(_) => None,
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Parses RFC 3339, RFC 2822 or a naive `YYYY-MM-DD[T ]HH:MM[:SS[.f]]`.
///
/// Naive values are wall-clock time in `local`.
pub fn parse_timestamp(raw: &str, local: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| local.from_local_datetime(&naive).single())
        .map(|local_time| local_time.with_timezone(&Utc))
}

pub fn parse_optional_timestamp(raw: Option<&str>, local: FixedOffset) -> Option<DateTime<Utc>> {
    raw.and_then(|raw| parse_timestamp(raw, local))
}
