//! Blocking client for the task-tracking REST API.
//!
//! Every endpoint the exporter uses answers with a JSON object whose payload
//! sits under a top-level `data` key. The [`Fetch`] trait is the seam the rest
//! of the pipeline depends on, so tests can substitute canned documents for
//! the network.

use std::time::Duration;

use chrono::NaiveDate;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Connection settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Extra attempts after a retryable failure.
    pub max_retries: u32,
    /// Pause before the first retry; the n-th retry waits n times as long.
    pub retry_delay: Duration,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }

    /// Join the base URL and an endpoint path without doubling the slash.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Fetch a JSON document by endpoint path.
pub trait Fetch {
    fn fetch(&self, path: &str) -> ApiResult<Value>;
}

/// HTTP implementation of [`Fetch`] using basic auth with the API key as the
/// username and an empty password.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(ApiClient { config, http })
    }

    fn get_once(&self, url: &str) -> ApiResult<Value> {
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.config.api_key, Some(""))
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Fetch for ApiClient {
    fn fetch(&self, path: &str) -> ApiResult<Value> {
        let url = self.config.url_for(path);
        let mut attempt = 0;
        loop {
            tracing::debug!(url = %url, attempt, "GET");
            match self.get_once(&url) {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_delay * attempt;
                    tracing::warn!(url = %url, error = %e, delay_ms = delay.as_millis() as u64, "Request failed, retrying");
                    std::thread::sleep(delay);
                }
                other => return other,
            }
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Fetch `path` and decode the `data` member of the response.
///
/// A `null` or missing `data` member yields `Ok(None)`.
pub fn fetch_data<T: DeserializeOwned>(fetch: &dyn Fetch, path: &str) -> ApiResult<Option<T>> {
    let doc = fetch.fetch(path)?;
    let envelope: Envelope<T> =
        serde_json::from_value(doc).map_err(|source| ApiError::DataShape {
            path: path.to_string(),
            source,
        })?;
    Ok(envelope.data)
}

/// Opaque identifier of an API resource.
///
/// Older API versions send a numeric `id`, newer ones a string `gid`; both are
/// kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct ResourceId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Str(String),
}

impl From<RawId> for ResourceId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Num(n) => ResourceId(n.to_string()),
            RawId::Str(s) => ResourceId(s),
        }
    }
}

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        ResourceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `id`/`gid` pair carried by every resource payload. Flatten into a
/// payload struct and call [`IdFields::resolve`].
#[derive(Debug, Default, Deserialize)]
pub struct IdFields {
    #[serde(default)]
    id: Option<ResourceId>,
    #[serde(default)]
    gid: Option<ResourceId>,
}

impl IdFields {
    pub fn resolve(self) -> Option<ResourceId> {
        self.gid.or(self.id)
    }
}

/// Compact reference to a user, as embedded in `assignee` and `created_by`.
#[derive(Debug, Default, Deserialize)]
pub struct PersonRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Name of an optional person reference, empty when absent.
pub fn person_name(person: Option<PersonRef>) -> String {
    person.and_then(|p| p.name).unwrap_or_default()
}

/// Parse an ISO-8601 date or date-time, keeping only the calendar date.
pub fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let date = s.split_once('T').map_or(s, |(d, _)| d);
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Serde adapter for optional API date fields. `null` and `""` map to `None`.
pub fn deserialize_api_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_api_date(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{s}'"))),
    }
}
