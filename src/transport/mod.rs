use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::utils;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const HEALTH_PATH: &str = "/api/health";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Every variant is the single "unreachable / failed" outcome; none of them
/// means "no results".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("server returned {status}{}", format_detail(.detail))]
    Status { status: u16, detail: Option<String> },

    #[error("response from {url} is not valid JSON: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

impl TransportError {
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            TransportError::Network { .. } | TransportError::Timeout { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid base URL '{url}'")]
    InvalidBaseUrl { url: String },

    #[error("invalid header '{header}': {reason}")]
    InvalidHeader { header: String, reason: String },

    #[error("could not set up proxy '{proxy}': {source}")]
    Proxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build http client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

pub trait Transport {
    fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

#[derive(Clone, Debug, Default)]
pub struct HttpOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(options: &HttpOptions) -> Result<Self, ClientBuildError> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ClientBuildError::InvalidBaseUrl {
                url: options.base_url.clone(),
            });
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (key, value) = utils::parse_header(raw).map_err(|reason| {
                ClientBuildError::InvalidHeader {
                    header: raw.to_string(),
                    reason,
                }
            })?;
            let invalid = |reason: String| ClientBuildError::InvalidHeader {
                header: raw.to_string(),
                reason,
            };
            let key = reqwest::header::HeaderName::from_str(&key)
                .map_err(|e| invalid(e.to_string()))?;
            let value = reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| invalid(e.to_string()))?;
            headers.append(key, value);
        }
        if let Some(api_key) = options.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = reqwest::header::HeaderValue::from_str(api_key).map_err(|e| {
                ClientBuildError::InvalidHeader {
                    header: API_KEY_HEADER.to_string(),
                    reason: e.to_string(),
                }
            })?;
            headers.insert(API_KEY_HEADER, value);
        }

        let timeout = if options.timeout_seconds == 0 {
            DEFAULT_TIMEOUT_SECONDS
        } else {
            options.timeout_seconds
        };
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout));
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.is_empty()) {
            let proxy_cfg =
                reqwest::Proxy::all(proxy).map_err(|source| ClientBuildError::Proxy {
                    proxy: proxy.to_string(),
                    source,
                })?;
            builder = builder.proxy(proxy_cfg);
        }
        let client = builder
            .build()
            .map_err(|source| ClientBuildError::Client { source })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        utils::join_url(&self.base_url, path)
    }

    fn network_error(url: &str, source: reqwest::Error) -> TransportError {
        if source.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            TransportError::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    async fn read_json(url: &str, resp: reqwest::Response) -> Result<Value, TransportError> {
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|source| Self::network_error(url, source))?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        serde_json::from_slice(&body).map_err(|source| TransportError::Malformed {
            url: url.to_string(),
            source,
        })
    }

    pub async fn health(&self, path: &str) -> Result<HealthStatus, TransportError> {
        let url = self.url_for(path);
        debug!(url = %url, "probing backend health");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Self::network_error(&url, source))?;
        let value = Self::read_json(&url, resp).await?;
        serde_json::from_value(value).map_err(|source| TransportError::Malformed { url, source })
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.url_for(path);
        info!(url = %url, "posting recommendation request");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| Self::network_error(&url, source))?;
        debug!(status = resp.status().as_u16(), "backend answered");
        Self::read_json(&url, resp).await
    }
}

fn error_detail(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if let Some(Value::String(err)) = map.get("error") {
            return Some(err.clone());
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.chars().take(200).collect())
    }
}
