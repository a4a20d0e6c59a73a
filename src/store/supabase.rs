//! Supabase (PostgREST) backend.
//!
//! The HTTP client is created on first use from the environment and then
//! shared for the lifetime of the process.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;

use super::{Filter, PremiumStore, Query, Table};
use crate::error::{McpError, Result};

/// Environment variable holding the project URL.
pub const URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the API key.
pub const KEY_VAR: &str = "SUPABASE_KEY";
/// Accepted fallback name for the API key.
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Connection settings for the remote store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// API key sent as `apikey` and bearer token
    pub key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Read the configuration from the process environment.
    pub fn from_env(timeout: Duration) -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), timeout)
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, timeout: Duration) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let url = non_empty(URL_VAR)
            .ok_or_else(|| McpError::Config(format!("{} is not set", URL_VAR)))?;
        let key = non_empty(KEY_VAR)
            .or_else(|| non_empty(ANON_KEY_VAR))
            .ok_or_else(|| McpError::Config(format!("{} is not set", KEY_VAR)))?;

        Ok(Self {
            url: url.trim().trim_end_matches('/').to_string(),
            key: key.trim().to_string(),
            timeout,
        })
    }
}

struct Connection {
    client: Client,
    base_url: String,
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct RestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Remote premium store reached through the Supabase REST API.
pub struct SupabaseStore {
    timeout: Duration,
    preset: Option<Result<StoreConfig>>,
    connection: OnceCell<Connection>,
}

impl SupabaseStore {
    /// Store whose credentials are read from the environment on first access.
    pub fn from_env(timeout: Duration) -> Self {
        Self {
            timeout,
            preset: None,
            connection: OnceCell::new(),
        }
    }

    /// Store with explicit credentials.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            timeout: config.timeout,
            preset: Some(Ok(config)),
            connection: OnceCell::new(),
        }
    }

    /// Store whose credentials are resolved through `lookup` now. A missing
    /// value is still only reported on first access.
    pub fn from_lookup<F>(lookup: F, timeout: Duration) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            timeout,
            preset: Some(StoreConfig::from_lookup(lookup, timeout)),
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection> {
        self.connection
            .get_or_try_init(|| async {
                let config = match &self.preset {
                    Some(preset) => preset.clone()?,
                    None => StoreConfig::from_env(self.timeout)?,
                };
                connect(config)
            })
            .await
    }
}

fn connect(config: StoreConfig) -> Result<Connection> {
    let mut headers = HeaderMap::new();
    let key = HeaderValue::from_str(&config.key)
        .map_err(|_| McpError::Config("API key contains invalid characters".to_string()))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.key))
        .map_err(|_| McpError::Config("API key contains invalid characters".to_string()))?;
    headers.insert("apikey", key);
    headers.insert(reqwest::header::AUTHORIZATION, bearer);

    let client = Client::builder()
        .timeout(config.timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| McpError::Config(format!("Failed to create HTTP client: {}", e)))?;

    tracing::debug!(url = %config.url, "connected premium store client");
    Ok(Connection {
        client,
        base_url: format!("{}/rest/v1", config.url),
    })
}

/// Quote a value for use inside an `in.(...)` list when it has reserved characters.
fn list_item(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// PostgREST query-string pairs for a query.
fn query_pairs(query: &Query, with_shape: bool) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if with_shape {
        let columns = if query.columns.is_empty() {
            "*".to_string()
        } else {
            query.columns.join(",")
        };
        pairs.push(("select".to_string(), columns));
    }

    for filter in &query.filters {
        let value = match filter {
            Filter::Eq(_, v) => format!("eq.{}", v),
            Filter::In(_, vs) => format!(
                "in.({})",
                vs.iter().map(|v| list_item(v)).collect::<Vec<_>>().join(",")
            ),
            Filter::Gte(_, v) => format!("gte.{}", v),
            Filter::Lte(_, v) => format!("lte.{}", v),
        };
        pairs.push((filter.column().to_string(), value));
    }

    if with_shape {
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = query.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
    }

    pairs
}

/// Total from a `Content-Range` header such as `0-9/1234` or `*/1234`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

async fn error_from_response(response: Response) -> McpError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<RestError>(&body) {
        Ok(err) if err.message.is_some() => {
            let mut message = err.message.unwrap_or_default();
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                message = format!("{} ({})", message, details);
            }
            McpError::Store {
                code: err.code.unwrap_or_else(|| status.as_u16().to_string()),
                message,
            }
        }
        _ => McpError::Store {
            code: status.as_u16().to_string(),
            message: if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body)
            },
        },
    }
}

#[async_trait]
impl PremiumStore for SupabaseStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<JsonValue>> {
        let conn = self.connection().await?;
        let url = format!("{}/{}", conn.base_url, table);
        tracing::debug!(%table, ?query, "select");

        let response = conn
            .client
            .get(&url)
            .query(&query_pairs(query, true))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(%table, error = %err, "select failed");
            return Err(err);
        }

        Ok(response.json().await?)
    }

    async fn count(&self, table: Table, query: &Query) -> Result<u64> {
        let conn = self.connection().await?;
        let url = format!("{}/{}", conn.base_url, table);
        tracing::debug!(%table, ?query, "count");

        let response = conn
            .client
            .head(&url)
            .query(&query_pairs(query, false))
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(%table, error = %err, "count failed");
            return Err(err);
        }

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| McpError::Store {
                code: "NO_COUNT".to_string(),
                message: format!("{} count missing from response", table),
            })
    }
}
