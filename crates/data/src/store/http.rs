//! HTTP adapters for the hosted backend.
//!
//! [`HttpRecordStore`] speaks the PostgREST dialect
//! (`/rest/v1/{table}?column=eq.value&order=...&limit=...`, exact counts
//! via `Prefer: count=exact` and the `Content-Range` header).
//! [`HttpBlobStore`] speaks the storage API
//! (`/storage/v1/object/{list,public,sign}/...`).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use super::query::{Filter, SelectQuery, SortDirection};
use super::{BlobObject, BlobStore, RecordStore};
use crate::config::Config;

/// Maximum objects returned per listing call. One backend page is the
/// contract; no pagination beyond it.
const LIST_LIMIT: u32 = 1000;

fn build_client(config: &Config) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let key = HeaderValue::from_str(&config.api_key).context("API key is not a valid header")?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .context("API key is not a valid header")?;
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Record store speaking PostgREST.
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.api_url.clone(),
        })
    }

    /// Render a query into the PostgREST URL.
    fn select_url(&self, query: &SelectQuery) -> String {
        let mut params: Vec<String> = Vec::new();

        if query.columns.is_empty() {
            params.push("select=*".to_string());
        } else {
            params.push(format!("select={}", query.columns.join(",")));
        }

        for filter in &query.filters {
            params.push(render_filter(filter));
        }

        if let Some(order) = &query.order {
            let direction = match order.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            params.push(format!("order={}.{direction}", order.column));
        }

        if let Some(limit) = query.limit {
            params.push(format!("limit={limit}"));
        }

        format!(
            "{}/rest/v1/{}?{}",
            self.base_url,
            query.table,
            params.join("&")
        )
    }

    fn count_url(&self, table: &str, filters: &[Filter]) -> String {
        let mut params = vec!["select=id".to_string()];
        for filter in filters {
            params.push(render_filter(filter));
        }
        format!("{}/rest/v1/{table}?{}", self.base_url, params.join("&"))
    }
}

fn render_filter(filter: &Filter) -> String {
    match filter {
        Filter::Eq(column, value) => {
            let rendered = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{column}=eq.{}", urlencoding::encode(&rendered))
        }
        Filter::IsNull(column) => format!("{column}=is.null"),
        Filter::NotNull(column) => format!("{column}=not.is.null"),
    }
}

/// Parse the total from a `Content-Range` header (`0-9/42` or `*/0`).
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.parse().ok()
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn select(&self, query: SelectQuery) -> Result<Vec<JsonValue>> {
        let url = self.select_url(&query);
        debug!(table = %query.table, %url, "record select");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("select on {} failed", query.table))?
            .error_for_status()
            .with_context(|| format!("select on {} rejected", query.table))?;

        response
            .json()
            .await
            .with_context(|| format!("select on {} returned malformed JSON", query.table))
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        let url = self.count_url(table, filters);
        debug!(%table, %url, "record count");

        let response = self
            .client
            .head(&url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .with_context(|| format!("count on {table} failed"))?
            .error_for_status()
            .with_context(|| format!("count on {table} rejected"))?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("count on {table} returned no Content-Range"))?;

        parse_content_range(range)
            .ok_or_else(|| anyhow!("count on {table} returned malformed Content-Range: {range}"))
    }
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Blob store speaking the storage API.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.api_url.clone(),
        })
    }

    fn storage_url(&self, endpoint: &str) -> String {
        format!("{}/storage/v1/{endpoint}", self.base_url)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>> {
        let url = self.storage_url(&format!("object/list/{bucket}"));
        debug!(%bucket, %prefix, "blob list");

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "prefix": prefix,
                "limit": LIST_LIMIT,
                "offset": 0,
                "sortBy": { "column": "name", "order": "asc" },
            }))
            .send()
            .await
            .with_context(|| format!("list on bucket {bucket} failed"))?
            .error_for_status()
            .with_context(|| format!("list on bucket {bucket} rejected"))?;

        let mut objects: Vec<BlobObject> = response
            .json()
            .await
            .with_context(|| format!("list on bucket {bucket} returned malformed JSON"))?;

        // The storage API returns names relative to the prefix; the trait
        // contract is keys relative to the bucket root.
        if !prefix.is_empty() {
            let folder = prefix.trim_end_matches('/');
            for object in &mut objects {
                object.name = format!("{folder}/{}", object.name);
            }
        }
        Ok(objects)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{bucket}/{path}"))
    }

    async fn signed_url(&self, bucket: &str, path: &str, ttl_secs: u32) -> Result<String> {
        let url = self.storage_url(&format!("object/sign/{bucket}/{path}"));
        debug!(%bucket, %path, ttl_secs, "blob sign");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .with_context(|| format!("sign of {bucket}/{path} failed"))?
            .error_for_status()
            .with_context(|| format!("sign of {bucket}/{path} rejected"))?;

        let signed: SignResponse = response
            .json()
            .await
            .with_context(|| format!("sign of {bucket}/{path} returned malformed JSON"))?;

        // The backend returns a path relative to the storage root.
        Ok(format!(
            "{}{}",
            self.storage_url(""),
            signed.signed_url.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> HttpRecordStore {
        let config = Config::new("https://project.example.co", "secret");
        HttpRecordStore::new(&config).unwrap()
    }

    #[test]
    fn select_url_renders_all_clauses() {
        let query = SelectQuery::table("profiles")
            .columns(["id", "full_name"])
            .filter(Filter::not_null("birth_date"))
            .filter(Filter::eq("gender", "Male"))
            .order_by("full_name", SortDirection::Asc)
            .limit(10);

        assert_eq!(
            store().select_url(&query),
            "https://project.example.co/rest/v1/profiles?select=id,full_name\
             &birth_date=not.is.null&gender=eq.Male&order=full_name.asc&limit=10"
        );
    }

    #[test]
    fn select_url_defaults_to_star() {
        let query = SelectQuery::table("events");
        assert_eq!(
            store().select_url(&query),
            "https://project.example.co/rest/v1/events?select=*"
        );
    }

    #[test]
    fn eq_values_are_url_encoded() {
        let rendered = render_filter(&Filter::eq("city", "San José"));
        assert_eq!(rendered, "city=eq.San%20Jos%C3%A9");
    }

    #[test]
    fn numeric_eq_renders_bare() {
        let rendered = render_filter(&Filter::eq("status", 1));
        assert_eq!(rendered, "status=eq.1");
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn public_url_shape() {
        let config = Config::new("https://project.example.co", "secret");
        let blobs = HttpBlobStore::new(&config).unwrap();
        assert_eq!(
            blobs.public_url("avatars", "families/7/rina.jpg"),
            "https://project.example.co/storage/v1/object/public/avatars/families/7/rina.jpg"
        );
    }
}
