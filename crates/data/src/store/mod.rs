//! Remote store boundary.
//!
//! The aggregation layer reaches its backend through two trait seams:
//! [`RecordStore`] for filtered/sorted relational reads and [`BlobStore`]
//! for object listing and URL resolution. Both are fallible,
//! latency-bearing, and non-transactional — no atomicity is assumed
//! across a record read and a blob resolution.

pub mod decode;
pub mod http;
pub mod memory;
pub mod query;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub use http::{HttpBlobStore, HttpRecordStore};
pub use memory::{MemoryBlobStore, MemoryRecordStore};
pub use query::{Filter, SelectQuery, SortDirection};

/// Filtered/sorted reads of relational tables.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a select query, returning raw backend-shaped rows.
    async fn select(&self, query: SelectQuery) -> Result<Vec<JsonValue>>;

    /// Exact row count for a table under the given filters.
    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64>;
}

/// Listing and URL resolution for stored binary objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List objects in `bucket` under `prefix` (empty prefix lists all).
    /// Returned names are object keys relative to the bucket root.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>>;

    /// Resolve the public URL for an object. Pure function of
    /// (bucket, path); no existence check, no caching guarantee.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Resolve a signed, time-limited URL for an object.
    async fn signed_url(&self, bucket: &str, path: &str, ttl_secs: u32) -> Result<String>;
}

/// A stored object as returned by [`BlobStore::list`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobObject {
    /// Object key relative to the bucket root.
    pub name: String,

    /// Backend metadata (content type, size), passed through opaquely.
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// An object-store key paired with its resolved URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub name: String,
    pub public_url: String,
}
