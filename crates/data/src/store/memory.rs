//! In-memory store backends.
//!
//! Development and test counterparts to the HTTP adapters, the way a
//! local filesystem backend pairs with an object-store one. Both support
//! fault injection so pipeline failure policy can be exercised without a
//! network.

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use super::query::{Filter, SelectQuery, SortDirection};
use super::{BlobObject, BlobStore, RecordStore};

/// In-memory record store backed by JSON rows per table.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<JsonValue>>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one row into a table.
    pub fn insert(&self, table: &str, row: JsonValue) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Insert a batch of rows into a table.
    pub fn insert_many(&self, table: &str, rows: impl IntoIterator<Item = JsonValue>) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Make every query against `table` fail (fault injection).
    pub fn fail_table(&self, table: &str) {
        self.failing.write().insert(table.to_string());
    }

    fn matching_rows(&self, table: &str, filters: &[Filter]) -> Result<Vec<JsonValue>> {
        if self.failing.read().contains(table) {
            bail!("injected failure for table {table}");
        }
        let tables = self.tables.read();
        let rows = tables.get(table).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|row| filters.iter().all(|f| matches_filter(row, f)))
            .collect())
    }
}

fn matches_filter(row: &JsonValue, filter: &Filter) -> bool {
    let field = |column: &str| row.get(column).unwrap_or(&JsonValue::Null);
    match filter {
        Filter::Eq(column, value) => field(column) == value,
        Filter::IsNull(column) => field(column).is_null(),
        Filter::NotNull(column) => !field(column).is_null(),
    }
}

/// Ordering for JSON scalars: nulls first, then numbers, then strings.
fn compare_json(a: &JsonValue, b: &JsonValue) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Null, _) => Ordering::Less,
        (_, JsonValue::Null) => Ordering::Greater,
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn select(&self, query: SelectQuery) -> Result<Vec<JsonValue>> {
        let mut rows = self.matching_rows(&query.table, &query.filters)?;

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let null = JsonValue::Null;
                let left = a.get(&order.column).unwrap_or(&null);
                let right = b.get(&order.column).unwrap_or(&null);
                let ordering = compare_json(left, right);
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }

        Ok(rows)
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        Ok(self.matching_rows(table, filters)?.len() as u64)
    }
}

/// In-memory blob store keyed by bucket and object key.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<String>>>,
    failing_buckets: RwLock<HashSet<String>>,
    failing_signs: RwLock<HashSet<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object key into a bucket.
    pub fn insert(&self, bucket: &str, key: &str) {
        self.objects
            .write()
            .entry(bucket.to_string())
            .or_default()
            .push(key.to_string());
    }

    /// Make every listing of `bucket` fail (fault injection).
    pub fn fail_bucket(&self, bucket: &str) {
        self.failing_buckets.write().insert(bucket.to_string());
    }

    /// Make signing of one object fail (fault injection).
    pub fn fail_sign(&self, bucket: &str, path: &str) {
        self.failing_signs.write().insert(format!("{bucket}/{path}"));
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>> {
        if self.failing_buckets.read().contains(bucket) {
            bail!("injected failure for bucket {bucket}");
        }
        let objects = self.objects.read();
        let mut keys: Vec<String> = objects
            .get(bucket)
            .map(|keys| {
                keys.iter()
                    .filter(|key| key.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();

        Ok(keys
            .into_iter()
            .map(|name| BlobObject {
                name,
                metadata: None,
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    async fn signed_url(&self, bucket: &str, path: &str, ttl_secs: u32) -> Result<String> {
        if self.failing_signs.read().contains(&format!("{bucket}/{path}")) {
            bail!("injected signing failure for {bucket}/{path}");
        }
        Ok(format!("memory://{bucket}/{path}?expires_in={ttl_secs}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let store = MemoryRecordStore::new();
        store.insert_many(
            "profiles",
            [
                json!({"id": 1, "name": "Zenith", "birth_date": null}),
                json!({"id": 2, "name": "Amber", "birth_date": "1990-01-01"}),
                json!({"id": 3, "name": "Mango", "birth_date": "1985-05-05"}),
            ],
        );

        let rows = store
            .select(
                SelectQuery::table("profiles")
                    .filter(Filter::not_null("birth_date"))
                    .order_by("name", SortDirection::Asc)
                    .limit(1),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Amber");
    }

    #[tokio::test]
    async fn count_respects_filters() {
        let store = MemoryRecordStore::new();
        store.insert_many(
            "profiles",
            [
                json!({"gender": "Male"}),
                json!({"gender": "Male"}),
                json!({"gender": "Female"}),
            ],
        );

        assert_eq!(store.count("profiles", &[]).await.unwrap(), 3);
        assert_eq!(
            store
                .count("profiles", &[Filter::eq("gender", "Male")])
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn injected_table_failure_propagates() {
        let store = MemoryRecordStore::new();
        store.fail_table("profiles");
        assert!(store.select(SelectQuery::table("profiles")).await.is_err());
        assert!(store.count("profiles", &[]).await.is_err());
    }

    #[tokio::test]
    async fn listing_is_prefix_scoped_and_sorted() {
        let blobs = MemoryBlobStore::new();
        blobs.insert("gallery", "7/images/b.jpg");
        blobs.insert("gallery", "7/images/a.jpg");
        blobs.insert("gallery", "8/images/c.jpg");

        let listed = blobs.list("gallery", "7/images/").await.unwrap();
        let names: Vec<_> = listed.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["7/images/a.jpg", "7/images/b.jpg"]);
    }

    #[tokio::test]
    async fn signing_failure_is_injectable() {
        let blobs = MemoryBlobStore::new();
        blobs.insert("donations", "drive.png");
        blobs.fail_sign("donations", "drive.png");
        assert!(blobs.signed_url("donations", "drive.png", 60).await.is_err());

        let url = blobs.signed_url("donations", "other.png", 60).await.unwrap();
        assert_eq!(url, "memory://donations/other.png?expires_in=60");
    }
}
