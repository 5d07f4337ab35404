//! Shubh Chintak magazine archive.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobStore, RecordStore, SelectQuery, SortDirection, decode};

/// Magazines table.
pub const MAGAZINE_TABLE: &str = "shubh_chintak";

/// Bucket holding magazine assets; covers live under `covers/`.
pub const MAGAZINE_BUCKET: &str = "magazines";

/// Backend-shaped magazine row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magazine {
    pub id: Uuid,
    pub title: String,
    /// Link to the full issue, when published online.
    pub magazine_url: Option<String>,
    /// Cover-image identifier; resolved as `covers/{id}.jpg`.
    pub cover_image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A magazine issue with its cover resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagazineIssue {
    pub id: Uuid,
    pub title: String,
    pub magazine_url: Option<String>,
    /// Absent when the record carries no cover identifier.
    pub cover_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Service over the magazine table and bucket.
pub struct MagazineService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl MagazineService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { records, blobs })
    }

    /// Issues, newest first, optionally capped at the fetch stage.
    /// Records without a cover identifier pass through unresolved.
    pub async fn fetch_issues(&self, limit: Option<u32>) -> DataResult<Vec<MagazineIssue>> {
        let mut query =
            SelectQuery::table(MAGAZINE_TABLE).order_by("created_at", SortDirection::Desc);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = self
            .records
            .select(query)
            .await
            .map_err(DataError::record_fetch)?;

        let magazines: Vec<Magazine> = decode::rows(MAGAZINE_TABLE, rows);

        Ok(magazines
            .into_iter()
            .map(|magazine| MagazineIssue {
                cover_url: magazine
                    .cover_image
                    .as_deref()
                    .map(|id| self.blobs.public_url(MAGAZINE_BUCKET, &format!("covers/{id}.jpg"))),
                id: magazine.id,
                title: magazine.title,
                magazine_url: magazine.magazine_url,
                created_at: magazine.created_at,
            })
            .collect())
    }

    /// Magazine archive as a refetchable resource.
    pub fn archive(self: &Arc<Self>, limit: Option<u32>) -> Arc<QueryResource<Vec<MagazineIssue>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_issues(limit).await }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryBlobStore, MemoryRecordStore};
    use serde_json::json;

    fn issue_row(title: &str, cover: Option<&str>, created_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::now_v7(),
            "title": title,
            "magazine_url": null,
            "cover_image": cover,
            "created_at": created_at,
        })
    }

    #[tokio::test]
    async fn covers_resolve_by_convention_or_pass_through() {
        let records = Arc::new(MemoryRecordStore::new());
        records.insert(
            MAGAZINE_TABLE,
            issue_row("Diwali 2023", Some("diwali-2023"), "2023-11-01T00:00:00Z"),
        );
        records.insert(
            MAGAZINE_TABLE,
            issue_row("Untitled Draft", None, "2024-01-01T00:00:00Z"),
        );

        let service = MagazineService::new(records, Arc::new(MemoryBlobStore::new()));
        let issues = service.fetch_issues(None).await.unwrap();

        assert_eq!(issues.len(), 2);
        // Newest first.
        assert_eq!(issues[0].title, "Untitled Draft");
        assert!(issues[0].cover_url.is_none());
        assert_eq!(
            issues[1].cover_url.as_deref(),
            Some("memory://magazines/covers/diwali-2023.jpg")
        );
    }

    #[tokio::test]
    async fn limit_applies_at_the_fetch_stage() {
        let records = Arc::new(MemoryRecordStore::new());
        for n in 0..5 {
            records.insert(
                MAGAZINE_TABLE,
                issue_row(&format!("Issue {n}"), None, &format!("2024-0{}-01T00:00:00Z", n + 1)),
            );
        }

        let service = MagazineService::new(records, Arc::new(MemoryBlobStore::new()));
        let issues = service.fetch_issues(Some(2)).await.unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].title, "Issue 4");
        assert_eq!(issues[1].title, "Issue 3");
    }

    #[tokio::test]
    async fn base_failure_is_record_fetch() {
        let records = Arc::new(MemoryRecordStore::new());
        records.fail_table(MAGAZINE_TABLE);

        let service = MagazineService::new(records, Arc::new(MemoryBlobStore::new()));
        assert!(matches!(
            service.fetch_issues(None).await.unwrap_err(),
            DataError::RecordFetch(_)
        ));
    }
}
