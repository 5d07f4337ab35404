//! Community events with per-event image galleries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobStore, RecordStore, SelectQuery, SortDirection, decode};

/// Events table.
pub const EVENT_TABLE: &str = "events";

/// Bucket holding event images, keyed `{event_id}/...`.
pub const EVENT_BUCKET: &str = "event-images";

/// Backend-shaped event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}

/// An event with its gallery resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCard {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub image_urls: Vec<String>,
}

/// Service over the events table and image bucket.
pub struct EventService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl EventService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { records, blobs })
    }

    /// All events, soonest first, with galleries resolved.
    ///
    /// Gallery listings fan out per event; an empty gallery is fine, but
    /// a failing listing is a hard join failure.
    pub async fn fetch_events(&self) -> DataResult<Vec<EventCard>> {
        let rows = self
            .records
            .select(SelectQuery::table(EVENT_TABLE).order_by("starts_at", SortDirection::Asc))
            .await
            .map_err(DataError::record_fetch)?;

        let events: Vec<EventRecord> = decode::rows(EVENT_TABLE, rows);
        debug!(count = events.len(), "resolving event galleries");

        let mut lookups = JoinSet::new();
        for (index, event) in events.iter().enumerate() {
            let blobs = Arc::clone(&self.blobs);
            let event_id = event.id;
            lookups.spawn(async move {
                let image_urls = blobs
                    .list(EVENT_BUCKET, &format!("{event_id}/"))
                    .await
                    .map_err(DataError::join)?
                    .into_iter()
                    .map(|object| blobs.public_url(EVENT_BUCKET, &object.name))
                    .collect::<Vec<_>>();
                Ok::<_, DataError>((index, image_urls))
            });
        }

        let mut galleries: Vec<Vec<String>> = vec![Vec::new(); events.len()];
        while let Some(joined) = lookups.join_next().await {
            let (index, image_urls) = joined.map_err(DataError::join)??;
            galleries[index] = image_urls;
        }

        Ok(events
            .into_iter()
            .zip(galleries)
            .map(|(event, image_urls)| EventCard {
                id: event.id,
                title: event.title,
                description: event.description,
                venue: event.venue,
                starts_at: event.starts_at,
                image_urls,
            })
            .collect())
    }

    /// Event listing as a refetchable resource.
    pub fn upcoming(self: &Arc<Self>) -> Arc<QueryResource<Vec<EventCard>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_events().await }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryBlobStore, MemoryRecordStore};
    use serde_json::json;

    fn event_row(id: Uuid, title: &str, starts_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "description": null,
            "venue": "Community Hall",
            "starts_at": starts_at,
        })
    }

    #[tokio::test]
    async fn events_sort_soonest_first_with_galleries() {
        let early = Uuid::now_v7();
        let late = Uuid::now_v7();

        let records = Arc::new(MemoryRecordStore::new());
        records.insert(EVENT_TABLE, event_row(late, "Annual Meet", "2024-09-01T10:00:00Z"));
        records.insert(EVENT_TABLE, event_row(early, "Garba Night", "2024-03-01T18:00:00Z"));

        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.insert(EVENT_BUCKET, &format!("{early}/poster.jpg"));
        blobs.insert(EVENT_BUCKET, &format!("{early}/stage.jpg"));

        let service = EventService::new(records, blobs);
        let cards = service.fetch_events().await.unwrap();

        assert_eq!(cards[0].title, "Garba Night");
        assert_eq!(cards[0].image_urls.len(), 2);
        assert_eq!(
            cards[0].image_urls[0],
            format!("memory://event-images/{early}/poster.jpg")
        );
        assert!(cards[1].image_urls.is_empty());
    }

    #[tokio::test]
    async fn gallery_failure_fails_the_pipeline() {
        let records = Arc::new(MemoryRecordStore::new());
        records.insert(
            EVENT_TABLE,
            event_row(Uuid::now_v7(), "Broken", "2024-01-01T00:00:00Z"),
        );

        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.fail_bucket(EVENT_BUCKET);

        let service = EventService::new(records, blobs);
        assert!(matches!(
            service.fetch_events().await.unwrap_err(),
            DataError::Join(_)
        ));
    }
}
