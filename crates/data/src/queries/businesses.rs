//! Member business directory: logos and image galleries joined per record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobStore, RecordStore, SelectQuery, SortDirection, decode};

/// Businesses table.
pub const BUSINESS_TABLE: &str = "businesses";

/// Bucket holding business assets, keyed `{owner_id}/logo/...` and
/// `{owner_id}/images/...`.
pub const BUSINESS_BUCKET: &str = "business-assets";

/// Backend-shaped business row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    /// Owning member; asset paths are derived from this.
    pub owner_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
}

/// A business with its resolved assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessCard {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    /// First object under the owner's logo path, if any.
    pub logo_url: Option<String>,
    /// Every object under the owner's images path.
    pub image_urls: Vec<String>,
}

/// Service over the businesses table and the asset bucket.
pub struct BusinessService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl BusinessService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { records, blobs })
    }

    /// All businesses with logos and galleries resolved.
    ///
    /// Secondary lookups fan out one task per business and the pipeline
    /// joins them all before committing. A missing or unlistable logo is
    /// best-effort (absent, logged); a failing gallery listing is a hard
    /// join failure and discards the whole result set.
    pub async fn fetch_directory(&self) -> DataResult<Vec<BusinessCard>> {
        let rows = self
            .records
            .select(SelectQuery::table(BUSINESS_TABLE).order_by("name", SortDirection::Asc))
            .await
            .map_err(DataError::record_fetch)?;

        let businesses: Vec<Business> = decode::rows(BUSINESS_TABLE, rows);
        debug!(count = businesses.len(), "resolving business assets");

        let mut lookups = JoinSet::new();
        for (index, business) in businesses.iter().enumerate() {
            let blobs = Arc::clone(&self.blobs);
            let owner = business.owner_id;
            lookups.spawn(async move {
                let logo_url = match blobs.list(BUSINESS_BUCKET, &format!("{owner}/logo/")).await {
                    Ok(objects) => objects
                        .first()
                        .map(|object| blobs.public_url(BUSINESS_BUCKET, &object.name)),
                    Err(err) => {
                        warn!(%owner, error = %err, "logo lookup failed");
                        None
                    }
                };

                let image_urls = blobs
                    .list(BUSINESS_BUCKET, &format!("{owner}/images/"))
                    .await
                    .map_err(DataError::join)?
                    .into_iter()
                    .map(|object| blobs.public_url(BUSINESS_BUCKET, &object.name))
                    .collect();

                Ok::<_, DataError>((index, logo_url, image_urls))
            });
        }

        let mut logos: Vec<Option<String>> = vec![None; businesses.len()];
        let mut galleries: Vec<Vec<String>> = vec![Vec::new(); businesses.len()];
        while let Some(joined) = lookups.join_next().await {
            let (index, logo_url, image_urls) = joined.map_err(DataError::join)??;
            logos[index] = logo_url;
            galleries[index] = image_urls;
        }

        Ok(businesses
            .into_iter()
            .zip(logos.into_iter().zip(galleries))
            .map(|(business, (logo_url, image_urls))| BusinessCard {
                id: business.id,
                name: business.name,
                category: business.category,
                description: business.description,
                phone: business.phone,
                logo_url,
                image_urls,
            })
            .collect())
    }

    /// Business directory as a refetchable resource.
    pub fn directory(self: &Arc<Self>) -> Arc<QueryResource<Vec<BusinessCard>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_directory().await }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryBlobStore, MemoryRecordStore};
    use serde_json::json;

    fn business_row(id: Uuid, owner: Uuid, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "owner_id": owner,
            "name": name,
            "category": "services",
            "description": null,
            "phone": null,
        })
    }

    #[tokio::test]
    async fn assets_join_back_by_business() {
        let owner_a = Uuid::now_v7();
        let owner_b = Uuid::now_v7();

        let records = Arc::new(MemoryRecordStore::new());
        records.insert(BUSINESS_TABLE, business_row(Uuid::now_v7(), owner_a, "Amber Foods"));
        records.insert(BUSINESS_TABLE, business_row(Uuid::now_v7(), owner_b, "Zenith Tools"));

        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.insert(BUSINESS_BUCKET, &format!("{owner_a}/logo/main.png"));
        blobs.insert(BUSINESS_BUCKET, &format!("{owner_a}/images/shop1.jpg"));
        blobs.insert(BUSINESS_BUCKET, &format!("{owner_a}/images/shop2.jpg"));

        let service = BusinessService::new(records, blobs);
        let cards = service.fetch_directory().await.unwrap();

        assert_eq!(cards.len(), 2);
        let amber = &cards[0];
        assert_eq!(amber.name, "Amber Foods");
        assert_eq!(
            amber.logo_url.as_deref(),
            Some(format!("memory://business-assets/{owner_a}/logo/main.png").as_str())
        );
        assert_eq!(amber.image_urls.len(), 2);

        let zenith = &cards[1];
        assert!(zenith.logo_url.is_none());
        assert!(zenith.image_urls.is_empty());
    }

    #[tokio::test]
    async fn missing_logo_is_absent_not_fatal() {
        let owner = Uuid::now_v7();
        let records = Arc::new(MemoryRecordStore::new());
        records.insert(BUSINESS_TABLE, business_row(Uuid::now_v7(), owner, "No Logo Co"));

        let service = BusinessService::new(records, Arc::new(MemoryBlobStore::new()));
        let cards = service.fetch_directory().await.unwrap();

        assert_eq!(cards.len(), 1);
        assert!(cards[0].logo_url.is_none());
    }

    #[tokio::test]
    async fn gallery_listing_failure_discards_the_set() {
        let records = Arc::new(MemoryRecordStore::new());
        records.insert(
            BUSINESS_TABLE,
            business_row(Uuid::now_v7(), Uuid::now_v7(), "Broken Bucket"),
        );

        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.fail_bucket(BUSINESS_BUCKET);

        let service = BusinessService::new(records, blobs);
        let err = service.fetch_directory().await.unwrap_err();
        assert!(matches!(err, DataError::Join(_)));
    }

    #[tokio::test]
    async fn base_failure_is_record_fetch() {
        let records = Arc::new(MemoryRecordStore::new());
        records.fail_table(BUSINESS_TABLE);

        let service = BusinessService::new(records, Arc::new(MemoryBlobStore::new()));
        assert!(matches!(
            service.fetch_directory().await.unwrap_err(),
            DataError::RecordFetch(_)
        ));
    }
}
