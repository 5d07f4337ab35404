//! Committee gallery: a flat listing of one fixed bucket.

use std::sync::Arc;

use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobRef, BlobStore};

/// Bucket holding committee images.
pub const COMMITTEE_BUCKET: &str = "committee-images";

/// Service over the committee image bucket. No relational rows are
/// involved; the listing itself is the base query.
pub struct CommitteeService {
    blobs: Arc<dyn BlobStore>,
}

impl CommitteeService {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { blobs })
    }

    /// Every object in the committee bucket, resolved to a public URL.
    pub async fn fetch_images(&self) -> DataResult<Vec<BlobRef>> {
        let objects = self
            .blobs
            .list(COMMITTEE_BUCKET, "")
            .await
            .map_err(DataError::record_fetch)?;

        Ok(objects
            .into_iter()
            .map(|object| BlobRef {
                public_url: self.blobs.public_url(COMMITTEE_BUCKET, &object.name),
                name: object.name,
            })
            .collect())
    }

    /// Committee gallery as a refetchable resource.
    pub fn images(self: &Arc<Self>) -> Arc<QueryResource<Vec<BlobRef>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_images().await }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;

    #[tokio::test]
    async fn lists_the_whole_bucket() {
        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.insert(COMMITTEE_BUCKET, "board-2024.jpg");
        blobs.insert(COMMITTEE_BUCKET, "annual-meet.jpg");

        let service = CommitteeService::new(blobs);
        let images = service.fetch_images().await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "annual-meet.jpg");
        assert_eq!(
            images[0].public_url,
            "memory://committee-images/annual-meet.jpg"
        );
    }

    #[tokio::test]
    async fn listing_failure_surfaces_as_record_fetch() {
        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.fail_bucket(COMMITTEE_BUCKET);

        let service = CommitteeService::new(blobs);
        assert!(matches!(
            service.fetch_images().await.unwrap_err(),
            DataError::RecordFetch(_)
        ));
    }
}
