//! Donation drives with signed image URLs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobStore, RecordStore, SelectQuery, decode};

/// Donations table.
pub const DONATION_TABLE: &str = "donations";

/// Bucket holding donation images (private; access via signed URLs).
pub const DONATION_BUCKET: &str = "donation-images";

/// Signed-URL validity: 24 hours.
pub const DONATION_IMAGE_TTL_SECS: u32 = 86_400;

/// Shown when a donation has no image or signing fails.
pub const DONATION_PLACEHOLDER_URL: &str = "https://placehold.co/600x400?text=donation";

/// Backend-shaped donation row.
///
/// `percentage` is stored by the backend and may disagree with
/// `raised`/`target`; it is surfaced verbatim, never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Image object key in [`DONATION_BUCKET`], if any.
    pub image: Option<String>,
    pub raised: i64,
    pub target: i64,
    pub percentage: i64,
}

/// A donation drive with its image URL resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationCard {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Signed URL, or the placeholder when absent/unresolvable.
    pub image_url: String,
    pub raised: i64,
    pub target: i64,
    pub percentage: i64,
}

/// Service over the donations table and image bucket.
pub struct DonationService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DonationService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { records, blobs })
    }

    /// All donation drives with signed image URLs.
    ///
    /// Image resolution is best effort: a missing reference or a signing
    /// failure yields [`DONATION_PLACEHOLDER_URL`], never an error state.
    pub async fn fetch_drives(&self) -> DataResult<Vec<DonationCard>> {
        let rows = self
            .records
            .select(SelectQuery::table(DONATION_TABLE))
            .await
            .map_err(DataError::record_fetch)?;

        let donations: Vec<Donation> = decode::rows(DONATION_TABLE, rows);
        debug!(count = donations.len(), "signing donation images");

        let mut lookups = JoinSet::new();
        for (index, donation) in donations.iter().enumerate() {
            let blobs = Arc::clone(&self.blobs);
            let image = donation.image.clone();
            let id = donation.id;
            lookups.spawn(async move {
                let Some(key) = image else {
                    return (index, DONATION_PLACEHOLDER_URL.to_string());
                };
                match blobs
                    .signed_url(DONATION_BUCKET, &key, DONATION_IMAGE_TTL_SECS)
                    .await
                {
                    Ok(url) => (index, url),
                    Err(err) => {
                        warn!(%id, key, error = %err, "image signing failed, using placeholder");
                        (index, DONATION_PLACEHOLDER_URL.to_string())
                    }
                }
            });
        }

        let mut image_urls = vec![String::new(); donations.len()];
        while let Some(joined) = lookups.join_next().await {
            let (index, url) = joined.map_err(DataError::join)?;
            image_urls[index] = url;
        }

        Ok(donations
            .into_iter()
            .zip(image_urls)
            .map(|(donation, image_url)| DonationCard {
                id: donation.id,
                title: donation.title,
                description: donation.description,
                image_url,
                raised: donation.raised,
                target: donation.target,
                // Verbatim from the record, even when inconsistent with
                // raised/target.
                percentage: donation.percentage,
            })
            .collect())
    }

    /// Donation drives as a refetchable resource.
    pub fn drives(self: &Arc<Self>) -> Arc<QueryResource<Vec<DonationCard>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_drives().await }
        })
    }
}
