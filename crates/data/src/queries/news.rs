//! Community news: articles joined with their authors' display names.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::debug;
use uuid::Uuid;

use super::members::profile_by_id;
use crate::error::{DataError, DataResult};
use crate::resource::QueryResource;
use crate::store::{BlobStore, RecordStore, SelectQuery, SortDirection, decode};

/// News table.
pub const NEWS_TABLE: &str = "news";

/// Bucket holding article images, keyed `{author_id}.jpg` by convention.
pub const NEWS_BUCKET: &str = "news-images";

/// Backend-shaped article row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub author_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

/// An article with its author resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub id: Uuid,
    pub title: String,
    pub body: Option<String>,
    pub author_name: String,
    pub image_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Service over the news table, the profiles table, and the news bucket.
pub struct NewsService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl NewsService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        Arc::new(Self { records, blobs })
    }

    /// All articles, newest first, with author names resolved.
    ///
    /// The author lookup is a hard dependency: if any article's profile
    /// lookup fails, the whole list fails — no partial data.
    pub async fn fetch_news(&self) -> DataResult<Vec<NewsItem>> {
        let rows = self
            .records
            .select(SelectQuery::table(NEWS_TABLE).order_by("created_at", SortDirection::Desc))
            .await
            .map_err(DataError::record_fetch)?;

        let articles: Vec<Article> = decode::rows(NEWS_TABLE, rows);
        debug!(count = articles.len(), "resolving article authors");

        let mut lookups = JoinSet::new();
        for (index, article) in articles.iter().enumerate() {
            let records = Arc::clone(&self.records);
            let author_id = article.author_id;
            lookups.spawn(async move {
                let profile = profile_by_id(records.as_ref(), author_id)
                    .await
                    .map_err(|err| match err {
                        // A store failure during a join is a join failure.
                        DataError::RecordFetch(msg) => DataError::Join(msg),
                        other => other,
                    })?;
                Ok::<_, DataError>((index, profile.full_name))
            });
        }

        let mut authors: Vec<String> = vec![String::new(); articles.len()];
        while let Some(joined) = lookups.join_next().await {
            let (index, name) = joined.map_err(DataError::join)??;
            authors[index] = name;
        }

        Ok(articles
            .into_iter()
            .zip(authors)
            .map(|(article, author_name)| NewsItem {
                image_url: self
                    .blobs
                    .public_url(NEWS_BUCKET, &format!("{}.jpg", article.author_id)),
                id: article.id,
                title: article.title,
                body: article.body,
                author_name,
                created_at: article.created_at,
            })
            .collect())
    }

    /// News feed as a refetchable resource.
    pub fn feed(self: &Arc<Self>) -> Arc<QueryResource<Vec<NewsItem>>> {
        let service = Arc::clone(self);
        QueryResource::new(move || {
            let service = Arc::clone(&service);
            async move { service.fetch_news().await }
        })
    }
}
