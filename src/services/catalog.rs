use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    db::{CacheKey, SummaryCache},
    error::AppResult,
    models::{TitleId, TitleSummary},
};

/// Summaries are display data and change rarely; a day of staleness is fine
const SUMMARY_CACHE_TTL: u64 = 86_400;

/// Read-only view of the title catalog.
///
/// Implementations exist for the service's own database and for a remote
/// catalog service; both answer existence and supply display data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TitleCatalog: Send + Sync {
    /// Display data for a title, absent when the catalog does not know it
    async fn get(&self, title: &TitleId) -> AppResult<Option<TitleSummary>>;

    /// Whether the catalog knows the title
    async fn exists(&self, title: &TitleId) -> AppResult<bool> {
        Ok(self.get(title).await?.is_some())
    }
}

/// Read-through Redis cache over any [`TitleCatalog`].
///
/// Cache failures degrade to a miss; they never fail the lookup.
pub struct CachedTitleCatalog {
    inner: Arc<dyn TitleCatalog>,
    cache: SummaryCache,
}

impl CachedTitleCatalog {
    pub fn new(inner: Arc<dyn TitleCatalog>, cache: SummaryCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl TitleCatalog for CachedTitleCatalog {
    async fn get(&self, title: &TitleId) -> AppResult<Option<TitleSummary>> {
        let key = CacheKey::TitleSummary(title.clone());

        match self.cache.get::<TitleSummary>(&key).await {
            Ok(Some(summary)) => {
                tracing::debug!(title = %title, "Summary cache hit");
                return Ok(Some(summary));
            }
            Ok(None) => {
                tracing::debug!(title = %title, "Summary cache miss");
            }
            Err(error) => {
                tracing::warn!(error = %error, title = %title, "Summary cache read failed");
            }
        }

        let summary = self.inner.get(title).await?;
        if let Some(summary) = &summary {
            self.cache.put_in_background(&key, summary, SUMMARY_CACHE_TTL);
        }
        Ok(summary)
    }
}
