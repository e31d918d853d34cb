use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{TitleId, UserId},
};

/// Answers whether a user holds a title in their library.
///
/// Consumed read-only; library contents are managed elsewhere. Callers in
/// this service treat an error from the oracle the same as "not owned".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryOracle: Send + Sync {
    async fn owns_title(&self, user: &UserId, title: &TitleId) -> AppResult<bool>;
}
