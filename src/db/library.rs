use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{TitleId, UserId},
    services::library::LibraryOracle,
};

/// Ownership oracle over the `library_entries` table
pub struct PgLibraryOracle {
    pool: PgPool,
}

impl PgLibraryOracle {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryOracle for PgLibraryOracle {
    async fn owns_title(&self, user: &UserId, title: &TitleId) -> AppResult<bool> {
        let owns: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM library_entries WHERE user_id = $1 AND title_id = $2)",
        )
        .bind(user.as_str())
        .bind(title.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(owns)
    }
}
