use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{TitleId, TitleSummary, TitleType},
    services::catalog::TitleCatalog,
};

/// Title catalog over the service's own `titles` table
pub struct PgTitleCatalog {
    pool: PgPool,
}

impl PgTitleCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TitleRow {
    id: String,
    title: String,
    title_type: String,
    release_year: Option<i32>,
}

#[async_trait]
impl TitleCatalog for PgTitleCatalog {
    async fn get(&self, title: &TitleId) -> AppResult<Option<TitleSummary>> {
        let row = sqlx::query_as::<_, TitleRow>(
            "SELECT id, title, title_type, release_year FROM titles WHERE id = $1",
        )
        .bind(title.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| TitleSummary {
            id: TitleId::unchecked(row.id),
            title: row.title,
            title_type: TitleType::parse(&row.title_type),
            release_year: row.release_year,
        }))
    }

    async fn exists(&self, title: &TitleId) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM titles WHERE id = $1)")
                .bind(title.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
