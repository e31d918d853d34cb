use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationRecord, RecordId, SlotEntry, SlotSet, TitleId, UserId},
    services::store::{SlotStore, SlotUnitOfWork},
};

const SELECT_RECORD: &str = "SELECT id, user_id, target_title_id, \
     first_title_id, first_note, second_title_id, second_note, \
     third_title_id, third_note, created_at, updated_at \
     FROM recommendations";

/// Slot store backed by the `recommendations` table.
///
/// A unit of work is a database transaction: record locks are
/// `SELECT … FOR UPDATE`, and the atomic create-or-merge is an
/// `INSERT … ON CONFLICT DO NOTHING` followed by a locked re-read inside
/// the same transaction, so a lost creation race still hands the caller
/// the winning row under lock.
pub struct PgSlotStore {
    pool: PgPool,
}

impl PgSlotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: Uuid,
    user_id: String,
    target_title_id: String,
    first_title_id: Option<String>,
    first_note: Option<String>,
    second_title_id: Option<String>,
    second_note: Option<String>,
    third_title_id: Option<String>,
    third_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecommendationRow> for RecommendationRecord {
    fn from(row: RecommendationRow) -> Self {
        let slots = SlotSet::from_columns([
            (row.first_title_id, row.first_note),
            (row.second_title_id, row.second_note),
            (row.third_title_id, row.third_note),
        ]);
        RecommendationRecord::new(
            RecordId::from(row.id),
            UserId::unchecked(row.user_id),
            TitleId::unchecked(row.target_title_id),
            slots,
            row.created_at,
            row.updated_at,
        )
    }
}

fn slot_columns(index: usize) -> AppResult<(&'static str, &'static str)> {
    match index {
        0 => Ok(("first_title_id", "first_note")),
        1 => Ok(("second_title_id", "second_note")),
        2 => Ok(("third_title_id", "third_note")),
        _ => Err(AppError::Internal(format!(
            "slot index {} out of range",
            index
        ))),
    }
}

#[async_trait]
impl SlotStore for PgSlotStore {
    async fn begin(&self) -> AppResult<Box<dyn SlotUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find(
        &self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>> {
        let sql = format!(
            "{} WHERE user_id = $1 AND target_title_id = $2",
            SELECT_RECORD
        );
        let row = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(owner.as_str())
            .bind(target.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_for_target(&self, target: &TitleId) -> AppResult<Vec<RecommendationRecord>> {
        let sql = format!("{} WHERE target_title_id = $1", SELECT_RECORD);
        let rows = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(target.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn locked_record(
        &mut self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>> {
        let sql = format!(
            "{} WHERE user_id = $1 AND target_title_id = $2 FOR UPDATE",
            SELECT_RECORD
        );
        let row = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(owner.as_str())
            .bind(target.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl SlotUnitOfWork for PgUnitOfWork {
    async fn lock(
        &mut self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>> {
        self.locked_record(owner, target).await
    }

    async fn create_with_first_slot(
        &mut self,
        owner: &UserId,
        target: &TitleId,
        entry: &SlotEntry,
    ) -> AppResult<RecommendationRecord> {
        sqlx::query(
            "INSERT INTO recommendations \
             (id, user_id, target_title_id, first_title_id, first_note) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, target_title_id) DO NOTHING",
        )
        .bind(RecordId::generate().as_uuid())
        .bind(owner.as_str())
        .bind(target.as_str())
        .bind(entry.title.as_str())
        .bind(entry.note.clone())
        .execute(&mut *self.tx)
        .await?;

        // Re-read under lock: the row is either ours or the concurrent
        // winner's, and stays locked for the rest of this transaction.
        self.locked_record(owner, target).await?.ok_or_else(|| {
            AppError::Internal("record missing after atomic create-or-merge".to_string())
        })
    }

    async fn write_slot(
        &mut self,
        record: RecordId,
        index: usize,
        entry: &SlotEntry,
    ) -> AppResult<()> {
        let (title_column, note_column) = slot_columns(index)?;
        let sql = format!(
            "UPDATE recommendations SET {} = $2, {} = $3, updated_at = now() WHERE id = $1",
            title_column, note_column
        );
        let result = sqlx::query(&sql)
            .bind(record.as_uuid())
            .bind(entry.title.as_str())
            .bind(entry.note.clone())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "recommendation record {}",
                record
            )));
        }
        Ok(())
    }

    async fn compact_and_persist(
        &mut self,
        record: RecordId,
        remaining: &[SlotEntry],
    ) -> AppResult<()> {
        if remaining.is_empty() {
            sqlx::query("DELETE FROM recommendations WHERE id = $1")
                .bind(record.as_uuid())
                .execute(&mut *self.tx)
                .await?;
            return Ok(());
        }

        let columns = SlotSet::from_entries(remaining.to_vec()).as_columns();
        let [(first_id, first_note), (second_id, second_note), (third_id, third_note)] = columns;
        sqlx::query(
            "UPDATE recommendations SET \
             first_title_id = $2, first_note = $3, \
             second_title_id = $4, second_note = $5, \
             third_title_id = $6, third_note = $7, \
             updated_at = now() \
             WHERE id = $1",
        )
        .bind(record.as_uuid())
        .bind(first_id)
        .bind(first_note)
        .bind(second_id)
        .bind(second_note)
        .bind(third_id)
        .bind(third_note)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
