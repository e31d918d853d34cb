use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::{RecommendationRecord, RecordId, SlotEntry, SlotSet, TitleId, UserId},
    services::store::{SlotStore, SlotUnitOfWork},
};

type RecordKey = (UserId, TitleId);
type RecordMap = Arc<RwLock<HashMap<RecordKey, RecommendationRecord>>>;
type LockRegistry = Arc<Mutex<HashMap<RecordKey, Arc<Mutex<()>>>>>;

/// In-memory slot store backing tests and local development.
///
/// Records live in a shared map guarded by an `RwLock`; each `(owner,
/// target)` key additionally has its own mutex in a lock registry, acquired
/// by a unit of work for the duration of a read-modify-write cycle. Writes
/// are staged inside the unit of work and only reach the shared map on
/// commit, so an abandoned unit of work leaves no trace. Registry entries
/// are retained for the lifetime of the process.
#[derive(Clone, Default)]
pub struct MemorySlotStore {
    records: RecordMap,
    locks: LockRegistry,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn begin(&self) -> AppResult<Box<dyn SlotUnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork {
            records: Arc::clone(&self.records),
            locks: Arc::clone(&self.locks),
            guard: None,
            key: None,
            staged: None,
        }))
    }

    async fn find(
        &self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(owner.clone(), target.clone())).cloned())
    }

    async fn list_for_target(&self, target: &TitleId) -> AppResult<Vec<RecommendationRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|record| record.target() == target)
            .cloned()
            .collect())
    }
}

enum Staged {
    Upsert(RecommendationRecord),
    Delete(RecordKey),
}

struct MemoryUnitOfWork {
    records: RecordMap,
    locks: LockRegistry,
    guard: Option<OwnedMutexGuard<()>>,
    key: Option<RecordKey>,
    staged: Option<Staged>,
}

impl MemoryUnitOfWork {
    async fn acquire_key_lock(&mut self, key: &RecordKey) {
        if self.guard.is_some() {
            return;
        }
        let key_lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        self.guard = Some(key_lock.lock_owned().await);
        self.key = Some(key.clone());
    }

    /// The record as this unit of work currently sees it: staged state if
    /// any, otherwise the committed state under the locked key
    async fn current_record(&self, id: RecordId) -> AppResult<RecommendationRecord> {
        if let Some(Staged::Upsert(record)) = &self.staged {
            if record.id() == id {
                return Ok(record.clone());
            }
        }
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AppError::Internal("no record locked in unit of work".to_string()))?;
        let records = self.records.read().await;
        records
            .get(key)
            .filter(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("recommendation record {}", id)))
    }
}

#[async_trait]
impl SlotUnitOfWork for MemoryUnitOfWork {
    async fn lock(
        &mut self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>> {
        let key = (owner.clone(), target.clone());
        self.acquire_key_lock(&key).await;
        let records = self.records.read().await;
        Ok(records.get(&key).cloned())
    }

    async fn create_with_first_slot(
        &mut self,
        owner: &UserId,
        target: &TitleId,
        entry: &SlotEntry,
    ) -> AppResult<RecommendationRecord> {
        let key = (owner.clone(), target.clone());
        self.acquire_key_lock(&key).await;

        if let Some(existing) = self.records.read().await.get(&key) {
            return Ok(existing.clone());
        }

        let mut slots = SlotSet::new();
        slots
            .insert(entry.clone())
            .map_err(|_| AppError::Internal("fresh slot set rejected first entry".to_string()))?;
        let now = Utc::now();
        let record = RecommendationRecord::new(
            RecordId::generate(),
            owner.clone(),
            target.clone(),
            slots,
            now,
            now,
        );
        self.staged = Some(Staged::Upsert(record.clone()));
        Ok(record)
    }

    async fn write_slot(
        &mut self,
        record: RecordId,
        index: usize,
        entry: &SlotEntry,
    ) -> AppResult<()> {
        let mut current = self.current_record(record).await?;
        current.slots_mut().set_at(index, entry.clone());
        current.touch(Utc::now());
        self.staged = Some(Staged::Upsert(current));
        Ok(())
    }

    async fn compact_and_persist(
        &mut self,
        record: RecordId,
        remaining: &[SlotEntry],
    ) -> AppResult<()> {
        if remaining.is_empty() {
            let key = self
                .key
                .clone()
                .ok_or_else(|| AppError::Internal("no record locked in unit of work".to_string()))?;
            self.staged = Some(Staged::Delete(key));
            return Ok(());
        }
        let mut current = self.current_record(record).await?;
        current.compact_to(remaining.to_vec());
        current.touch(Utc::now());
        self.staged = Some(Staged::Upsert(current));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> AppResult<()> {
        if let Some(staged) = self.staged.take() {
            let mut records = self.records.write().await;
            match staged {
                Staged::Upsert(record) => {
                    let key = (record.owner().clone(), record.target().clone());
                    records.insert(key, record);
                }
                Staged::Delete(key) => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }
}
