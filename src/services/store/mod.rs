use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{RecommendationRecord, RecordId, SlotEntry, TitleId, UserId},
};

pub mod memory;

pub use memory::MemorySlotStore;

/// Persistence seam for recommendation slot records.
///
/// Mutations go through a [`SlotUnitOfWork`]; `find` and `list_for_target`
/// are lock-free reads that never block writers.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Opens a unit of work for one add or remove operation
    async fn begin(&self) -> AppResult<Box<dyn SlotUnitOfWork>>;

    async fn find(
        &self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>>;

    /// All users' records for a target title, in no guaranteed order
    async fn list_for_target(&self, target: &TitleId) -> AppResult<Vec<RecommendationRecord>>;
}

/// One transactional read-modify-write cycle against the slot store.
///
/// Dropping a unit of work without calling `commit` rolls back every
/// staged write; no partial mutation is ever observable.
#[async_trait]
pub trait SlotUnitOfWork: Send {
    /// Acquires an exclusive lock on the record for `(owner, target)` and
    /// returns its current state, or `None` when no record exists yet.
    /// The lock is held until commit or drop.
    async fn lock(
        &mut self,
        owner: &UserId,
        target: &TitleId,
    ) -> AppResult<Option<RecommendationRecord>>;

    /// Atomic create-or-merge: creates the record with `entry` in slot 0,
    /// or returns the existing record when a concurrent caller created it
    /// first. The returned record is locked either way.
    async fn create_with_first_slot(
        &mut self,
        owner: &UserId,
        target: &TitleId,
        entry: &SlotEntry,
    ) -> AppResult<RecommendationRecord>;

    /// Writes one slot of a record the unit of work holds locked
    async fn write_slot(&mut self, record: RecordId, index: usize, entry: &SlotEntry)
        -> AppResult<()>;

    /// Rewrites the record's slots as `remaining` starting at slot 0 and
    /// clears the rest, or deletes the record when `remaining` is empty
    async fn compact_and_persist(
        &mut self,
        record: RecordId,
        remaining: &[SlotEntry],
    ) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
