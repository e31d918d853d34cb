use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        RecommendPermission, RecommendationRecord, RecommendationView, SlotEntry, SlotInsertError,
        TitleId, UserId, SLOT_CAPACITY,
    },
    services::{
        catalog::TitleCatalog,
        library::LibraryOracle,
        store::{SlotStore, SlotUnitOfWork},
    },
};

const MAX_NOTE_LEN: usize = 280;

/// Curated "more like this" recommendations.
///
/// A user who has the target title in their library may attach up to
/// [`SLOT_CAPACITY`] recommended titles to it. Adds and removes run as one
/// unit of work against the slot store: an existing record is mutated under
/// an exclusive lock, a missing record is created through the store's atomic
/// create-or-merge with a verify-and-reconcile step for the creation race.
/// Reads never take locks.
pub struct RecommendationService {
    store: Arc<dyn SlotStore>,
    library: Arc<dyn LibraryOracle>,
    catalog: Arc<dyn TitleCatalog>,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn SlotStore>,
        library: Arc<dyn LibraryOracle>,
        catalog: Arc<dyn TitleCatalog>,
    ) -> Self {
        Self {
            store,
            library,
            catalog,
        }
    }

    /// Attaches `recommended` to the caller's record for `target`.
    ///
    /// Fails with `PermissionDenied` when the caller does not hold `target`
    /// in their library, `RecommendedTitleNotFound` when the catalog does
    /// not know `recommended`, `DuplicateRecommendation` when it already
    /// occupies a slot, and `CapacityExceeded` when all slots are taken.
    /// Concurrent adds on the same key serialize on the record lock; the
    /// creation race on a fresh key is reconciled inside the unit of work.
    pub async fn add_recommendation(
        &self,
        user: &UserId,
        target: &TitleId,
        recommended: &TitleId,
        note: Option<String>,
    ) -> AppResult<RecommendationRecord> {
        let note = normalize_note(note)?;
        self.ensure_owner(user, target).await?;
        self.ensure_in_catalog(recommended).await?;

        let entry = SlotEntry::new(recommended.clone(), note);
        let mut uow = self.store.begin().await?;

        let record = match uow.lock(user, target).await? {
            Some(record) => self.fill_free_slot(uow.as_mut(), record, entry).await?,
            None => {
                let record = uow.create_with_first_slot(user, target, &entry).await?;
                let won_creation = record
                    .slots()
                    .first()
                    .map(|first| first.title == entry.title)
                    .unwrap_or(false);
                if won_creation {
                    record
                } else {
                    // Lost the creation race: the record now exists and is
                    // locked, so reconcile through the ordinary slot path.
                    self.fill_free_slot(uow.as_mut(), record, entry).await?
                }
            }
        };

        uow.commit().await?;

        tracing::info!(
            user = %user,
            target = %target,
            recommended = %recommended,
            used = record.slots().len(),
            "Recommendation added"
        );

        Ok(record)
    }

    /// Detaches `recommended` from the caller's record for `target`,
    /// compacting the remaining slots and deleting the record when the last
    /// slot empties. Fails with `NotFound` when no record exists or the
    /// title occupies no slot.
    pub async fn remove_recommendation(
        &self,
        user: &UserId,
        target: &TitleId,
        recommended: &TitleId,
    ) -> AppResult<()> {
        let mut uow = self.store.begin().await?;

        let record = uow.lock(user, target).await?.ok_or_else(|| {
            AppError::NotFound(format!("no recommendations by {} for {}", user, target))
        })?;

        let remaining = record.slots().without(recommended);
        if remaining.len() == record.slots().len() {
            return Err(AppError::NotFound(format!(
                "{} is not recommended for {}",
                recommended, target
            )));
        }

        let deleted = remaining.is_empty();
        uow.compact_and_persist(record.id(), &remaining).await?;
        uow.commit().await?;

        tracing::info!(
            user = %user,
            target = %target,
            recommended = %recommended,
            deleted,
            "Recommendation removed"
        );

        Ok(())
    }

    /// Every occupied slot across all users' records for `target`, enriched
    /// with catalog display data where available. Order across owners is
    /// not guaranteed.
    pub async fn list_for_target(&self, target: &TitleId) -> AppResult<Vec<RecommendationView>> {
        let records = self.store.list_for_target(target).await?;

        let mut views = Vec::new();
        for record in records {
            for entry in record.slots().occupied() {
                let summary = match self.catalog.get(&entry.title).await {
                    Ok(summary) => summary,
                    Err(error) => {
                        tracing::warn!(
                            error = %error,
                            title = %entry.title,
                            "Catalog lookup failed, returning view without summary"
                        );
                        None
                    }
                };
                views.push(RecommendationView {
                    target_title_id: target.clone(),
                    recommended_by: record.owner().clone(),
                    title_id: entry.title.clone(),
                    note: entry.note.clone(),
                    summary,
                });
            }
        }

        Ok(views)
    }

    /// Occupied slot count for `(user, target)`, 0 when no record exists
    pub async fn count_for_user(&self, user: &UserId, target: &TitleId) -> AppResult<usize> {
        let record = self.store.find(user, target).await?;
        Ok(record.map(|record| record.slots().len()).unwrap_or(0))
    }

    /// Combines the ownership check with the current slot count
    pub async fn can_recommend(
        &self,
        user: &UserId,
        target: &TitleId,
    ) -> AppResult<RecommendPermission> {
        let owns = self.check_ownership(user, target).await;
        let used = self.count_for_user(user, target).await?;
        Ok(RecommendPermission {
            allowed: owns && used < SLOT_CAPACITY,
            used,
            max: SLOT_CAPACITY,
        })
    }

    /// Fail-closed ownership check: an unreachable oracle counts as "not
    /// owned", never as implicit permission
    async fn check_ownership(&self, user: &UserId, target: &TitleId) -> bool {
        match self.library.owns_title(user, target).await {
            Ok(owns) => owns,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    user = %user,
                    target = %target,
                    "Ownership check failed, treating as not owned"
                );
                false
            }
        }
    }

    async fn ensure_owner(&self, user: &UserId, target: &TitleId) -> AppResult<()> {
        if self.check_ownership(user, target).await {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "{} does not have {} in their library",
                user, target
            )))
        }
    }

    /// Fail-closed existence check, mirroring the ownership rule
    async fn ensure_in_catalog(&self, title: &TitleId) -> AppResult<()> {
        let exists = match self.catalog.exists(title).await {
            Ok(exists) => exists,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    title = %title,
                    "Catalog existence check failed, treating as unknown"
                );
                false
            }
        };
        if exists {
            Ok(())
        } else {
            Err(AppError::RecommendedTitleNotFound(title.to_string()))
        }
    }

    /// Duplicate and capacity enforcement plus the first-free-slot write,
    /// on a record the unit of work holds locked
    async fn fill_free_slot(
        &self,
        uow: &mut dyn SlotUnitOfWork,
        mut record: RecommendationRecord,
        entry: SlotEntry,
    ) -> AppResult<RecommendationRecord> {
        let index = match record.slots_mut().insert(entry.clone()) {
            Ok(index) => index,
            Err(SlotInsertError::Duplicate) => {
                return Err(AppError::DuplicateRecommendation(entry.title.to_string()))
            }
            Err(SlotInsertError::Full) => return Err(AppError::CapacityExceeded),
        };
        uow.write_slot(record.id(), index, &entry).await?;
        Ok(record)
    }
}

fn normalize_note(note: Option<String>) -> AppResult<Option<String>> {
    match note {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.len() > MAX_NOTE_LEN {
                return Err(AppError::Validation(format!(
                    "note exceeds {} characters",
                    MAX_NOTE_LEN
                )));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}
