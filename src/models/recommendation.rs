use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{SlotSet, TitleId, UserId};

/// Surrogate identifier for a recommendation record.
///
/// Stores lock and address records by this id; the natural key stays
/// `(owner, target)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One occupied recommendation slot: the recommended title plus an optional
/// free-text note from the recommending user
#[derive(Debug, Clone, PartialEq)]
pub struct SlotEntry {
    pub title: TitleId,
    pub note: Option<String>,
}

impl SlotEntry {
    pub fn new(title: TitleId, note: Option<String>) -> Self {
        Self { title, note }
    }
}

/// The per-(owner, target) recommendation record
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRecord {
    id: RecordId,
    owner: UserId,
    target: TitleId,
    slots: SlotSet,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecommendationRecord {
    pub fn new(
        id: RecordId,
        owner: UserId,
        target: TitleId,
        slots: SlotSet,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            target,
            slots,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn target(&self) -> &TitleId {
        &self.target
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    /// Replaces the slot contents with `remaining`, left-packed from slot 0
    pub fn compact_to(&mut self, remaining: Vec<SlotEntry>) {
        self.slots = SlotSet::from_entries(remaining);
    }
}
