use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

mod recommendation;
mod slot_set;

pub use recommendation::{RecommendationRecord, RecordId, SlotEntry};
pub use slot_set::{SlotInsertError, SlotSet, SLOT_CAPACITY};

const MAX_ID_LEN: usize = 255;

fn validated_id(raw: &str, what: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", what)));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(AppError::Validation(format!(
            "{} exceeds {} characters",
            what, MAX_ID_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Identifier of a user, validated non-empty at construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        Ok(Self(validated_id(raw.as_ref(), "user id")?))
    }

    /// Wraps a value that already passed validation on the way into a store
    pub(crate) fn unchecked(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog title, validated non-empty at construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TitleId(String);

impl TitleId {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        Ok(Self(validated_id(raw.as_ref(), "title id")?))
    }

    /// Wraps a value that already passed validation on the way into a store
    pub(crate) fn unchecked(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TitleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TitleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        TitleId::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    Movie,
    Series,
}

impl TitleType {
    /// Parses the catalog's type string; unknown values fall back to movie
    pub fn parse(raw: &str) -> Self {
        match raw {
            "series" | "tv_series" => TitleType::Series,
            _ => TitleType::Movie,
        }
    }
}

/// Display data for a title, supplied by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleSummary {
    pub id: TitleId,
    pub title: String,
    pub title_type: TitleType,
    pub release_year: Option<i32>,
}

/// One occupied slot as seen by users browsing the target title
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationView {
    pub target_title_id: TitleId,
    pub recommended_by: UserId,
    pub title_id: TitleId,
    pub note: Option<String>,
    pub summary: Option<TitleSummary>,
}

/// Whether a user may add another recommendation to a target title
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RecommendPermission {
    pub allowed: bool,
    pub used: usize,
    pub max: usize,
}
