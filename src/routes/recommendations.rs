use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{
        RecommendPermission, RecommendationRecord, RecommendationView, TitleId, SLOT_CAPACITY,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateRecommendationRequest {
    pub recommended_title_id: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationRecordResponse {
    pub target_title_id: TitleId,
    pub recommended_title_ids: Vec<TitleId>,
    pub used: usize,
    pub max: usize,
}

impl From<&RecommendationRecord> for RecommendationRecordResponse {
    fn from(record: &RecommendationRecord) -> Self {
        Self {
            target_title_id: record.target().clone(),
            recommended_title_ids: record
                .slots()
                .occupied()
                .map(|entry| entry.title.clone())
                .collect(),
            used: record.slots().len(),
            max: SLOT_CAPACITY,
        }
    }
}

/// All users' recommendations for a title
pub async fn list(
    State(state): State<AppState>,
    Path(title_id): Path<String>,
) -> AppResult<Json<Vec<RecommendationView>>> {
    let target = TitleId::new(&title_id)?;
    let views = state.recommendations.list_for_target(&target).await?;
    Ok(Json(views))
}

/// Attach a recommendation to a title the caller has in their library
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(title_id): Path<String>,
    Json(request): Json<CreateRecommendationRequest>,
) -> AppResult<(StatusCode, Json<RecommendationRecordResponse>)> {
    let target = TitleId::new(&title_id)?;
    let recommended = TitleId::new(&request.recommended_title_id)?;

    let record = state
        .recommendations
        .add_recommendation(&user, &target, &recommended, request.note)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecommendationRecordResponse::from(&record)),
    ))
}

/// Detach one of the caller's recommendations from a title
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((title_id, recommended_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let target = TitleId::new(&title_id)?;
    let recommended = TitleId::new(&recommended_id)?;

    state
        .recommendations
        .remove_recommendation(&user, &target, &recommended)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Whether the caller may recommend on this title, and how many slots
/// they have used
pub async fn permission(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(title_id): Path<String>,
) -> AppResult<Json<RecommendPermission>> {
    let target = TitleId::new(&title_id)?;
    let permission = state.recommendations.can_recommend(&user, &target).await?;
    Ok(Json(permission))
}
