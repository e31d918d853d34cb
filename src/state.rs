use std::sync::Arc;

use crate::services::RecommendationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(recommendations: Arc<RecommendationService>) -> Self {
        Self { recommendations }
    }
}
