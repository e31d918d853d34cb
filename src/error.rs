use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Recommended title not found: {0}")]
    RecommendedTitleNotFound(String),

    #[error("Already recommended: {0}")]
    DuplicateRecommendation(String),

    #[error("All recommendation slots are occupied")]
    CapacityExceeded,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error kind, independent of the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::RecommendedTitleNotFound(_) => "recommended_title_not_found",
            AppError::DuplicateRecommendation(_) => "duplicate_recommendation",
            AppError::CapacityExceeded => "capacity_exceeded",
            AppError::NotFound(_) => "not_found",
            AppError::Store(_) => "store_unavailable",
            AppError::Cache(_) => "cache_unavailable",
            AppError::HttpClient(_) | AppError::ExternalApi(_) => "external_api_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::RecommendedTitleNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateRecommendation(_) | AppError::CapacityExceeded => {
                StatusCode::CONFLICT
            }
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cache(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::HttpClient(_) | AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "code": self.kind(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
