use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Request-level failure taxonomy. Every failure a caller can observe is
/// one of these variants; each maps to its own status code and log
/// verbosity instead of collapsing into a single catch-all.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The caller sent no usable image payload.
    #[error("No image provided")]
    MissingImage,

    /// The model provider call failed (auth, rate limit, network, empty
    /// choice list). Carries the raw cause for server logs.
    #[error("analysis request failed: {0}")]
    Upstream(anyhow::Error),

    /// The analysis model returned content that does not parse as the
    /// expected JSON shape. Distinct from provider failures so it can be
    /// spotted in logs when a prompt or model change regresses.
    #[error("model returned malformed analysis: {0}")]
    Shape(serde_json::Error),

    /// The cache store misbehaved. Lookups degrade to a miss and stores
    /// are best-effort, so this normally never fails a request; the
    /// variant keeps cache faults visible at their own verbosity.
    #[error("cache store error: {0}")]
    Cache(anyhow::Error),
}

impl AnalysisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::MissingImage => StatusCode::BAD_REQUEST,
            AnalysisError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Shape(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Write the failure to the server log at the verbosity the variant
    /// deserves. Validation misses are caller mistakes, not server faults.
    pub fn log(&self) {
        match self {
            AnalysisError::MissingImage => log::debug!("⏭️ Rejected request: {}", self),
            AnalysisError::Upstream(cause) => log::error!("❌ Upstream failure: {}", cause),
            AnalysisError::Shape(cause) => log::error!("❌ Malformed model output: {}", cause),
            AnalysisError::Cache(cause) => log::warn!("⚠️ Cache store error: {}", cause),
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
