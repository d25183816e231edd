use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::AnalysisError;
use crate::handlers::AnalyzeHandler;
use crate::models::AnalyzeRequest;

pub struct AppState {
    pub analyzer: Arc<AnalyzeHandler>,
}

pub fn create_router(analyzer: Arc<AnalyzeHandler>) -> Router {
    let state = Arc::new(AppState { analyzer });

    // Browser clients call this from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/analyze", post(analyze_label).options(preflight))
        .layer(cors)
        .with_state(state)
}

/// POST /analyze: run the label-analysis pipeline on the submitted image.
///
/// The body is parsed leniently: anything that is not JSON with a
/// non-empty `imageBase64` string is the same validation failure.
async fn analyze_label(State(state): State<Arc<AppState>>, body: String) -> Response {
    let request: AnalyzeRequest = serde_json::from_str(&body).unwrap_or_default();

    let image_base64 = match request.image_base64 {
        Some(image) if !image.is_empty() => image,
        _ => {
            let err = AnalysisError::MissingImage;
            err.log();
            return err.into_response();
        }
    };

    log::info!("🔍 Analyze request received ({} base64 chars)", image_base64.len());

    match state.analyzer.analyze(&image_base64).await {
        Ok(result) => {
            log::info!("✅ Analysis complete: status={}", result.status);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(err) => {
            err.log();
            err.into_response()
        }
    }
}

/// Bare OPTIONS short-circuit; real preflights are answered by the CORS
/// layer before reaching the route.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn root_handler() -> &'static str {
    "Ingredient Label Analyzer - POST /analyze with {\"imageBase64\": \"...\"}"
}

async fn health_check() -> &'static str {
    "OK"
}
