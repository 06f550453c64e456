use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use tradesignal_core::domain::{InstrumentRegistry, RecommendationSet};
use tradesignal_core::engine::{parse_asset_list, RecommendationEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

pub fn router(state: AppState, static_dir: &str) -> Router {
    // Unknown paths get the SPA entry point with a 200.
    let index = Path::new(static_dir).join("index.html");
    let frontend = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/recommendations", get(get_recommendations))
        .route("/api/assets", get(get_assets))
        .route("/health", get(health))
        .fallback_service(frontend)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// Repeated keys keep the last value.
async fn get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<RecommendationSet> {
    let timeframe = params.get("timeframe").map(String::as_str);
    let assets = params.get("assets").map(|raw| parse_asset_list(raw));
    let set = state
        .engine
        .get_recommendations(timeframe, assets.as_deref())
        .await;
    Json(set)
}

async fn get_assets(State(state): State<AppState>) -> Json<InstrumentRegistry> {
    Json(state.engine.registry().clone())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Local::now().to_rfc3339(),
    })
}
