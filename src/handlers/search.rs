use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::services::search::{self, SearchOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

// POST /api/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<SearchOutcome> {
    Json(search::resolve(&state.catalog, state.recommender.as_ref(), &req.query).await)
}
