use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use super::acting_provider;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::workflow::{ProviderBooking, ProviderStats};
use crate::state::AppState;

// GET /api/provider/bookings
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProviderBooking>>, AppError> {
    let provider = acting_provider(&state, &headers).await?;
    Ok(Json(state.workflow.bookings_for_provider(&provider).await))
}

// POST /api/provider/bookings/:id/accept
pub async fn accept_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let provider = acting_provider(&state, &headers).await?;
    Ok(Json(state.workflow.accept_booking(&id, &provider).await?))
}

// POST /api/provider/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let provider = acting_provider(&state, &headers).await?;
    Ok(Json(state.workflow.complete_booking(&id, &provider).await?))
}

// GET /api/provider/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProviderStats>, AppError> {
    let provider = acting_provider(&state, &headers).await?;
    Ok(Json(state.workflow.provider_stats(&provider).await))
}
