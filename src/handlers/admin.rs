use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::acting_admin;
use crate::errors::AppError;
use crate::models::{Account, Booking, Registration};
use crate::services::workflow::AdminStats;
use crate::state::AppState;

// GET /api/admin/bookings
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    acting_admin(&state, &headers).await?;
    Ok(Json(state.workflow.bookings_for_admin().await))
}

// POST /api/admin/bookings/:id/assign
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub provider_username: String,
}

pub async fn assign_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<Booking>, AppError> {
    let admin = acting_admin(&state, &headers).await?;
    let booking = state
        .workflow
        .assign_booking(&id, req.provider_username.trim(), &admin)
        .await?;
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let admin = acting_admin(&state, &headers).await?;
    Ok(Json(state.workflow.cancel_booking(&id, &admin).await?))
}

// GET /api/admin/registrations
pub async fn get_registrations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Registration>>, AppError> {
    acting_admin(&state, &headers).await?;
    Ok(Json(state.workflow.registrations().await))
}

// GET /api/admin/users
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Account>>, AppError> {
    acting_admin(&state, &headers).await?;
    Ok(Json(state.workflow.users().await))
}

// POST /api/admin/users
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(account): Json<Account>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let admin = acting_admin(&state, &headers).await?;
    let stored = state.workflow.add_user(&admin, account).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// DELETE /api/admin/users/:username
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    let admin = acting_admin(&state, &headers).await?;
    state.workflow.delete_user(&admin, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AdminStats>, AppError> {
    acting_admin(&state, &headers).await?;
    Ok(Json(state.workflow.admin_stats().await))
}

// POST /api/admin/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AdminStats>, AppError> {
    acting_admin(&state, &headers).await?;
    state.workflow.refresh().await?;
    Ok(Json(state.workflow.admin_stats().await))
}
