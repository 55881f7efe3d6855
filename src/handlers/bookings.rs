use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Booking, NewBooking, NewRegistration, Registration};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.workflow.create_booking(&state.catalog, req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// POST /api/registrations
pub async fn submit_registration(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewRegistration>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let reg = state.workflow.submit_registration(req).await?;
    Ok((StatusCode::CREATED, Json(reg)))
}
