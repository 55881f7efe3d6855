use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{Category, ProviderProfile, Service, Testimonial};
use crate::services::search::{self, SearchOutcome};
use crate::state::AppState;

fn parse_category(raw: &str) -> Result<Category, AppError> {
    Category::parse(raw).ok_or_else(|| AppError::NotFound(format!("category {raw}")))
}

// GET /api/categories
pub async fn categories(State(state): State<Arc<AppState>>) -> Json<&'static [Category]> {
    Json(state.catalog.categories())
}

// GET /api/services
pub async fn services(State(state): State<Arc<AppState>>) -> Json<Vec<Service>> {
    Json(state.catalog.services.clone())
}

// GET /api/categories/:category/services
pub async fn category_services(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<SearchOutcome>, AppError> {
    let category = parse_category(&category)?;
    Ok(Json(search::browse_category(&state.catalog, category)))
}

// GET /api/categories/:category/providers
pub async fn category_providers(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProviderProfile>>, AppError> {
    let category = parse_category(&category)?;
    Ok(Json(state.catalog.providers_in(category)))
}

// GET /api/testimonials
pub async fn testimonials(State(state): State<Arc<AppState>>) -> Json<Vec<Testimonial>> {
    Json(state.catalog.testimonials.clone())
}
