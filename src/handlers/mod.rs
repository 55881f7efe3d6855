pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod provider;
pub mod search;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::errors::AppError;
use crate::models::{Account, Role};
use crate::state::AppState;

/// Header carrying the username asserted by the upstream identity provider.
pub const ACTING_USER_HEADER: &str = "x-acting-user";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Catalog
        .route("/api/categories", get(catalog::categories))
        .route("/api/services", get(catalog::services))
        .route(
            "/api/categories/:category/services",
            get(catalog::category_services),
        )
        .route(
            "/api/categories/:category/providers",
            get(catalog::category_providers),
        )
        .route("/api/testimonials", get(catalog::testimonials))
        .route("/api/search", post(search::search))
        // Customers and applicants
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/registrations", post(bookings::submit_registration))
        // Providers
        .route("/api/provider/bookings", get(provider::get_bookings))
        .route(
            "/api/provider/bookings/:id/accept",
            post(provider::accept_booking),
        )
        .route(
            "/api/provider/bookings/:id/complete",
            post(provider::complete_booking),
        )
        .route("/api/provider/stats", get(provider::get_stats))
        // Admin
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/assign",
            post(admin::assign_booking),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(admin::cancel_booking),
        )
        .route("/api/admin/registrations", get(admin::get_registrations))
        .route(
            "/api/admin/users",
            get(admin::get_users).post(admin::add_user),
        )
        .route("/api/admin/users/:username", delete(admin::delete_user))
        .route("/api/admin/stats", get(admin::get_stats))
        .route("/api/admin/refresh", post(admin::refresh))
        .with_state(state)
}

/// Resolve the `X-Acting-User` header against the account list.
async fn acting_user(state: &AppState, headers: &HeaderMap) -> Result<Account, AppError> {
    let username = headers
        .get(ACTING_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthorized)?;

    match state.workflow.account(username).await {
        Some(account) => Ok(account),
        None => {
            tracing::warn!(username, "request from unknown account");
            Err(AppError::Unauthorized)
        }
    }
}

/// Acting user who may work bookings: providers and admins.
async fn acting_provider(state: &AppState, headers: &HeaderMap) -> Result<Account, AppError> {
    let account = acting_user(state, headers).await?;
    if account.role == Role::User {
        return Err(AppError::Forbidden("provider account required".into()));
    }
    Ok(account)
}

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() {
        return Ok(());
    }

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Bearer gate (when configured) plus an acting account with the admin role.
async fn acting_admin(state: &AppState, headers: &HeaderMap) -> Result<Account, AppError> {
    check_auth(headers, &state.config.admin_token)?;
    let account = acting_user(state, headers).await?;
    if !account.is_admin() {
        return Err(AppError::Forbidden("admin account required".into()));
    }
    Ok(account)
}
