pub mod admin;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod officers;
pub mod payments;
pub mod state;
pub mod users;
pub mod violations;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{middleware as axum_middleware, Json, Router};

use crate::middleware::require_auth;
use crate::state::AppState;

/// Ids are stored as UUID strings; a row that fails to parse is logged
/// and mapped to the nil id instead of failing the whole read.
pub(crate) fn parse_uuid(s: &str, what: &str) -> uuid::Uuid {
    s.parse().unwrap_or_else(|e| {
        tracing::warn!("corrupt {} '{}': {}", what, s, e);
        uuid::Uuid::default()
    })
}

/// Receipt uploads are capped at 5 MB; the body limit leaves headroom
/// for multipart framing.
const BODY_LIMIT: usize = 6 * 1024 * 1024;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assemble the full route table. The server binary adds CORS, tracing
/// and static receipt serving on top.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route(
            "/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users/violations", get(users::my_violations))
        .route("/officers/profile", get(officers::get_profile))
        .route("/officers/violations", get(officers::my_violations))
        .route(
            "/officers/search-user/{license_number}",
            get(officers::search_license),
        )
        .route(
            "/violations",
            post(violations::file_violation).get(violations::list_violations),
        )
        .route("/violations/{id}", get(violations::get_violation))
        .route("/violations/{id}/status", put(violations::update_status))
        .route(
            "/payments",
            post(payments::submit_payment).get(payments::list_payments),
        )
        .route(
            "/payments/violation/{violation_id}",
            get(payments::for_violation),
        )
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/admin/users/{id}/violations", get(admin::user_violations))
        .route(
            "/admin/officers",
            get(admin::list_officers).post(admin::create_officer),
        )
        .route("/admin/officers/{id}", delete(admin::delete_officer))
        .route("/admin/payments/{id}/confirm", put(admin::confirm_payment))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
