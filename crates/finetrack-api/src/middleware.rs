use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use finetrack_types::api::Claims;
use finetrack_types::models::Role;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the bearer token, stashing verified claims in
/// request extensions. The secret comes from injected state; there is
/// no fallback, so verification fails closed when it was never set.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("access token required".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("access token required".into()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Auth("invalid or expired token".into()))?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Admin-only gate. Role was normalized at token issuance, so a single
/// enum comparison suffices.
pub fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin privileges required".into()))
    }
}

/// Officer-or-admin gate for enforcement operations (filing violations,
/// license lookups).
pub fn require_enforcement(claims: &Claims) -> Result<(), ApiError> {
    match claims.role {
        Role::Officer | Role::Admin => Ok(()),
        Role::User => Err(ApiError::Forbidden("officer privileges required".into())),
    }
}
