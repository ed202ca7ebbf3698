use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use finetrack_db::models::OfficerRow;
use finetrack_types::api::{Claims, LicenseSearchResponse, OfficerProfile};
use finetrack_types::models::Role;

use crate::error::ApiError;
use crate::middleware::require_enforcement;
use crate::parse_uuid;
use crate::state::{with_db, AppState};
use crate::users::profile_from_row;
use crate::violations::detail_from_row;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    let row = with_db(&state, move |db| db.get_officer_by_id(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("officer not found".into()))?;
    Ok(Json(officer_from_row(row)))
}

/// Violations filed by the calling officer.
pub async fn my_violations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    let rows = with_db(&state, move |db| db.list_violations_for_officer(&id)).await?;
    let violations: Vec<_> = rows.into_iter().map(detail_from_row).collect();
    Ok(Json(violations))
}

/// GET /officers/search-user/{license_number} — roadside lookup before
/// filing: is this license registered, and what is already on record
/// against it (pre-registration filings included)?
pub async fn search_license(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(license_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_enforcement(&claims)?;

    let license = license_number.clone();
    let (user, rows) = with_db(&state, move |db| {
        let user = db.get_user_by_license(&license)?;
        let rows = db.list_violations_for_license(&license)?;
        Ok((user, rows))
    })
    .await?;

    let previous_violations: Vec<_> = rows.into_iter().map(detail_from_row).collect();
    Ok(Json(LicenseSearchResponse {
        license_number,
        registered: user.is_some(),
        user: user.map(profile_from_row),
        previous_violations,
    }))
}

pub(crate) fn officer_from_row(row: OfficerRow) -> OfficerProfile {
    OfficerProfile {
        id: parse_uuid(&row.id, "officer id"),
        name: row.name,
        email: row.email,
        phone_number: row.phone_number,
        role: Role::parse(&row.role).unwrap_or(Role::Officer),
        created_at: row.created_at,
    }
}
