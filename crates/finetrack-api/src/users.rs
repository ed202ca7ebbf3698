use axum::{extract::State, response::IntoResponse, Extension, Json};

use finetrack_db::models::UserRow;
use finetrack_types::api::{Claims, UpdateProfileRequest, UserProfile};

use crate::error::ApiError;
use crate::parse_uuid;
use crate::state::{with_db, AppState};
use crate::violations::detail_from_row;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    let row = with_db(&state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(profile_from_row(row)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }

    let id = claims.sub.to_string();
    let updated = with_db(&state, move |db| {
        db.update_user_profile(&id, &req.name, &req.phone_number, &req.address)
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("user not found".into()));
    }
    Ok(Json(serde_json::json!({ "message": "profile updated" })))
}

pub async fn my_violations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    let rows = with_db(&state, move |db| db.list_violations_for_user(&id)).await?;
    let violations: Vec<_> = rows.into_iter().map(detail_from_row).collect();
    Ok(Json(violations))
}

pub(crate) fn profile_from_row(row: UserRow) -> UserProfile {
    UserProfile {
        id: parse_uuid(&row.id, "user id"),
        name: row.name,
        email: row.email,
        phone_number: row.phone_number,
        license_number: row.license_number,
        address: row.address,
        date_of_birth: row.date_of_birth,
        created_at: row.created_at,
    }
}
