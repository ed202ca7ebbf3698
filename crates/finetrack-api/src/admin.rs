use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;

use finetrack_types::api::{
    AdminUpdateUserRequest, Claims, CreateOfficerRequest, CreateOfficerResponse, DashboardStats,
};
use finetrack_types::models::Role;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::state::{with_db, AppState};
use crate::users::profile_from_row;
use crate::violations::detail_from_row;
use crate::officers::officer_from_row;

/// GET /admin/dashboard — aggregate counts, read sequentially on one
/// connection rather than fanned out.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let counts = with_db(&state, |db| db.dashboard_counts()).await?;
    Ok(Json(DashboardStats {
        total_users: counts.total_users,
        total_officers: counts.total_officers,
        total_violations: counts.total_violations,
        total_payments: counts.total_payments,
        pending_violations: counts.pending_violations,
        paid_violations: counts.paid_violations,
    }))
}

// -- Users --

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let rows = with_db(&state, |db| db.list_users()).await?;
    let users: Vec<_> = rows.into_iter().map(profile_from_row).collect();
    Ok(Json(users))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::Validation("name and email are required".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is malformed".into()));
    }
    if req.license_number.trim().is_empty() {
        return Err(ApiError::Validation("license_number is required".into()));
    }

    let uid = id.to_string();
    let updated = with_db(&state, move |db| {
        db.admin_update_user(
            &uid,
            &req.name,
            &req.email,
            &req.phone_number,
            &req.license_number,
            &req.date_of_birth,
            &req.address,
        )
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("user not found".into()));
    }
    Ok(Json(serde_json::json!({ "message": "user updated" })))
}

/// DELETE /admin/users/{id} — explicit admin action; the user's
/// violations are kept as historical record, not cascaded.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let uid = id.to_string();
    let deleted = with_db(&state, move |db| db.delete_user(&uid)).await?;
    if !deleted {
        return Err(ApiError::NotFound("user not found".into()));
    }
    info!("admin {} deleted user {}", claims.sub, id);
    Ok(Json(serde_json::json!({ "message": "user deleted" })))
}

pub async fn user_violations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let uid = id.to_string();
    let rows = with_db(&state, move |db| db.list_violations_for_user(&uid)).await?;
    let violations: Vec<_> = rows.into_iter().map(detail_from_row).collect();
    Ok(Json(violations))
}

// -- Officers --

pub async fn list_officers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let rows = with_db(&state, |db| db.list_officers()).await?;
    let officers: Vec<_> = rows.into_iter().map(officer_from_row).collect();
    Ok(Json(officers))
}

pub async fn create_officer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateOfficerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::Validation("name and email are required".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is malformed".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    // Officers are either rank-and-file or elevated; a 'user' role tag
    // makes no sense here.
    if req.role == Role::User {
        return Err(ApiError::Validation(
            "officer role must be 'officer' or 'admin'".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let officer_id = Uuid::new_v4();
    let oid = officer_id.to_string();
    let role = req.role.as_str();
    with_db(&state, move |db| {
        db.create_officer(&oid, &req.name, &req.email, &req.phone_number, role, &password_hash)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOfficerResponse { officer_id }),
    ))
}

pub async fn delete_officer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let oid = id.to_string();
    let deleted = with_db(&state, move |db| db.delete_officer(&oid)).await?;
    if !deleted {
        return Err(ApiError::NotFound("officer not found".into()));
    }
    info!("admin {} deleted officer {}", claims.sub, id);
    Ok(Json(serde_json::json!({ "message": "officer deleted" })))
}

// -- Payments --

/// PUT /admin/payments/{id}/confirm — the sole intended path by which a
/// violation becomes Paid. Payment confirmation and violation
/// settlement happen in one storage transaction.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let pid = id.to_string();
    let violation_id = with_db(&state, move |db| db.confirm_payment(&pid)).await?;
    info!("payment {} confirmed, violation {} settled", id, violation_id);
    Ok(Json(serde_json::json!({
        "message": "payment confirmed",
        "violation_id": violation_id,
    })))
}
