use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::warn;
use uuid::Uuid;

use finetrack_db::models::ViolationDetailRow;
use finetrack_types::api::{
    Claims, FileViolationRequest, FileViolationResponse, PaymentSummary,
    UpdateViolationStatusRequest, ViolationDetail,
};
use finetrack_types::models::{ConfirmationStatus, IdentityKind, PaymentStatus};

use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::parse_uuid;
use crate::state::{with_db, AppState};

/// POST /violations — officers file against either a registered user
/// (by id) or an unregistered citizen (license number + name). Exactly
/// one of the two identifications must be supplied.
pub async fn file_violation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FileViolationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // officer_id points into the officers table; admins oversee but do
    // not file, citizens never do.
    if claims.kind != IdentityKind::Officer {
        return Err(ApiError::Forbidden(
            "only officers may file violations".into(),
        ));
    }

    if req.violation_type.trim().is_empty() {
        return Err(ApiError::Validation("violation_type is required".into()));
    }
    if !req.fine_amount.is_finite() || req.fine_amount <= 0.0 {
        return Err(ApiError::Validation(
            "fine_amount must be a positive number".into(),
        ));
    }

    let violation_id = Uuid::new_v4();
    let officer_id = claims.sub.to_string();
    let vid = violation_id.to_string();

    let has_license = req
        .license_number
        .as_deref()
        .is_some_and(|l| !l.trim().is_empty());

    if let Some(user_id) = req.user_id {
        let uid = user_id.to_string();
        with_db(&state, move |db| {
            if db.get_user_by_id(&uid)?.is_none() {
                return Err(finetrack_db::StoreError::NotFound(format!(
                    "user {uid} does not exist"
                )));
            }
            db.insert_violation(
                &vid,
                Some(&uid),
                &officer_id,
                &req.violation_type,
                &req.description,
                req.fine_amount,
                None,
                None,
            )
        })
        .await?;
    } else if has_license {
        let citizen_name = req
            .citizen_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ApiError::Validation(
                    "citizen_name is required when filing by license number".into(),
                )
            })?
            .to_string();
        with_db(&state, move |db| {
            db.insert_violation(
                &vid,
                None,
                &officer_id,
                &req.violation_type,
                &req.description,
                req.fine_amount,
                req.license_number.as_deref(),
                Some(&citizen_name),
            )
        })
        .await?;
    } else {
        return Err(ApiError::Validation(
            "either user_id or license_number is required".into(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(FileViolationResponse { violation_id }),
    ))
}

/// GET /violations — the full ledger, admin only.
pub async fn list_violations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let rows = with_db(&state, |db| db.list_violations()).await?;
    let violations: Vec<_> = rows.into_iter().map(detail_from_row).collect();
    Ok(Json(violations))
}

pub async fn get_violation(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vid = id.to_string();
    let row = with_db(&state, move |db| db.get_violation_detail(&vid))
        .await?
        .ok_or_else(|| ApiError::NotFound("violation not found".into()))?;
    Ok(Json(detail_from_row(row)))
}

/// PUT /violations/{id}/status — admin override of the settlement
/// state. The intended flow settles a violation through payment
/// confirmation only; this route exists for operational correction and
/// is deliberately admin-gated.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateViolationStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let vid = id.to_string();
    let status = req.payment_status.as_str();
    let updated =
        with_db(&state, move |db| db.set_violation_payment_status(&vid, status)).await?;
    if !updated {
        return Err(ApiError::NotFound("violation not found".into()));
    }
    Ok(Json(serde_json::json!({ "message": "violation status updated" })))
}

pub(crate) fn detail_from_row(row: ViolationDetailRow) -> ViolationDetail {
    let payment = match (row.payment_amount, row.payment_receipt) {
        (Some(amount), Some(receipt_file)) => Some(PaymentSummary {
            amount,
            receipt_file,
            status: row
                .payment_status_detail
                .as_deref()
                .and_then(ConfirmationStatus::parse)
                .unwrap_or(ConfirmationStatus::Pending),
            created_at: row.payment_date.unwrap_or_default(),
        }),
        _ => None,
    };

    ViolationDetail {
        id: parse_uuid(&row.id, "violation id"),
        user_id: row.user_id.as_deref().map(|s| parse_uuid(s, "user id")),
        officer_id: parse_uuid(&row.officer_id, "officer id"),
        officer_name: row.officer_name,
        violator_name: row.violator_name,
        license_number: row.license_number,
        user_email: row.user_email,
        registered: row.user_id.is_some(),
        violation_type: row.violation_type,
        description: row.description,
        fine_amount: row.fine_amount,
        payment_status: PaymentStatus::parse(&row.payment_status).unwrap_or_else(|| {
            warn!("corrupt payment_status '{}'", row.payment_status);
            PaymentStatus::Pending
        }),
        payment_submitted: row.payment_submitted,
        created_at: row.created_at,
        payment,
    }
}
