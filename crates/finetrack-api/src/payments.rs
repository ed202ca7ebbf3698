use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::{error, warn};
use uuid::Uuid;

use finetrack_db::models::{PaymentDetailRow, PaymentRow};
use finetrack_types::api::{Claims, PaymentDetail, SubmitPaymentResponse};
use finetrack_types::models::ConfirmationStatus;

use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::parse_uuid;
use crate::state::{with_db, AppState};

/// Receipts are capped at 5 MB.
const MAX_RECEIPT_SIZE: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

struct ReceiptUpload {
    extension: String,
    bytes: Vec<u8>,
}

/// POST /payments — multipart form: `violation_id`, `amount`, `receipt`
/// (jpeg/png/pdf). Everything is validated before a single byte hits
/// disk or a row is written; a rejected receipt leaves no Payment
/// behind. On success the payment is Pending and the violation is
/// flagged payment-submitted — settlement waits for admin confirmation.
pub async fn submit_payment(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut violation_id: Option<Uuid> = None;
    let mut amount: Option<f64> = None;
    let mut receipt: Option<ReceiptUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "violation_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("unreadable violation_id: {e}")))?;
                violation_id = Some(
                    text.parse()
                        .map_err(|_| ApiError::Validation("violation_id must be a UUID".into()))?,
                );
            }
            "amount" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("unreadable amount: {e}")))?;
                amount = Some(
                    text.parse()
                        .map_err(|_| ApiError::Validation("amount must be a number".into()))?,
                );
            }
            "receipt" => {
                receipt = Some(validate_receipt_field(field).await?);
            }
            other => {
                warn!("ignoring unexpected multipart field '{}'", other);
                let _ = field.bytes().await;
            }
        }
    }

    let violation_id =
        violation_id.ok_or_else(|| ApiError::Validation("violation_id is required".into()))?;
    let amount = amount.ok_or_else(|| ApiError::Validation("amount is required".into()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation("amount must be a positive number".into()));
    }
    let receipt = receipt.ok_or_else(|| ApiError::Validation("receipt file is required".into()))?;

    // Timestamped receipt filename; served back under /uploads/receipts/.
    let receipt_file = format!(
        "receipt-{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        receipt.extension
    );

    let receipts_dir = state.upload_dir.join("receipts");
    tokio::fs::create_dir_all(&receipts_dir).await.map_err(|e| {
        error!("failed to create receipts directory: {}", e);
        ApiError::Dependency(format!("receipt storage unavailable: {e}"))
    })?;
    let disk_path = receipts_dir.join(&receipt_file);
    tokio::fs::write(&disk_path, &receipt.bytes).await.map_err(|e| {
        error!("failed to write receipt {}: {}", disk_path.display(), e);
        ApiError::Dependency(format!("receipt write failed: {e}"))
    })?;

    let payment_id = Uuid::new_v4();
    let pid = payment_id.to_string();
    let vid = violation_id.to_string();
    let stored_name = receipt_file.clone();
    let result = with_db(&state, move |db| {
        db.submit_payment(&pid, &vid, amount, &stored_name)
    })
    .await;

    if let Err(e) = result {
        // The row never landed; drop the orphaned file too.
        let _ = tokio::fs::remove_file(&disk_path).await;
        return Err(e);
    }

    Ok((
        StatusCode::CREATED,
        Json(SubmitPaymentResponse {
            payment_id,
            receipt_file,
        }),
    ))
}

/// GET /payments — all payment claims, admin only.
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    let rows = with_db(&state, |db| db.list_payments()).await?;
    let payments: Vec<_> = rows.into_iter().map(detail_from_row).collect();
    Ok(Json(payments))
}

/// GET /payments/violation/{violation_id}
pub async fn for_violation(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(violation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vid = violation_id.to_string();
    let rows = with_db(&state, move |db| db.payments_for_violation(&vid)).await?;
    let payments: Vec<_> = rows.into_iter().map(summary_from_row).collect();
    Ok(Json(payments))
}

/// Extension and declared content type must both be on the whitelist,
/// and the payload within the size cap, before anything is persisted.
async fn validate_receipt_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<ReceiptUpload, ApiError> {
    let file_name = field
        .file_name()
        .ok_or_else(|| ApiError::Validation("receipt must be a file upload".into()))?
        .to_string();
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::Validation(
            "only JPEG, PNG and PDF receipts are accepted".into(),
        ));
    }

    let content_type = field.content_type().unwrap_or_default().to_string();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::Validation(
            "only JPEG, PNG and PDF receipts are accepted".into(),
        ));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("unreadable receipt upload: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("receipt file is empty".into()));
    }
    if bytes.len() > MAX_RECEIPT_SIZE {
        return Err(ApiError::Validation("receipt exceeds the 5 MB limit".into()));
    }

    Ok(ReceiptUpload {
        extension,
        bytes: bytes.to_vec(),
    })
}

fn detail_from_row(row: PaymentDetailRow) -> PaymentDetail {
    PaymentDetail {
        id: parse_uuid(&row.id, "payment id"),
        violation_id: parse_uuid(&row.violation_id, "violation id"),
        amount: row.amount,
        receipt_file: row.receipt_file,
        status: ConfirmationStatus::parse(&row.status).unwrap_or(ConfirmationStatus::Pending),
        created_at: row.created_at,
        violation_type: row.violation_type,
        fine_amount: row.fine_amount,
        user_name: row.user_name,
        license_number: row.license_number,
    }
}

fn summary_from_row(row: PaymentRow) -> PaymentDetail {
    PaymentDetail {
        id: parse_uuid(&row.id, "payment id"),
        violation_id: parse_uuid(&row.violation_id, "violation id"),
        amount: row.amount,
        receipt_file: row.receipt_file,
        status: ConfirmationStatus::parse(&row.status).unwrap_or(ConfirmationStatus::Pending),
        created_at: row.created_at,
        violation_type: None,
        fine_amount: None,
        user_name: None,
        license_number: None,
    }
}
