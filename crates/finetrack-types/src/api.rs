use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ConfirmationStatus, IdentityKind, PaymentStatus, Role};

// -- JWT Claims --

/// JWT claims shared by the auth handlers (issuance) and the middleware
/// (verification). Canonical definition lives here in finetrack-types so
/// the two sides cannot drift.
///
/// `role` is normalized at issuance — check sites compare against the
/// enum directly, there is no fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub kind: IdentityKind,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub license_number: String,
    pub password: String,
    pub address: String,
    pub date_of_birth: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    /// Violations filed against this license before registration, now
    /// linked to the new account. Zero when reconciliation found nothing
    /// or failed (registration succeeds either way).
    pub linked_violations: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub user_type: IdentityKind,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub kind: IdentityKind,
    pub role: Role,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub license_number: String,
    pub address: String,
    pub date_of_birth: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone_number: String,
    pub address: String,
}

/// Admin edit of a user record — unlike self-service profile updates,
/// this may change email and license number (subject to uniqueness).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub license_number: String,
    pub date_of_birth: String,
    pub address: String,
}

// -- Officers --

#[derive(Debug, Serialize, Deserialize)]
pub struct OfficerProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOfficerRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct CreateOfficerResponse {
    pub officer_id: Uuid,
}

/// Result of an officer looking up a license number: whether a User
/// account exists for it, plus the full violation history for that
/// license (registered and pre-registration filings alike).
#[derive(Debug, Serialize, Deserialize)]
pub struct LicenseSearchResponse {
    pub license_number: String,
    pub registered: bool,
    pub user: Option<UserProfile>,
    pub previous_violations: Vec<ViolationDetail>,
}

// -- Violations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileViolationRequest {
    /// Set for a registered citizen; leave null and supply
    /// `license_number` + `citizen_name` for an unregistered one.
    pub user_id: Option<Uuid>,
    pub license_number: Option<String>,
    pub citizen_name: Option<String>,
    pub violation_type: String,
    pub description: String,
    pub fine_amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileViolationResponse {
    pub violation_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViolationDetail {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub officer_id: Uuid,
    pub officer_name: Option<String>,
    /// COALESCE(user name, citizen name recorded at filing).
    pub violator_name: String,
    pub license_number: String,
    pub user_email: Option<String>,
    pub registered: bool,
    pub violation_type: String,
    pub description: String,
    pub fine_amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_submitted: bool,
    pub created_at: String,
    pub payment: Option<PaymentSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub amount: f64,
    pub receipt_file: String,
    pub status: ConfirmationStatus,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateViolationStatusRequest {
    pub payment_status: PaymentStatus,
}

// -- Payments --

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitPaymentResponse {
    pub payment_id: Uuid,
    pub receipt_file: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub id: Uuid,
    pub violation_id: Uuid,
    pub amount: f64,
    pub receipt_file: String,
    pub status: ConfirmationStatus,
    pub created_at: String,
    pub violation_type: Option<String>,
    pub fine_amount: Option<f64>,
    pub user_name: Option<String>,
    pub license_number: Option<String>,
}

// -- Admin --

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_officers: u64,
    pub total_violations: u64,
    pub total_payments: u64,
    pub pending_violations: u64,
    pub paid_violations: u64,
}
