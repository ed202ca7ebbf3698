/// Database row types — these map directly to SQLite rows.
/// Distinct from the finetrack-types API models to keep the storage
/// layer independent of the wire format.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub license_number: String,
    pub password: String,
    pub address: String,
    pub date_of_birth: String,
    pub created_at: String,
}

pub struct OfficerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
    pub password: String,
    pub created_at: String,
}

pub struct AdminRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Violation joined with its user, filing officer and latest payment.
/// `violator_name`/`license_number` are COALESCEd: the registered
/// user's fields when linked, the values recorded at filing otherwise.
pub struct ViolationDetailRow {
    pub id: String,
    pub user_id: Option<String>,
    pub officer_id: String,
    pub officer_name: Option<String>,
    pub violator_name: String,
    pub license_number: String,
    pub user_email: Option<String>,
    pub violation_type: String,
    pub description: String,
    pub fine_amount: f64,
    pub payment_status: String,
    pub payment_submitted: bool,
    pub created_at: String,
    pub payment_amount: Option<f64>,
    pub payment_receipt: Option<String>,
    pub payment_status_detail: Option<String>,
    pub payment_date: Option<String>,
}

pub struct PaymentRow {
    pub id: String,
    pub violation_id: String,
    pub amount: f64,
    pub receipt_file: String,
    pub status: String,
    pub created_at: String,
}

/// Payment joined with its violation and (when registered) the payer.
pub struct PaymentDetailRow {
    pub id: String,
    pub violation_id: String,
    pub amount: f64,
    pub receipt_file: String,
    pub status: String,
    pub created_at: String,
    pub violation_type: Option<String>,
    pub fine_amount: Option<f64>,
    pub user_name: Option<String>,
    pub license_number: Option<String>,
}

pub struct DashboardCounts {
    pub total_users: u64,
    pub total_officers: u64,
    pub total_violations: u64,
    pub total_payments: u64,
    pub pending_violations: u64,
    pub paid_violations: u64,
}
