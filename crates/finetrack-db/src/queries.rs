use crate::models::{
    AdminRow, DashboardCounts, OfficerRow, PaymentDetailRow, PaymentRow, UserRow,
    ViolationDetailRow,
};
use crate::{Database, Result, StoreError};
use rusqlite::Connection;

/// Shared SELECT for violation detail views. `violator_name` and
/// `license_number` prefer the linked user's current record and fall
/// back to the values captured at filing time.
const VIOLATION_DETAIL_SELECT: &str = "
    SELECT v.id, v.user_id, v.officer_id, o.name,
           COALESCE(u.name, v.citizen_name, '') AS violator_name,
           COALESCE(u.license_number, v.license_number, '') AS license_number,
           u.email,
           v.violation_type, v.description, v.fine_amount,
           v.payment_status, v.payment_submitted, v.created_at,
           p.amount, p.receipt_file, p.status, p.created_at
    FROM violations v
    LEFT JOIN users u ON v.user_id = u.id
    LEFT JOIN officers o ON v.officer_id = o.id
    LEFT JOIN payments p ON p.violation_id = v.id";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        phone_number: &str,
        license_number: &str,
        password_hash: &str,
        address: &str,
        date_of_birth: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, phone_number, license_number, password, address, date_of_birth)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id,
                    name,
                    email,
                    phone_number,
                    license_number,
                    password_hash,
                    address,
                    date_of_birth
                ],
            )
            .map_err(|e| {
                StoreError::on_write(e, "a user already exists with this email or license number")
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_license(&self, license_number: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "license_number", license_number))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, phone_number, license_number, password, address, date_of_birth, created_at
                 FROM users ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Self-service profile update: name, phone and address only.
    pub fn update_user_profile(
        &self,
        id: &str,
        name: &str,
        phone_number: &str,
        address: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET name = ?1, phone_number = ?2, address = ?3 WHERE id = ?4",
                rusqlite::params![name, phone_number, address, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Admin edit: may change email and license number, both unique.
    pub fn admin_update_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        phone_number: &str,
        license_number: &str,
        date_of_birth: &str,
        address: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn
                .execute(
                    "UPDATE users
                     SET name = ?1, email = ?2, phone_number = ?3, license_number = ?4,
                         date_of_birth = ?5, address = ?6
                     WHERE id = ?7",
                    rusqlite::params![
                        name,
                        email,
                        phone_number,
                        license_number,
                        date_of_birth,
                        address,
                        id
                    ],
                )
                .map_err(|e| {
                    StoreError::on_write(
                        e,
                        "another user already has this email or license number",
                    )
                })?;
            Ok(n > 0)
        })
    }

    /// No cascade: the user's violations keep their user_id as an
    /// orphaned historical reference.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Officers --

    pub fn create_officer(
        &self,
        id: &str,
        name: &str,
        email: &str,
        phone_number: &str,
        role: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO officers (id, name, email, phone_number, role, password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, name, email, phone_number, role, password_hash],
            )
            .map_err(|e| StoreError::on_write(e, "an officer already exists with this email"))?;
            Ok(())
        })
    }

    pub fn get_officer_by_email(&self, email: &str) -> Result<Option<OfficerRow>> {
        self.with_conn(|conn| query_officer(conn, "email", email))
    }

    pub fn get_officer_by_id(&self, id: &str) -> Result<Option<OfficerRow>> {
        self.with_conn(|conn| query_officer(conn, "id", id))
    }

    pub fn list_officers(&self) -> Result<Vec<OfficerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, phone_number, role, password, created_at
                 FROM officers ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], map_officer_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_officer(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM officers WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Admins --

    pub fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, email, password FROM admins WHERE email = ?1")?;
            stmt.query_row([email], |row| {
                Ok(AdminRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    password: row.get(3)?,
                })
            })
            .optional()
        })
    }

    pub fn admin_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }

    /// Seeding path only — there is no self-registration for admins.
    pub fn create_admin(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO admins (id, name, email, password) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, email, password_hash],
            )
            .map_err(|e| StoreError::on_write(e, "an admin already exists with this email"))?;
            Ok(())
        })
    }

    // -- Violations --

    /// `user_id` set for a registered citizen; `license_number` and
    /// `citizen_name` recorded verbatim for an unregistered one.
    pub fn insert_violation(
        &self,
        id: &str,
        user_id: Option<&str>,
        officer_id: &str,
        violation_type: &str,
        description: &str,
        fine_amount: f64,
        license_number: Option<&str>,
        citizen_name: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO violations
                     (id, user_id, officer_id, violation_type, description, fine_amount,
                      license_number, citizen_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id,
                    user_id,
                    officer_id,
                    violation_type,
                    description,
                    fine_amount,
                    license_number,
                    citizen_name
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_violation_detail(&self, id: &str) -> Result<Option<ViolationDetailRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VIOLATION_DETAIL_SELECT} WHERE v.id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([id], map_violation_detail).optional()
        })
    }

    pub fn list_violations(&self) -> Result<Vec<ViolationDetailRow>> {
        self.with_conn(|conn| query_violation_details(conn, "", &[]))
    }

    pub fn list_violations_for_user(&self, user_id: &str) -> Result<Vec<ViolationDetailRow>> {
        self.with_conn(|conn| query_violation_details(conn, "WHERE v.user_id = ?1", &[&user_id]))
    }

    pub fn list_violations_for_officer(
        &self,
        officer_id: &str,
    ) -> Result<Vec<ViolationDetailRow>> {
        self.with_conn(|conn| {
            query_violation_details(conn, "WHERE v.officer_id = ?1", &[&officer_id])
        })
    }

    /// Every violation on record for a license number, whether filed
    /// against the registered account or before registration.
    pub fn list_violations_for_license(
        &self,
        license_number: &str,
    ) -> Result<Vec<ViolationDetailRow>> {
        self.with_conn(|conn| {
            query_violation_details(
                conn,
                "WHERE COALESCE(u.license_number, v.license_number) = ?1",
                &[&license_number],
            )
        })
    }

    /// Admin override for a violation's settlement state. The intended
    /// transition runs through `confirm_payment`; this path exists for
    /// operational correction only and is role-gated at the API layer.
    pub fn set_violation_payment_status(&self, id: &str, status: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE violations SET payment_status = ?1 WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Reconciliation: link every violation filed against this license
    /// number before the user registered. The `user_id IS NULL` guard
    /// makes retries no-ops and never overwrites an existing link.
    pub fn link_violations_to_user(&self, user_id: &str, license_number: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE violations SET user_id = ?1
                 WHERE license_number = ?2 AND user_id IS NULL",
                rusqlite::params![user_id, license_number],
            )?;
            Ok(n as u64)
        })
    }

    // -- Payments --

    /// Record a payment claim and flag the violation as
    /// payment-submitted, in one transaction. The violation's
    /// payment_status stays Pending until an admin confirms.
    pub fn submit_payment(
        &self,
        payment_id: &str,
        violation_id: &str,
        amount: f64,
        receipt_file: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: Option<String> = tx
                .query_row(
                    "SELECT id FROM violations WHERE id = ?1",
                    [violation_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound(format!(
                    "violation {violation_id} does not exist"
                )));
            }

            tx.execute(
                "INSERT INTO payments (id, violation_id, amount, receipt_file)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![payment_id, violation_id, amount, receipt_file],
            )?;
            tx.execute(
                "UPDATE violations SET payment_submitted = 1 WHERE id = ?1",
                [violation_id],
            )?;

            tx.commit()?;
            Ok(())
        })
    }

    /// Confirm a payment and settle its violation as one transaction:
    /// a reader can never observe the payment Confirmed while the
    /// violation is still Pending, or the reverse. Returns the settled
    /// violation's id.
    pub fn confirm_payment(&self, payment_id: &str) -> Result<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let violation_id: Option<String> = tx
                .query_row(
                    "SELECT violation_id FROM payments WHERE id = ?1",
                    [payment_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(violation_id) = violation_id else {
                return Err(StoreError::NotFound(format!(
                    "payment {payment_id} does not exist"
                )));
            };

            tx.execute(
                "UPDATE payments SET status = 'Confirmed' WHERE id = ?1",
                [payment_id],
            )?;
            tx.execute(
                "UPDATE violations SET payment_status = 'Paid' WHERE id = ?1",
                [&violation_id],
            )?;

            tx.commit()?;
            Ok(violation_id)
        })
    }

    pub fn list_payments(&self) -> Result<Vec<PaymentDetailRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.violation_id, p.amount, p.receipt_file, p.status, p.created_at,
                        v.violation_type, v.fine_amount, u.name,
                        COALESCE(u.license_number, v.license_number)
                 FROM payments p
                 LEFT JOIN violations v ON p.violation_id = v.id
                 LEFT JOIN users u ON v.user_id = u.id
                 ORDER BY p.created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PaymentDetailRow {
                        id: row.get(0)?,
                        violation_id: row.get(1)?,
                        amount: row.get(2)?,
                        receipt_file: row.get(3)?,
                        status: row.get(4)?,
                        created_at: row.get(5)?,
                        violation_type: row.get(6)?,
                        fine_amount: row.get(7)?,
                        user_name: row.get(8)?,
                        license_number: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn payments_for_violation(&self, violation_id: &str) -> Result<Vec<PaymentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, violation_id, amount, receipt_file, status, created_at
                 FROM payments WHERE violation_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([violation_id], |row| {
                    Ok(PaymentRow {
                        id: row.get(0)?,
                        violation_id: row.get(1)?,
                        amount: row.get(2)?,
                        receipt_file: row.get(3)?,
                        status: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Dashboard --

    /// Aggregate counts for the admin dashboard, read sequentially on
    /// one connection.
    pub fn dashboard_counts(&self) -> Result<DashboardCounts> {
        self.with_conn(|conn| {
            let count = |sql: &str| -> Result<u64> {
                let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(n as u64)
            };
            Ok(DashboardCounts {
                total_users: count("SELECT COUNT(*) FROM users")?,
                total_officers: count("SELECT COUNT(*) FROM officers")?,
                total_violations: count("SELECT COUNT(*) FROM violations")?,
                total_payments: count("SELECT COUNT(*) FROM payments")?,
                pending_violations: count(
                    "SELECT COUNT(*) FROM violations WHERE payment_status = 'Pending'",
                )?,
                paid_violations: count(
                    "SELECT COUNT(*) FROM violations WHERE payment_status = 'Paid'",
                )?,
            })
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is a fixed identifier chosen by the caller, never input.
    let sql = format!(
        "SELECT id, name, email, phone_number, license_number, password, address, date_of_birth, created_at
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user_row).optional()
}

fn query_officer(conn: &Connection, column: &str, value: &str) -> Result<Option<OfficerRow>> {
    let sql = format!(
        "SELECT id, name, email, phone_number, role, password, created_at
         FROM officers WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_officer_row).optional()
}

fn query_violation_details(
    conn: &Connection,
    filter: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<ViolationDetailRow>> {
    let sql = format!("{VIOLATION_DETAIL_SELECT} {filter} ORDER BY v.created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_violation_detail)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone_number: row.get(3)?,
        license_number: row.get(4)?,
        password: row.get(5)?,
        address: row.get(6)?,
        date_of_birth: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn map_officer_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OfficerRow> {
    Ok(OfficerRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone_number: row.get(3)?,
        role: row.get(4)?,
        password: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_violation_detail(row: &rusqlite::Row<'_>) -> rusqlite::Result<ViolationDetailRow> {
    Ok(ViolationDetailRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        officer_id: row.get(2)?,
        officer_name: row.get(3)?,
        violator_name: row.get(4)?,
        license_number: row.get(5)?,
        user_email: row.get(6)?,
        violation_type: row.get(7)?,
        description: row.get(8)?,
        fine_amount: row.get(9)?,
        payment_status: row.get(10)?,
        payment_submitted: row.get(11)?,
        created_at: row.get(12)?,
        payment_amount: row.get(13)?,
        payment_receipt: row.get(14)?,
        payment_status_detail: row.get(15)?,
        payment_date: row.get(16)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
