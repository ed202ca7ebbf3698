use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            phone_number    TEXT NOT NULL,
            license_number  TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            address         TEXT NOT NULL,
            date_of_birth   TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS officers (
            id              TEXT PRIMARY KEY,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            phone_number    TEXT NOT NULL,
            role            TEXT NOT NULL DEFAULT 'officer'
                            CHECK (role IN ('officer', 'admin')),
            password        TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- No self-registration path; seeded at startup from env.
        CREATE TABLE IF NOT EXISTS admins (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL
        );

        -- user_id is NULL for violations filed against an unregistered
        -- citizen; reconciliation fills it in when the citizen registers.
        -- license_number/citizen_name stay as the historical record and
        -- are never cleared. user_id/officer_id carry no FK constraint:
        -- admin deletes must succeed and leave the violation as an
        -- orphaned historical reference, never cascade.
        CREATE TABLE IF NOT EXISTS violations (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT,
            officer_id          TEXT NOT NULL,
            violation_type      TEXT NOT NULL,
            description         TEXT NOT NULL,
            fine_amount         REAL NOT NULL,
            license_number      TEXT,
            citizen_name        TEXT,
            payment_status      TEXT NOT NULL DEFAULT 'Pending'
                                CHECK (payment_status IN ('Pending', 'Paid')),
            payment_submitted   INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_violations_user
            ON violations(user_id);
        CREATE INDEX IF NOT EXISTS idx_violations_officer
            ON violations(officer_id);
        CREATE INDEX IF NOT EXISTS idx_violations_license
            ON violations(license_number);

        CREATE TABLE IF NOT EXISTS payments (
            id              TEXT PRIMARY KEY,
            violation_id    TEXT NOT NULL REFERENCES violations(id),
            amount          REAL NOT NULL,
            receipt_file    TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'Pending'
                            CHECK (status IN ('Pending', 'Confirmed')),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_payments_violation
            ON payments(violation_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
