use thiserror::Error;

/// Typed storage errors. The API layer maps these onto its own
/// taxonomy (Conflict -> 400, NotFound -> 404, everything else -> 500).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation (duplicate email or license number).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection mutex poisoned by a panicking writer.
    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Wrap an insert/update error, translating SQLite constraint
    /// failures into `Conflict` so races on unique columns surface as
    /// 400s rather than 500s.
    pub fn on_write(err: rusqlite::Error, what: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(what.to_string())
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x TEXT UNIQUE);").unwrap();
        conn.execute("INSERT INTO t (x) VALUES ('a')", []).unwrap();
        let err = conn
            .execute("INSERT INTO t (x) VALUES ('a')", [])
            .unwrap_err();
        match StoreError::on_write(err, "duplicate x") {
            StoreError::Conflict(msg) => assert_eq!(msg, "duplicate x"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn other_errors_pass_through() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("INSERT INTO nope (x) VALUES (1)", []).unwrap_err();
        match StoreError::on_write(err, "unused") {
            StoreError::Sqlite(_) => {}
            other => panic!("expected Sqlite, got {other:?}"),
        }
    }
}
