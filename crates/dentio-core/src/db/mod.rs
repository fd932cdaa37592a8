//! Database layer for dentio.

mod schema;
mod appointments;
mod catalog;
mod doctors;
mod patients;
mod prescriptions;
mod procedures;
mod sequence;

pub use schema::*;
#[allow(unused_imports)]
pub use appointments::*;
#[allow(unused_imports)]
pub use catalog::*;
#[allow(unused_imports)]
pub use doctors::*;
#[allow(unused_imports)]
pub use patients::*;
#[allow(unused_imports)]
pub use prescriptions::*;
#[allow(unused_imports)]
pub use procedures::*;
pub use sequence::*;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin an immediate (write-locking) transaction.
    ///
    /// SQLite takes the single writer lock at BEGIN, so a check-then-write
    /// sequence inside this transaction cannot race another writer: the
    /// availability check and the insert commit as one atomic unit. All
    /// statements issued on this connection while the transaction is open
    /// participate in it; dropping the transaction without committing rolls
    /// everything back.
    pub fn begin_write(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

/// Encode a UTC instant as fixed-width RFC 3339 ("2026-01-10T09:00:00Z").
///
/// The format is constant-width with a trailing Z, so lexicographic order
/// on stored values matches chronological order. Appointment windows are
/// second-granular.
pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Decode a stored RFC 3339 timestamp.
pub(crate) fn decode_ts(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Constraint(format!("Bad timestamp {:?}: {}", s, e)))
}

/// Encode a money value as canonical decimal text.
pub(crate) fn encode_money(value: Decimal) -> String {
    value.to_string()
}

/// Decode a stored money value.
pub(crate) fn decode_money(s: &str) -> DbResult<Decimal> {
    Decimal::from_str(s).map_err(|e| DbError::Constraint(format!("Bad money value {:?}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"patients".to_string()));
        assert!(tables.contains(&"doctors".to_string()));
        assert!(tables.contains(&"services".to_string()));
        assert!(tables.contains(&"appointments".to_string()));
        assert!(tables.contains(&"dental_procedures".to_string()));
        assert!(tables.contains(&"prescriptions".to_string()));
        assert!(tables.contains(&"attachments".to_string()));
        assert!(tables.contains(&"sequence_counters".to_string()));
    }

    #[test]
    fn test_timestamp_encoding_is_sortable() {
        let early = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0).unwrap();

        let a = encode_ts(early);
        let b = encode_ts(late);
        assert!(a < b);
        assert_eq!(a, "2026-01-10T09:00:00Z");
        assert_eq!(decode_ts(&a).unwrap(), early);
    }

    #[test]
    fn test_money_roundtrip() {
        let value = Decimal::new(12550, 2);
        assert_eq!(encode_money(value), "125.50");
        assert_eq!(decode_money("125.50").unwrap(), value);
        assert!(decode_money("not money").is_err());
    }

    #[test]
    fn test_write_transaction_rolls_back_on_drop() {
        let db = Database::open_in_memory().unwrap();

        {
            let _tx = db.begin_write().unwrap();
            db.conn()
                .execute(
                    "INSERT INTO doctors (id, name, phone, created_at, updated_at)
                     VALUES ('d1', 'Dr. X', '555', datetime('now'), datetime('now'))",
                    [],
                )
                .unwrap();
            // dropped without commit
        }

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
