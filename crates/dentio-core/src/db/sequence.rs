//! Display-serial sequence counters.
//!
//! One counter row per entity kind, incremented and read in a single SQL
//! statement. SQLite serializes writers, so concurrent callers observe a
//! strictly increasing sequence with no duplicates. Mint inside the same
//! write transaction as the entity insert: a rollback then undoes both, so
//! no persisted entity can ever share a serial with another.

use super::{Database, DbResult};

/// Entity kinds that carry a display serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Patient,
    Appointment,
    Prescription,
}

impl SequenceKind {
    /// Counter row key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Appointment => "appointment",
            Self::Prescription => "prescription",
        }
    }

    /// Serial prefix, dash included.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Patient => "PAT-",
            Self::Appointment => "APT-",
            Self::Prescription => "PRS-",
        }
    }
}

impl Database {
    /// Mint the next display serial for a kind (e.g. "APT-000123").
    pub fn next_serial(&self, kind: SequenceKind) -> DbResult<String> {
        let value: i64 = self.conn.query_row(
            "UPDATE sequence_counters SET value = value + 1 WHERE kind = ?1 RETURNING value",
            [kind.key()],
            |row| row.get(0),
        )?;
        Ok(format!("{}{:06}", kind.prefix(), value))
    }
}
