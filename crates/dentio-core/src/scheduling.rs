//! Scheduling conflict checker.
//!
//! Half-open interval semantics throughout: a window `[s, e)` conflicts
//! with `[s2, e2)` iff `s < e2 && e > s2`, so an appointment that starts
//! exactly when another ends is not a conflict. All-day appointments are
//! coarser: they block the whole calendar day for their party, on either
//! side of the comparison.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::models::Appointment;
use crate::CoreError;

/// A validated appointment time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if end <= start {
            return Err(CoreError::InvalidWindow);
        }
        Ok(Self { start, end })
    }
}

/// Which party an existing appointment clashed on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PartyKind {
    Doctor,
    Patient,
}

impl std::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doctor => f.write_str("doctor"),
            Self::Patient => f.write_str("patient"),
        }
    }
}

/// The first conflicting appointment found for a proposed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub appointment_id: String,
    pub appointment_serial: String,
    pub party: PartyKind,
}

/// Checks a proposed window against active appointments for each party.
pub struct ConflictChecker<'a> {
    db: &'a Database,
}

impl<'a> ConflictChecker<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Find the first active appointment clashing with the proposed window
    /// for the given doctor and/or patient. `exclude` lets an update skip
    /// the appointment being modified.
    ///
    /// Must run inside the same write transaction as the eventual insert or
    /// update; see [`Database::begin_write`].
    pub fn check_availability(
        &self,
        window: &TimeWindow,
        all_day: bool,
        doctor_id: Option<&str>,
        patient_id: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Option<Conflict>, CoreError> {
        if let Some(doctor_id) = doctor_id {
            let existing = self.db.list_active_for_doctor(doctor_id, exclude)?;
            if let Some(hit) = first_collision(window, all_day, &existing) {
                debug!(doctor_id, conflicting = %hit.serial, "doctor window conflict");
                return Ok(Some(Conflict {
                    appointment_id: hit.id.clone(),
                    appointment_serial: hit.serial.clone(),
                    party: PartyKind::Doctor,
                }));
            }
        }

        if let Some(patient_id) = patient_id {
            let existing = self.db.list_active_for_patient(patient_id, exclude)?;
            if let Some(hit) = first_collision(window, all_day, &existing) {
                debug!(patient_id, conflicting = %hit.serial, "patient window conflict");
                return Ok(Some(Conflict {
                    appointment_id: hit.id.clone(),
                    appointment_serial: hit.serial.clone(),
                    party: PartyKind::Patient,
                }));
            }
        }

        Ok(None)
    }
}

fn first_collision<'b>(
    window: &TimeWindow,
    all_day: bool,
    existing: &'b [Appointment],
) -> Option<&'b Appointment> {
    existing
        .iter()
        .find(|appt| collides(window, all_day, appt))
}

/// Whether a proposed window collides with an existing active appointment.
pub fn collides(window: &TimeWindow, all_day: bool, existing: &Appointment) -> bool {
    if all_day || existing.all_day {
        let candidate = day_span(window.start, window.end);
        let other = day_span(existing.start_time, existing.end_time);
        days_overlap(candidate, other)
    } else {
        windows_overlap(window.start, window.end, existing.start_time, existing.end_time)
    }
}

/// Half-open interval overlap test.
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// The inclusive range of calendar days a window touches. The end is
/// half-open, so a window ending exactly at midnight does not touch the
/// following day.
fn day_span(start: DateTime<Utc>, end: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let last = (end - Duration::nanoseconds(1)).date_naive();
    (start.date_naive(), last.max(start.date_naive()))
}

fn days_overlap(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 <= b.1 && a.1 >= b.0
}
