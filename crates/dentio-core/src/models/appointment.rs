//! Appointment model and its closed status/kind enumerations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Workflow position of an appointment.
///
/// The status field is the single source of truth for where an appointment
/// sits in the clinic workflow. Legal transitions between these values are
/// governed by [`crate::workflow`]; nothing else may change the status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    /// Created, not yet confirmed with the patient
    Draft,
    /// Confirmed with the patient
    Confirmed,
    /// Patient is in the chair
    InExam,
    /// Exam finished, procedures recorded, awaiting close-out
    ExamCompleted,
    /// Closed out; ledger total frozen (terminal)
    Completed,
    /// Cancelled; retained for audit, excluded from conflict checks (terminal)
    Cancelled,
}

impl AppointmentStatus {
    /// Stable string form used in the database and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::InExam => "in_exam",
            Self::ExamCompleted => "exam_completed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "confirmed" => Some(Self::Confirmed),
            "in_exam" => Some(Self::InExam),
            "exam_completed" => Some(Self::ExamCompleted),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Closed appointments reject all ledger mutation.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Active appointments participate in scheduling conflict checks.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the appointment was booked. Informational only; does not affect
/// the workflow, except that walk-ins skip the start-time gate on
/// entering the exam.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentKind {
    Reserved,
    WalkIn,
}

impl AppointmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::WalkIn => "walk_in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reserved" => Some(Self::Reserved),
            "walk_in" => Some(Self::WalkIn),
            _ => None,
        }
    }
}

/// An appointment — the central entity of the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Internal UUID
    pub id: String,
    /// Human-readable display serial (e.g. "APT-000123"), immutable once assigned
    pub serial: String,
    /// Patient (required)
    pub patient_id: String,
    /// Practitioner; None means unassigned, which is valid
    pub doctor_id: Option<String>,
    /// Staff member assigned to the appointment (audit field, caller-provided)
    pub assigned_to: Option<String>,
    /// Window start (UTC)
    pub start_time: DateTime<Utc>,
    /// Window end (UTC); always after start
    pub end_time: DateTime<Utc>,
    /// All-day appointments block the whole calendar day for both parties
    pub all_day: bool,
    /// Workflow position
    pub status: AppointmentStatus,
    /// Reserved vs walk-in
    pub kind: AppointmentKind,
    /// Free-text chief complaint
    pub chief_complaints: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Ledger total frozen when the appointment completes
    pub total_cost: Option<Decimal>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Create a new appointment in the initial `Draft` status.
    pub fn new(
        serial: String,
        patient_id: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        kind: AppointmentKind,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            serial,
            patient_id,
            doctor_id: None,
            assigned_to: None,
            start_time,
            end_time,
            all_day: false,
            status: AppointmentStatus::Draft,
            kind,
            chief_complaints: None,
            notes: None,
            total_cost: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Row-level record of a file attached to an appointment.
///
/// The blob itself lives with the external attachment store; the core only
/// tracks the row and the store's key, and guarantees rows are removed when
/// the appointment is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub appointment_id: String,
    pub file_name: String,
    /// Key under which the external store holds the blob
    pub storage_key: String,
    pub created_at: String,
}

impl Attachment {
    pub fn new(appointment_id: String, file_name: String, storage_key: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id,
            file_name,
            storage_key,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_appointment_starts_as_draft() {
        let start = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0).unwrap();
        let appt = Appointment::new(
            "APT-000001".into(),
            "patient-1".into(),
            start,
            end,
            AppointmentKind::Reserved,
        );

        assert_eq!(appt.status, AppointmentStatus::Draft);
        assert_eq!(appt.serial, "APT-000001");
        assert!(appt.doctor_id.is_none());
        assert!(appt.total_cost.is_none());
        assert_eq!(appt.id.len(), 36); // UUID format
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            AppointmentStatus::Draft,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InExam,
            AppointmentStatus::ExamCompleted,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::parse("no_show"), None);
    }

    #[test]
    fn test_terminal_and_active() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(!AppointmentStatus::Draft.is_terminal());

        assert!(AppointmentStatus::Completed.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
    }
}
