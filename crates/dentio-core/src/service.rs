//! Appointment service — the orchestration layer external collaborators call.
//!
//! Every multi-step operation here runs as one write transaction: the
//! availability check, the serial mint and the row write commit together
//! or not at all, so two concurrent bookings can never both pass the check
//! (see [`Database::begin_write`]).

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::db::{AppointmentFilter, Database, DbError, SequenceKind};
use crate::ledger::ProcedureLedger;
use crate::models::{Appointment, AppointmentKind, AppointmentStatus};
use crate::scheduling::{ConflictChecker, TimeWindow};
use crate::workflow::{self, TransitionContext};
use crate::CoreError;

/// External collaborator that owns attachment blobs.
///
/// The core tracks attachment rows only; when an appointment is deleted the
/// collaborator must confirm blob cleanup before the rows go away.
pub trait AttachmentStore {
    fn delete_attachments_for(&self, appointment_id: &str) -> anyhow::Result<()>;
}

/// No-op store for deployments without attachment storage and for tests.
pub struct NullAttachmentStore;

impl AttachmentStore for NullAttachmentStore {
    fn delete_attachments_for(&self, _appointment_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Request to create an appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: Option<String>,
    /// Pre-authenticated staff identity, trusted as-is (audit field)
    pub assigned_to: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub kind: AppointmentKind,
    pub chief_complaints: Option<String>,
    pub notes: Option<String>,
}

/// Orchestrates the conflict checker, sequence generator, state machine
/// and ledger into the operations the outside world uses.
pub struct AppointmentService<'a> {
    db: &'a Database,
}

impl<'a> AppointmentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create an appointment in the initial `Draft` status.
    pub fn create_appointment(&self, req: NewAppointment) -> Result<Appointment, CoreError> {
        let window = TimeWindow::new(req.start_time, req.end_time)?;

        self.db
            .get_patient(&req.patient_id)?
            .ok_or_else(|| CoreError::NotFound(format!("patient {}", req.patient_id)))?;
        if let Some(doctor_id) = &req.doctor_id {
            self.db
                .get_doctor(doctor_id)?
                .ok_or_else(|| CoreError::NotFound(format!("doctor {}", doctor_id)))?;
        }

        // Check, mint and insert under one write lock.
        let tx = self.db.begin_write()?;

        let checker = ConflictChecker::new(self.db);
        if let Some(conflict) = checker.check_availability(
            &window,
            req.all_day,
            req.doctor_id.as_deref(),
            Some(&req.patient_id),
            None,
        )? {
            warn!(
                conflicting = %conflict.appointment_serial,
                party = %conflict.party,
                "booking refused"
            );
            return Err(CoreError::SchedulingConflict {
                appointment_id: conflict.appointment_id,
                party: conflict.party,
            });
        }

        let serial = self
            .db
            .next_serial(SequenceKind::Appointment)
            .map_err(|_| CoreError::SequenceUnavailable)?;

        let mut appt = Appointment::new(
            serial,
            req.patient_id,
            window.start,
            window.end,
            req.kind,
        );
        appt.doctor_id = req.doctor_id;
        appt.assigned_to = req.assigned_to;
        appt.all_day = req.all_day;
        appt.chief_complaints = req.chief_complaints;
        appt.notes = req.notes;

        self.db.insert_appointment(&appt)?;
        tx.commit().map_err(DbError::from)?;

        info!(serial = %appt.serial, "appointment created");
        Ok(appt)
    }

    /// Move an appointment to a new window. Only `Draft` and `Confirmed`
    /// appointments may be rescheduled; the check excludes the appointment
    /// itself.
    pub fn reschedule_appointment(
        &self,
        id: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<Appointment, CoreError> {
        let window = TimeWindow::new(new_start, new_end)?;

        let tx = self.db.begin_write()?;

        let mut appt = self.load(id)?;
        if !matches!(
            appt.status,
            AppointmentStatus::Draft | AppointmentStatus::Confirmed
        ) {
            return Err(CoreError::AppointmentClosed);
        }

        let checker = ConflictChecker::new(self.db);
        if let Some(conflict) = checker.check_availability(
            &window,
            appt.all_day,
            appt.doctor_id.as_deref(),
            Some(&appt.patient_id),
            Some(&appt.id),
        )? {
            return Err(CoreError::SchedulingConflict {
                appointment_id: conflict.appointment_id,
                party: conflict.party,
            });
        }

        appt.start_time = window.start;
        appt.end_time = window.end;
        appt.touch();
        self.db.update_appointment(&appt)?;
        tx.commit().map_err(DbError::from)?;

        info!(serial = %appt.serial, start = %appt.start_time, "appointment rescheduled");
        Ok(appt)
    }

    /// Apply a workflow transition. On entering `Completed` the ledger
    /// total is frozen onto the appointment.
    pub fn change_status(
        &self,
        id: &str,
        target: AppointmentStatus,
        override_completion: bool,
    ) -> Result<Appointment, CoreError> {
        let tx = self.db.begin_write()?;

        let mut appt = self.load(id)?;
        let ledger = ProcedureLedger::new(self.db);
        let procedure_count = ledger.list(&appt.id)?.len();

        let mut ctx = TransitionContext::new(Utc::now(), procedure_count);
        ctx.override_completion = override_completion;
        workflow::ensure_transition(&appt, target, &ctx)?;

        if target == AppointmentStatus::Completed {
            appt.total_cost = Some(ledger.total_cost(&appt.id)?);
        }
        let from = appt.status;
        appt.status = target;
        appt.touch();
        self.db.update_appointment(&appt)?;
        tx.commit().map_err(DbError::from)?;

        info!(serial = %appt.serial, %from, to = %target, "status changed");
        Ok(appt)
    }

    /// Administrative hard delete. Owned procedures and attachment rows go
    /// with the appointment, but only after the external store confirms
    /// blob cleanup; a store failure rolls the whole delete back.
    pub fn delete_appointment(
        &self,
        id: &str,
        attachments: &dyn AttachmentStore,
    ) -> Result<(), CoreError> {
        let tx = self.db.begin_write()?;

        let appt = self.load(id)?;
        attachments
            .delete_attachments_for(&appt.id)
            .map_err(|e| CoreError::AttachmentCleanupFailed(e.to_string()))?;

        self.db.delete_appointment(&appt.id)?;
        tx.commit().map_err(DbError::from)?;

        info!(serial = %appt.serial, "appointment deleted");
        Ok(())
    }

    /// Get an appointment by id.
    pub fn get_appointment(&self, id: &str) -> Result<Appointment, CoreError> {
        self.load(id)
    }

    /// List appointments matching the filter.
    pub fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, CoreError> {
        Ok(self.db.list_appointments(filter)?)
    }

    /// Appointments overlapping [range_start, range_end), for calendar
    /// rendering.
    pub fn calendar_view(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, CoreError> {
        let range = TimeWindow::new(range_start, range_end)?;
        Ok(self.db.list_overlapping_range(range.start, range.end)?)
    }

    fn load(&self, id: &str) -> Result<Appointment, CoreError> {
        self.db
            .get_appointment(id)?
            .ok_or_else(|| CoreError::NotFound(format!("appointment {}", id)))
    }
}
