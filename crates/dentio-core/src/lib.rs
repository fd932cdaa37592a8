//! Dentio Core Library
//!
//! Scheduling, workflow and procedure-ledger core for a dental clinic's
//! operational record.
//!
//! # Architecture
//!
//! ```text
//! External request
//!        │
//!        ▼
//! AppointmentService ──► ConflictChecker (half-open window overlap,
//!        │                                all-day blocking, per-party)
//!        ├──────────────► SequenceGenerator (PAT-/APT-/PRS- serials,
//!        │                                   atomic counter rows)
//!        ├──────────────► ProcedureLedger (tooth-level costs,
//!        │                                 decimal-exact totals)
//!        └──────────────► workflow (closed status enum +
//!                                   transition table)
//! ```
//!
//! # Core Principles
//!
//! - The availability check and the appointment write commit as **one**
//!   write transaction, so concurrent bookings cannot both pass the check.
//! - Money is exact decimal end to end; never binary floating point.
//! - Status is a closed enumeration with an explicit transition table,
//!   never a free-text field.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence layer and sequence counters
//! - [`models`]: domain types (Patient, Doctor, Appointment, etc.)
//! - [`scheduling`]: conflict checker
//! - [`workflow`]: appointment state machine
//! - [`ledger`]: tooth/procedure ledger
//! - [`service`]: orchestration layer

pub mod db;
pub mod ledger;
pub mod models;
pub mod scheduling;
pub mod service;
pub mod workflow;

// Re-export commonly used types
pub use db::{AppointmentFilter, Database, SequenceKind};
pub use ledger::ProcedureLedger;
pub use models::{
    Appointment, AppointmentKind, AppointmentStatus, Attachment, DentalProcedure, Doctor,
    MedicalHistory, Patient, Prescription, PrescriptionLine, ServiceItem,
};
pub use scheduling::{Conflict, ConflictChecker, PartyKind, TimeWindow};
pub use service::{AppointmentService, AttachmentStore, NewAppointment, NullAttachmentStore};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// Error Taxonomy
// =========================================================================

/// Errors surfaced by the core. All of these are recoverable at the
/// caller; none should crash the process.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid time window: end must be after start")]
    InvalidWindow,

    #[error("scheduling conflict with appointment {appointment_id} ({party} already booked)")]
    SchedulingConflict {
        appointment_id: String,
        party: PartyKind,
    },

    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("appointment is closed to modification")]
    AppointmentClosed,

    #[error("invalid tooth number: {0} (valid range 1-32)")]
    InvalidTooth(u8),

    #[error("invalid cost: {0}")]
    InvalidCost(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("sequence counter unavailable")]
    SequenceUnavailable,

    #[error("attachment cleanup failed: {0}")]
    AttachmentCleanupFailed(String),

    #[error("storage error: {0}")]
    Storage(#[from] db::DbError),
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CoreError::Storage(db::DbError::Constraint(format!("lock poisoned: {}", e)))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe handle over one clinic database, the surface transport
/// layers call into. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

impl ClinicCore {
    /// Open or create a clinic database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let db = Database::open(path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Create an in-memory clinic database (for testing).
    pub fn open_in_memory() -> CoreResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient, minting its display serial.
    pub fn register_patient(
        &self,
        first_name: String,
        last_name: String,
        phone: String,
    ) -> CoreResult<Patient> {
        let db = self.db.lock()?;
        let tx = db.begin_write()?;
        let serial = db
            .next_serial(SequenceKind::Patient)
            .map_err(|_| CoreError::SequenceUnavailable)?;
        let patient = Patient::new(serial, first_name, last_name, phone);
        db.insert_patient(&patient)?;
        tx.commit().map_err(db::DbError::from)?;
        Ok(patient)
    }

    /// Update patient demographics and questionnaire. The serial is
    /// immutable and silently preserved.
    pub fn update_patient(&self, patient: &Patient) -> CoreResult<()> {
        let db = self.db.lock()?;
        if !db.update_patient(patient)? {
            return Err(CoreError::NotFound(format!("patient {}", patient.id)));
        }
        Ok(())
    }

    /// Get a patient by internal id.
    pub fn get_patient(&self, id: &str) -> CoreResult<Option<Patient>> {
        let db = self.db.lock()?;
        Ok(db.get_patient(id)?)
    }

    /// Get a patient by display serial.
    pub fn get_patient_by_serial(&self, serial: &str) -> CoreResult<Option<Patient>> {
        let db = self.db.lock()?;
        Ok(db.get_patient_by_serial(serial)?)
    }

    /// Search patients by last-name prefix.
    pub fn search_patients(&self, query: &str, limit: u32) -> CoreResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.search_patients(query, limit as usize)?)
    }

    /// List all patients ordered by name.
    pub fn list_patients(&self) -> CoreResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?)
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Add a doctor.
    pub fn add_doctor(&self, name: String, phone: String) -> CoreResult<Doctor> {
        let db = self.db.lock()?;
        let doctor = Doctor::new(name, phone);
        db.insert_doctor(&doctor)?;
        Ok(doctor)
    }

    /// Update a doctor.
    pub fn update_doctor(&self, doctor: &Doctor) -> CoreResult<()> {
        let db = self.db.lock()?;
        if !db.update_doctor(doctor)? {
            return Err(CoreError::NotFound(format!("doctor {}", doctor.id)));
        }
        Ok(())
    }

    /// Get a doctor by id.
    pub fn get_doctor(&self, id: &str) -> CoreResult<Option<Doctor>> {
        let db = self.db.lock()?;
        Ok(db.get_doctor(id)?)
    }

    /// List all doctors.
    pub fn list_doctors(&self) -> CoreResult<Vec<Doctor>> {
        let db = self.db.lock()?;
        Ok(db.list_doctors()?)
    }

    // =========================================================================
    // Service Catalog Operations
    // =========================================================================

    /// Add or update a price catalog entry.
    pub fn upsert_service(&self, service: &ServiceItem) -> CoreResult<()> {
        let db = self.db.lock()?;
        db.upsert_service(service)?;
        Ok(())
    }

    /// Get a catalog entry by id.
    pub fn get_service(&self, id: &str) -> CoreResult<Option<ServiceItem>> {
        let db = self.db.lock()?;
        Ok(db.get_service(id)?)
    }

    /// List catalog entries.
    pub fn list_services(&self, active_only: bool) -> CoreResult<Vec<ServiceItem>> {
        let db = self.db.lock()?;
        Ok(db.list_services(active_only)?)
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Create an appointment (conflict-checked, serial-minted, `Draft`).
    pub fn create_appointment(&self, req: NewAppointment) -> CoreResult<Appointment> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).create_appointment(req)
    }

    /// Move an appointment to a new window.
    pub fn reschedule_appointment(
        &self,
        id: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> CoreResult<Appointment> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).reschedule_appointment(id, new_start, new_end)
    }

    /// Apply a workflow transition.
    pub fn change_status(
        &self,
        id: &str,
        target: AppointmentStatus,
        override_completion: bool,
    ) -> CoreResult<Appointment> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).change_status(id, target, override_completion)
    }

    /// Administrative hard delete, cascading to owned rows once the
    /// external store confirms.
    pub fn delete_appointment(
        &self,
        id: &str,
        attachments: &dyn AttachmentStore,
    ) -> CoreResult<()> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).delete_appointment(id, attachments)
    }

    /// Get an appointment by id.
    pub fn get_appointment(&self, id: &str) -> CoreResult<Appointment> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).get_appointment(id)
    }

    /// List appointments matching the filter.
    pub fn list_appointments(&self, filter: &AppointmentFilter) -> CoreResult<Vec<Appointment>> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).list_appointments(filter)
    }

    /// Appointments overlapping a range, for calendar rendering.
    pub fn calendar_view(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> CoreResult<Vec<Appointment>> {
        let db = self.db.lock()?;
        AppointmentService::new(&db).calendar_view(range_start, range_end)
    }

    // =========================================================================
    // Procedure Ledger Operations
    // =========================================================================

    /// Record a procedure on a tooth of an open appointment.
    pub fn add_procedure(
        &self,
        appointment_id: &str,
        tooth_number: u8,
        service_id: Option<&str>,
        cost_override: Option<Decimal>,
        notes: Option<String>,
    ) -> CoreResult<DentalProcedure> {
        let db = self.db.lock()?;
        ProcedureLedger::new(&db).add_procedure(
            appointment_id,
            tooth_number,
            service_id,
            cost_override,
            notes,
        )
    }

    /// Remove a procedure from an open appointment.
    pub fn remove_procedure(&self, appointment_id: &str, procedure_id: &str) -> CoreResult<()> {
        let db = self.db.lock()?;
        ProcedureLedger::new(&db).remove_procedure(appointment_id, procedure_id)
    }

    /// Exact ledger total for an appointment.
    pub fn total_cost(&self, appointment_id: &str) -> CoreResult<Decimal> {
        let db = self.db.lock()?;
        ProcedureLedger::new(&db).total_cost(appointment_id)
    }

    /// Procedures for an appointment in creation order.
    pub fn list_procedures(&self, appointment_id: &str) -> CoreResult<Vec<DentalProcedure>> {
        let db = self.db.lock()?;
        ProcedureLedger::new(&db).list(appointment_id)
    }

    // =========================================================================
    // Attachment Rows
    // =========================================================================

    /// Record an attachment row for a blob held by the external store.
    pub fn record_attachment(
        &self,
        appointment_id: String,
        file_name: String,
        storage_key: String,
    ) -> CoreResult<Attachment> {
        let db = self.db.lock()?;
        let attachment = Attachment::new(appointment_id, file_name, storage_key);
        db.insert_attachment(&attachment)?;
        Ok(attachment)
    }

    /// List attachment rows for an appointment.
    pub fn list_attachments(&self, appointment_id: &str) -> CoreResult<Vec<Attachment>> {
        let db = self.db.lock()?;
        Ok(db.list_attachments(appointment_id)?)
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    /// Issue a prescription, minting its display serial.
    pub fn create_prescription(
        &self,
        patient_id: String,
        appointment_id: Option<String>,
        prescribed_by: Option<String>,
        lines: Vec<PrescriptionLine>,
    ) -> CoreResult<Prescription> {
        let db = self.db.lock()?;
        db.get_patient(&patient_id)?
            .ok_or_else(|| CoreError::NotFound(format!("patient {}", patient_id)))?;

        let tx = db.begin_write()?;
        let serial = db
            .next_serial(SequenceKind::Prescription)
            .map_err(|_| CoreError::SequenceUnavailable)?;
        let mut rx = Prescription::new(serial, patient_id);
        rx.appointment_id = appointment_id;
        rx.prescribed_by = prescribed_by;
        rx.lines = lines;
        db.insert_prescription(&rx)?;
        tx.commit().map_err(db::DbError::from)?;
        Ok(rx)
    }

    /// Get a prescription by id.
    pub fn get_prescription(&self, id: &str) -> CoreResult<Option<Prescription>> {
        let db = self.db.lock()?;
        Ok(db.get_prescription(id)?)
    }

    /// List a patient's prescriptions, newest first.
    pub fn list_prescriptions(&self, patient_id: &str) -> CoreResult<Vec<Prescription>> {
        let db = self.db.lock()?;
        Ok(db.list_prescriptions_for_patient(patient_id)?)
    }

    /// Delete a prescription and its lines.
    pub fn delete_prescription(&self, id: &str) -> CoreResult<()> {
        let db = self.db.lock()?;
        if !db.delete_prescription(id)? {
            return Err(CoreError::NotFound(format!("prescription {}", id)));
        }
        Ok(())
    }
}
