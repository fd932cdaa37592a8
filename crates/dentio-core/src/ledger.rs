//! Tooth/procedure ledger for one appointment.
//!
//! The ledger owns the procedure records bound to an appointment and their
//! cost accounting. Costs are snapshots: when a procedure references a
//! catalog service, the service's price at that moment is copied onto the
//! procedure and later catalog changes leave it untouched.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::db::Database;
use crate::models::{valid_tooth, Appointment, DentalProcedure};
use crate::CoreError;

/// Mutates and totals the procedure records of appointments.
pub struct ProcedureLedger<'a> {
    db: &'a Database,
}

impl<'a> ProcedureLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a procedure on a tooth.
    ///
    /// When `service_id` is given and `cost_override` is not, the service's
    /// current catalog price becomes the stored cost. An explicit override
    /// always wins. Without a service, the override is required.
    pub fn add_procedure(
        &self,
        appointment_id: &str,
        tooth_number: u8,
        service_id: Option<&str>,
        cost_override: Option<Decimal>,
        notes: Option<String>,
    ) -> Result<DentalProcedure, CoreError> {
        let appointment = self.load_open(appointment_id)?;

        if !valid_tooth(tooth_number) {
            return Err(CoreError::InvalidTooth(tooth_number));
        }

        let cost = match (cost_override, service_id) {
            (Some(cost), _) => cost,
            (None, Some(service_id)) => {
                let service = self
                    .db
                    .get_service(service_id)?
                    .ok_or_else(|| CoreError::NotFound(format!("service {}", service_id)))?;
                service.price
            }
            (None, None) => {
                return Err(CoreError::InvalidCost(
                    "cost is required when no service is referenced".into(),
                ))
            }
        };

        if cost < Decimal::ZERO {
            return Err(CoreError::InvalidCost(format!(
                "cost must not be negative, got {}",
                cost
            )));
        }

        let mut procedure =
            DentalProcedure::new(appointment.id.clone(), tooth_number, cost);
        procedure.service_id = service_id.map(str::to_string);
        procedure.notes = notes;
        self.db.insert_procedure(&procedure)?;

        info!(
            appointment = %appointment.serial,
            tooth = tooth_number,
            cost = %cost,
            "procedure recorded"
        );
        Ok(procedure)
    }

    /// Remove a procedure belonging to the given appointment.
    pub fn remove_procedure(
        &self,
        appointment_id: &str,
        procedure_id: &str,
    ) -> Result<(), CoreError> {
        let appointment = self.load_open(appointment_id)?;

        let procedure = self
            .db
            .get_procedure(procedure_id)?
            .filter(|p| p.appointment_id == appointment.id)
            .ok_or_else(|| CoreError::NotFound(format!("procedure {}", procedure_id)))?;

        self.db.delete_procedure(&procedure.id)?;
        debug!(appointment = %appointment.serial, procedure = %procedure.id, "procedure removed");
        Ok(())
    }

    /// Exact sum of all procedure costs for an appointment.
    pub fn total_cost(&self, appointment_id: &str) -> Result<Decimal, CoreError> {
        let procedures = self.db.list_procedures(appointment_id)?;
        Ok(procedures.iter().map(|p| p.cost).sum())
    }

    /// Procedures for an appointment in creation order.
    pub fn list(&self, appointment_id: &str) -> Result<Vec<DentalProcedure>, CoreError> {
        Ok(self.db.list_procedures(appointment_id)?)
    }

    /// Load the appointment, rejecting mutation of closed ones.
    fn load_open(&self, appointment_id: &str) -> Result<Appointment, CoreError> {
        let appointment = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| CoreError::NotFound(format!("appointment {}", appointment_id)))?;

        if appointment.status.is_closed() {
            return Err(CoreError::AppointmentClosed);
        }
        Ok(appointment)
    }
}
