//! Prescription models.

use serde::{Deserialize, Serialize};

/// One line of a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionLine {
    /// Medicine name as prescribed
    pub medicine: String,
    /// Dosing regimen (e.g. "1 tablet twice daily after meals")
    pub regimen: String,
    /// Quantity dispensed
    pub quantity: u32,
}

/// A prescription issued to a patient, optionally tied to an appointment.
///
/// Lines are an ordered sequence owned by the prescription and stored
/// with it; deleting the prescription deletes its lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Internal UUID
    pub id: String,
    /// Display serial (e.g. "PRS-000007"), immutable once assigned
    pub serial: String,
    pub patient_id: String,
    /// Appointment this was issued during, if any
    pub appointment_id: Option<String>,
    /// Doctor who prescribed, if recorded
    pub prescribed_by: Option<String>,
    /// Ordered lines
    pub lines: Vec<PrescriptionLine>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Prescription {
    /// Create a new empty prescription.
    pub fn new(serial: String, patient_id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            serial,
            patient_id,
            appointment_id: None,
            prescribed_by: None,
            lines: Vec::new(),
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Append a line, preserving order.
    pub fn add_line(&mut self, medicine: String, regimen: String, quantity: u32) {
        self.lines.push(PrescriptionLine {
            medicine,
            regimen,
            quantity,
        });
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
