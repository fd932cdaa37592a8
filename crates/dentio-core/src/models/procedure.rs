//! Dental procedure model with tooth-number validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lowest valid tooth number (universal numbering scheme).
pub const TOOTH_MIN: u8 = 1;
/// Highest valid tooth number (universal numbering scheme).
pub const TOOTH_MAX: u8 = 32;

/// Whether a tooth number falls in the universal 1–32 numbering range.
pub fn valid_tooth(tooth_number: u8) -> bool {
    (TOOTH_MIN..=TOOTH_MAX).contains(&tooth_number)
}

/// A clinical procedure performed on one tooth during one appointment.
///
/// Owned by the appointment and deleted with it. The cost is a snapshot
/// taken when the procedure is recorded; later catalog price changes do
/// not affect it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DentalProcedure {
    /// Internal UUID
    pub id: String,
    /// Owning appointment
    pub appointment_id: String,
    /// Universal numbering, 1–32
    pub tooth_number: u8,
    /// Catalog service this was billed against, if any
    pub service_id: Option<String>,
    /// Cost snapshot (exact decimal)
    pub cost: Decimal,
    pub notes: Option<String>,
    pub created_at: String,
}

impl DentalProcedure {
    /// Create a new procedure record.
    pub fn new(appointment_id: String, tooth_number: u8, cost: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id,
            tooth_number,
            service_id: None,
            cost,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
