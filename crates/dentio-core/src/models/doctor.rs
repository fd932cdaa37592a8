//! Practitioner model.

use serde::{Deserialize, Serialize};

/// A practitioner. Referenced by appointments; never owns them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Internal UUID
    pub id: String,
    pub name: String,
    /// e.g. "orthodontics", "endodontics"
    pub specialization: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Doctor {
    /// Create a new doctor with required fields.
    pub fn new(name: String, phone: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            specialization: None,
            phone,
            email: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
