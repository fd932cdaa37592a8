//! Patient models.

use serde::{Deserialize, Serialize};

/// One yes/no answer on the medical questionnaire, with an optional note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuestionnaireFlag {
    pub answer: bool,
    pub note: Option<String>,
}

impl QuestionnaireFlag {
    pub fn yes(note: impl Into<String>) -> Self {
        Self {
            answer: true,
            note: Some(note.into()),
        }
    }
}

/// The fixed set of medical-questionnaire flags collected at registration.
///
/// Stored as a single JSON column; the set of questions is closed, so this
/// is a struct rather than a free-form map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MedicalHistory {
    pub heart_condition: QuestionnaireFlag,
    pub diabetes: QuestionnaireFlag,
    pub hypertension: QuestionnaireFlag,
    pub bleeding_disorder: QuestionnaireFlag,
    pub drug_allergies: QuestionnaireFlag,
    pub pregnancy: QuestionnaireFlag,
}

impl MedicalHistory {
    /// True if any flag is set — used by callers to surface a chart warning.
    pub fn any_flagged(&self) -> bool {
        self.heart_condition.answer
            || self.diabetes.answer
            || self.hypertension.answer
            || self.bleeding_disorder.answer
            || self.drug_allergies.answer
            || self.pregnancy.answer
    }
}

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Internal UUID
    pub id: String,
    /// Display serial (e.g. "PAT-000042"), immutable once assigned
    pub serial: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    /// Medical questionnaire answers
    pub medical_history: MedicalHistory,
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(serial: String, first_name: String, last_name: String, phone: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            serial,
            first_name,
            last_name,
            phone,
            email: None,
            date_of_birth: None,
            gender: None,
            address: None,
            medical_history: MedicalHistory::default(),
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
