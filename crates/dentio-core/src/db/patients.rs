//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{MedicalHistory, Patient};

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        let history_json = serde_json::to_string(&patient.medical_history)?;

        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, serial, first_name, last_name, phone, email,
                date_of_birth, gender, address, medical_history, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                patient.id,
                patient.serial,
                patient.first_name,
                patient.last_name,
                patient.phone,
                patient.email,
                patient.date_of_birth,
                patient.gender,
                patient.address,
                history_json,
                patient.notes,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient. The serial is immutable and never updated.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let history_json = serde_json::to_string(&patient.medical_history)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                phone = ?4,
                email = ?5,
                date_of_birth = ?6,
                gender = ?7,
                address = ?8,
                medical_history = ?9,
                notes = ?10,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.phone,
                patient.email,
                patient.date_of_birth,
                patient.gender,
                patient.address,
                history_json,
                patient.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by internal id.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", PATIENT_SELECT),
                [id],
                map_patient_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a patient by display serial.
    pub fn get_patient_by_serial(&self, serial: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE serial = ?", PATIENT_SELECT),
                [serial],
                map_patient_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search patients by last name (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE last_name LIKE ? ORDER BY last_name, first_name LIMIT ?",
            PATIENT_SELECT
        ))?;

        let rows = stmt.query_map(params![pattern, limit as i64], map_patient_row)?;
        collect_patients(rows)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY last_name, first_name", PATIENT_SELECT))?;
        let rows = stmt.query_map([], map_patient_row)?;
        collect_patients(rows)
    }
}

const PATIENT_SELECT: &str = r#"
    SELECT id, serial, first_name, last_name, phone, email,
           date_of_birth, gender, address, medical_history, notes,
           created_at, updated_at
    FROM patients
"#;

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    serial: String,
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    address: Option<String>,
    medical_history: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn map_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        serial: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        date_of_birth: row.get(6)?,
        gender: row.get(7)?,
        address: row.get(8)?,
        medical_history: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let medical_history: MedicalHistory = serde_json::from_str(&row.medical_history)?;
        Ok(Patient {
            id: row.id,
            serial: row.serial,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            email: row.email,
            date_of_birth: row.date_of_birth,
            gender: row.gender,
            address: row.address,
            medical_history,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect_patients(
    rows: impl Iterator<Item = rusqlite::Result<PatientRow>>,
) -> DbResult<Vec<Patient>> {
    let mut patients = Vec::new();
    for row in rows {
        patients.push(row?.try_into()?);
    }
    Ok(patients)
}
