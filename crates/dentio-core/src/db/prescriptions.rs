//! Prescription database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Prescription, PrescriptionLine};

impl Database {
    /// Insert a new prescription with its lines.
    pub fn insert_prescription(&self, rx: &Prescription) -> DbResult<()> {
        let lines_json = serde_json::to_string(&rx.lines)?;

        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                id, serial, patient_id, appointment_id, prescribed_by,
                lines, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                rx.id,
                rx.serial,
                rx.patient_id,
                rx.appointment_id,
                rx.prescribed_by,
                lines_json,
                rx.notes,
                rx.created_at,
                rx.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update a prescription's lines and notes.
    pub fn update_prescription(&self, rx: &Prescription) -> DbResult<bool> {
        let lines_json = serde_json::to_string(&rx.lines)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE prescriptions SET
                prescribed_by = ?2,
                lines = ?3,
                notes = ?4,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![rx.id, rx.prescribed_by, lines_json, rx.notes],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a prescription by id.
    pub fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", PRESCRIPTION_SELECT),
                [id],
                map_prescription_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List prescriptions for a patient, newest first.
    pub fn list_prescriptions_for_patient(&self, patient_id: &str) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE patient_id = ? ORDER BY created_at DESC",
            PRESCRIPTION_SELECT
        ))?;

        let rows = stmt.query_map([patient_id], map_prescription_row)?;
        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }

    /// Delete a prescription; its lines live in the same row and go with it.
    pub fn delete_prescription(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

const PRESCRIPTION_SELECT: &str = r#"
    SELECT id, serial, patient_id, appointment_id, prescribed_by,
           lines, notes, created_at, updated_at
    FROM prescriptions
"#;

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    id: String,
    serial: String,
    patient_id: String,
    appointment_id: Option<String>,
    prescribed_by: Option<String>,
    lines: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn map_prescription_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        serial: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_id: row.get(3)?,
        prescribed_by: row.get(4)?,
        lines: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let lines: Vec<PrescriptionLine> = serde_json::from_str(&row.lines)?;
        Ok(Prescription {
            id: row.id,
            serial: row.serial,
            patient_id: row.patient_id,
            appointment_id: row.appointment_id,
            prescribed_by: row.prescribed_by,
            lines,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    fn setup_db() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("PAT-000001".into(), "A".into(), "B".into(), "555".into());
        db.insert_patient(&patient).unwrap();
        (db, patient.id)
    }

    #[test]
    fn test_insert_and_get_with_lines() {
        let (db, patient_id) = setup_db();

        let mut rx = Prescription::new("PRS-000001".into(), patient_id);
        rx.add_line("Amoxicillin 500mg".into(), "1 capsule 3x daily".into(), 21);
        rx.add_line("Ibuprofen 400mg".into(), "1 tablet as needed".into(), 10);
        db.insert_prescription(&rx).unwrap();

        let retrieved = db.get_prescription(&rx.id).unwrap().unwrap();
        assert_eq!(retrieved.lines.len(), 2);
        assert_eq!(retrieved.lines[0].medicine, "Amoxicillin 500mg");
        assert_eq!(retrieved.lines[1].quantity, 10);
    }

    #[test]
    fn test_list_for_patient() {
        let (db, patient_id) = setup_db();

        db.insert_prescription(&Prescription::new("PRS-000001".into(), patient_id.clone()))
            .unwrap();
        db.insert_prescription(&Prescription::new("PRS-000002".into(), patient_id.clone()))
            .unwrap();

        let listed = db.list_prescriptions_for_patient(&patient_id).unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn test_delete_removes_lines_with_it() {
        let (db, patient_id) = setup_db();

        let mut rx = Prescription::new("PRS-000001".into(), patient_id.clone());
        rx.add_line("Metronidazole 400mg".into(), "1 tablet 2x daily".into(), 14);
        db.insert_prescription(&rx).unwrap();

        assert!(db.delete_prescription(&rx.id).unwrap());
        assert!(db.get_prescription(&rx.id).unwrap().is_none());
        assert!(db.list_prescriptions_for_patient(&patient_id).unwrap().is_empty());
    }
}
