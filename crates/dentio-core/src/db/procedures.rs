//! Dental procedure database operations.

use rusqlite::{params, OptionalExtension};

use super::{decode_money, encode_money, Database, DbError, DbResult};
use crate::models::DentalProcedure;

impl Database {
    /// Insert a procedure record.
    pub fn insert_procedure(&self, proc: &DentalProcedure) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO dental_procedures (
                id, appointment_id, tooth_number, service_id, cost, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                proc.id,
                proc.appointment_id,
                proc.tooth_number,
                proc.service_id,
                encode_money(proc.cost),
                proc.notes,
                proc.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a procedure by id.
    pub fn get_procedure(&self, id: &str) -> DbResult<Option<DentalProcedure>> {
        self.conn
            .query_row(
                r#"
                SELECT id, appointment_id, tooth_number, service_id, cost, notes, created_at
                FROM dental_procedures
                WHERE id = ?
                "#,
                [id],
                map_procedure_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List procedures for an appointment, in creation order.
    pub fn list_procedures(&self, appointment_id: &str) -> DbResult<Vec<DentalProcedure>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, appointment_id, tooth_number, service_id, cost, notes, created_at
            FROM dental_procedures
            WHERE appointment_id = ?
            ORDER BY created_at, id
            "#,
        )?;

        let rows = stmt.query_map([appointment_id], map_procedure_row)?;
        let mut procedures = Vec::new();
        for row in rows {
            procedures.push(row?.try_into()?);
        }
        Ok(procedures)
    }

    /// Delete a procedure row.
    pub fn delete_procedure(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM dental_procedures WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ProcedureRow {
    id: String,
    appointment_id: String,
    tooth_number: u8,
    service_id: Option<String>,
    cost: String,
    notes: Option<String>,
    created_at: String,
}

fn map_procedure_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcedureRow> {
    Ok(ProcedureRow {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        tooth_number: row.get(2)?,
        service_id: row.get(3)?,
        cost: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl TryFrom<ProcedureRow> for DentalProcedure {
    type Error = DbError;

    fn try_from(row: ProcedureRow) -> Result<Self, Self::Error> {
        Ok(DentalProcedure {
            id: row.id,
            appointment_id: row.appointment_id,
            tooth_number: row.tooth_number,
            service_id: row.service_id,
            cost: decode_money(&row.cost)?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
