//! Doctor database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Doctor;

impl Database {
    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (id, name, specialization, phone, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.specialization,
                doctor.phone,
                doctor.email,
                doctor.created_at,
                doctor.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing doctor.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET
                name = ?2,
                specialization = ?3,
                phone = ?4,
                email = ?5,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.specialization,
                doctor.phone,
                doctor.email,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a doctor by id.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, specialization, phone, email, created_at, updated_at
                FROM doctors
                WHERE id = ?
                "#,
                [id],
                map_doctor_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all doctors.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, specialization, phone, email, created_at, updated_at
            FROM doctors
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([], map_doctor_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn map_doctor_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
