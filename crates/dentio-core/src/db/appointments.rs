//! Appointment and attachment database operations.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension};

use super::{decode_money, decode_ts, encode_money, encode_ts, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentKind, AppointmentStatus, Attachment};

/// Optional filters for listing appointments.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// Only appointments ending after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only appointments starting before this instant
    pub to: Option<DateTime<Utc>>,
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appt: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, serial, patient_id, doctor_id, assigned_to,
                start_time, end_time, all_day, status, kind,
                chief_complaints, notes, total_cost, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                appt.id,
                appt.serial,
                appt.patient_id,
                appt.doctor_id,
                appt.assigned_to,
                encode_ts(appt.start_time),
                encode_ts(appt.end_time),
                appt.all_day,
                appt.status.as_str(),
                appt.kind.as_str(),
                appt.chief_complaints,
                appt.notes,
                appt.total_cost.map(encode_money),
                appt.created_at,
                appt.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing appointment. The serial and the owning patient
    /// are immutable and never updated.
    pub fn update_appointment(&self, appt: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                doctor_id = ?2,
                assigned_to = ?3,
                start_time = ?4,
                end_time = ?5,
                all_day = ?6,
                status = ?7,
                kind = ?8,
                chief_complaints = ?9,
                notes = ?10,
                total_cost = ?11,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                appt.id,
                appt.doctor_id,
                appt.assigned_to,
                encode_ts(appt.start_time),
                encode_ts(appt.end_time),
                appt.all_day,
                appt.status.as_str(),
                appt.kind.as_str(),
                appt.chief_complaints,
                appt.notes,
                appt.total_cost.map(encode_money),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by internal id.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", APPOINTMENT_SELECT),
                [id],
                map_appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get an appointment by display serial.
    pub fn get_appointment_by_serial(&self, serial: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("{} WHERE serial = ?", APPOINTMENT_SELECT),
                [serial],
                map_appointment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Active (non-cancelled) appointments for a doctor, excluding one id
    /// when an update re-checks its own slot.
    pub fn list_active_for_doctor(
        &self,
        doctor_id: &str,
        exclude: Option<&str>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE doctor_id = ?1 AND status != 'cancelled' AND id != ?2 ORDER BY start_time",
            APPOINTMENT_SELECT
        ))?;
        let rows = stmt.query_map(params![doctor_id, exclude.unwrap_or("")], map_appointment_row)?;
        collect_appointments(rows)
    }

    /// Active (non-cancelled) appointments for a patient, excluding one id.
    pub fn list_active_for_patient(
        &self,
        patient_id: &str,
        exclude: Option<&str>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE patient_id = ?1 AND status != 'cancelled' AND id != ?2 ORDER BY start_time",
            APPOINTMENT_SELECT
        ))?;
        let rows =
            stmt.query_map(params![patient_id, exclude.unwrap_or("")], map_appointment_row)?;
        collect_appointments(rows)
    }

    /// Appointments whose window overlaps [range_start, range_end), for the
    /// calendar view. Half-open semantics match the conflict checker.
    pub fn list_overlapping_range(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE start_time < ?1 AND end_time > ?2 ORDER BY start_time",
            APPOINTMENT_SELECT
        ))?;
        let rows = stmt.query_map(
            params![encode_ts(range_end), encode_ts(range_start)],
            map_appointment_row,
        )?;
        collect_appointments(rows)
    }

    /// List appointments matching the filter, ordered by start time.
    pub fn list_appointments(&self, filter: &AppointmentFilter) -> DbResult<Vec<Appointment>> {
        let mut sql = format!("{} WHERE 1=1", APPOINTMENT_SELECT);
        let mut args: Vec<Value> = Vec::new();

        if let Some(patient_id) = &filter.patient_id {
            sql.push_str(&format!(" AND patient_id = ?{}", args.len() + 1));
            args.push(Value::Text(patient_id.clone()));
        }
        if let Some(doctor_id) = &filter.doctor_id {
            sql.push_str(&format!(" AND doctor_id = ?{}", args.len() + 1));
            args.push(Value::Text(doctor_id.clone()));
        }
        if let Some(status) = filter.status {
            sql.push_str(&format!(" AND status = ?{}", args.len() + 1));
            args.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND end_time > ?{}", args.len() + 1));
            args.push(Value::Text(encode_ts(from)));
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND start_time < ?{}", args.len() + 1));
            args.push(Value::Text(encode_ts(to)));
        }
        sql.push_str(" ORDER BY start_time");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), map_appointment_row)?;
        collect_appointments(rows)
    }

    /// Delete an appointment row. Owned procedure and attachment rows
    /// cascade at the schema level.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Attachment rows
    // =========================================================================

    /// Insert an attachment row.
    pub fn insert_attachment(&self, attachment: &Attachment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO attachments (id, appointment_id, file_name, storage_key, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                attachment.id,
                attachment.appointment_id,
                attachment.file_name,
                attachment.storage_key,
                attachment.created_at,
            ],
        )?;
        Ok(())
    }

    /// List attachment rows for an appointment.
    pub fn list_attachments(&self, appointment_id: &str) -> DbResult<Vec<Attachment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, appointment_id, file_name, storage_key, created_at
            FROM attachments
            WHERE appointment_id = ?
            ORDER BY created_at
            "#,
        )?;

        let rows = stmt.query_map([appointment_id], |row| {
            Ok(Attachment {
                id: row.get(0)?,
                appointment_id: row.get(1)?,
                file_name: row.get(2)?,
                storage_key: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

const APPOINTMENT_SELECT: &str = r#"
    SELECT id, serial, patient_id, doctor_id, assigned_to,
           start_time, end_time, all_day, status, kind,
           chief_complaints, notes, total_cost, created_at, updated_at
    FROM appointments
"#;

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    serial: String,
    patient_id: String,
    doctor_id: Option<String>,
    assigned_to: Option<String>,
    start_time: String,
    end_time: String,
    all_day: bool,
    status: String,
    kind: String,
    chief_complaints: Option<String>,
    notes: Option<String>,
    total_cost: Option<String>,
    created_at: String,
    updated_at: String,
}

fn map_appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        serial: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        assigned_to: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        all_day: row.get(7)?,
        status: row.get(8)?,
        kind: row.get(9)?,
        chief_complaints: row.get(10)?,
        notes: row.get(11)?,
        total_cost: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = AppointmentStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown appointment status: {}", row.status)))?;
        let kind = AppointmentKind::parse(&row.kind)
            .ok_or_else(|| DbError::Constraint(format!("Unknown appointment kind: {}", row.kind)))?;
        let total_cost = row.total_cost.as_deref().map(decode_money).transpose()?;

        Ok(Appointment {
            id: row.id,
            serial: row.serial,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            assigned_to: row.assigned_to,
            start_time: decode_ts(&row.start_time)?,
            end_time: decode_ts(&row.end_time)?,
            all_day: row.all_day,
            status,
            kind,
            chief_complaints: row.chief_complaints,
            notes: row.notes,
            total_cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect_appointments(
    rows: impl Iterator<Item = rusqlite::Result<AppointmentRow>>,
) -> DbResult<Vec<Appointment>> {
    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(row?.try_into()?);
    }
    Ok(appointments)
}
