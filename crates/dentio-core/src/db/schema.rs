//! SQLite schema definition.

/// Complete database schema for dentio.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    serial TEXT NOT NULL UNIQUE,                  -- display serial, immutable
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT,
    date_of_birth TEXT,
    gender TEXT,
    address TEXT,
    medical_history TEXT NOT NULL DEFAULT '{}',   -- JSON questionnaire flags
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_last_name ON patients(last_name);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    specialization TEXT,
    phone TEXT NOT NULL,
    email TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Service Price Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS services (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    price TEXT NOT NULL,                          -- canonical decimal text
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_services_active ON services(active);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    serial TEXT NOT NULL UNIQUE,                  -- display serial, immutable
    patient_id TEXT NOT NULL REFERENCES patients(id),
    doctor_id TEXT REFERENCES doctors(id),        -- NULL means unassigned
    assigned_to TEXT,                             -- staff member, audit field
    start_time TEXT NOT NULL,                     -- RFC 3339 UTC, fixed width
    end_time TEXT NOT NULL CHECK (end_time > start_time),
    all_day INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'confirmed', 'in_exam', 'exam_completed', 'completed', 'cancelled')),
    kind TEXT NOT NULL DEFAULT 'reserved'
        CHECK (kind IN ('reserved', 'walk_in')),
    chief_complaints TEXT,
    notes TEXT,
    total_cost TEXT,                              -- frozen ledger total, set on completion
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
CREATE INDEX IF NOT EXISTS idx_appointments_start ON appointments(start_time);

-- ============================================================================
-- Dental Procedures (owned by appointment)
-- ============================================================================

CREATE TABLE IF NOT EXISTS dental_procedures (
    id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL REFERENCES appointments(id) ON DELETE CASCADE,
    tooth_number INTEGER NOT NULL CHECK (tooth_number BETWEEN 1 AND 32),
    service_id TEXT REFERENCES services(id),
    cost TEXT NOT NULL,                           -- snapshot at creation, never a live price
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_procedures_appointment ON dental_procedures(appointment_id);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    serial TEXT NOT NULL UNIQUE,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    appointment_id TEXT REFERENCES appointments(id) ON DELETE SET NULL,
    prescribed_by TEXT,
    lines TEXT NOT NULL DEFAULT '[]',             -- JSON array of PrescriptionLine
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_patient ON prescriptions(patient_id);

-- ============================================================================
-- Attachments (rows only; blobs live with the external store)
-- ============================================================================

CREATE TABLE IF NOT EXISTS attachments (
    id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL REFERENCES appointments(id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    storage_key TEXT NOT NULL,                    -- key in the external store
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_attachments_appointment ON attachments(appointment_id);

-- ============================================================================
-- Sequence Counters (one row per entity kind, atomic increment)
-- ============================================================================

CREATE TABLE IF NOT EXISTS sequence_counters (
    kind TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO sequence_counters (kind, value) VALUES ('patient', 0);
INSERT OR IGNORE INTO sequence_counters (kind, value) VALUES ('appointment', 0);
INSERT OR IGNORE INTO sequence_counters (kind, value) VALUES ('prescription', 0);
"#;
