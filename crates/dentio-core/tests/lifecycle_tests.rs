//! Appointment lifecycle integration tests: workflow, ledger and serials
//! exercised together through the public facade.

use chrono::{DateTime, TimeZone, Utc};
use dentio_core::{
    AppointmentKind, AppointmentStatus, ClinicCore, CoreError, NewAppointment,
};
use rust_decimal::Decimal;

// Past-dated windows so the exam start gate is already open.
fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, h, m, 0).unwrap()
}

fn setup() -> (ClinicCore, String, String) {
    let core = ClinicCore::open_in_memory().unwrap();
    let patient = core
        .register_patient("Amina".into(), "Khan".into(), "555-0101".into())
        .unwrap();
    let doctor = core.add_doctor("Dr. Haddad".into(), "555-0200".into()).unwrap();
    (core, patient.id, doctor.id)
}

fn book(core: &ClinicCore, patient_id: &str, doctor_id: &str) -> dentio_core::Appointment {
    core.create_appointment(NewAppointment {
        patient_id: patient_id.into(),
        doctor_id: Some(doctor_id.into()),
        assigned_to: None,
        start_time: at(9, 0),
        end_time: at(9, 30),
        all_day: false,
        kind: AppointmentKind::Reserved,
        chief_complaints: Some("toothache, upper right".into()),
        notes: None,
    })
    .unwrap()
}

#[test]
fn test_full_visit_happy_path() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);
    assert_eq!(appt.status, AppointmentStatus::Draft);

    core.change_status(&appt.id, AppointmentStatus::Confirmed, false)
        .unwrap();
    core.change_status(&appt.id, AppointmentStatus::InExam, false)
        .unwrap();

    core.add_procedure(&appt.id, 3, None, Some(Decimal::new(5000, 2)), None)
        .unwrap();
    core.add_procedure(
        &appt.id,
        14,
        None,
        Some(Decimal::new(7550, 2)),
        Some("composite filling".into()),
    )
    .unwrap();

    core.change_status(&appt.id, AppointmentStatus::ExamCompleted, false)
        .unwrap();
    let done = core
        .change_status(&appt.id, AppointmentStatus::Completed, false)
        .unwrap();

    assert_eq!(done.status, AppointmentStatus::Completed);
    // Ledger total frozen onto the appointment at completion
    assert_eq!(done.total_cost, Some(Decimal::new(12550, 2)));

    let stored = core.get_appointment(&appt.id).unwrap();
    assert_eq!(stored.total_cost, Some(Decimal::new(12550, 2)));
}

#[test]
fn test_stages_cannot_be_skipped() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);

    let err = core
        .change_status(&appt.id, AppointmentStatus::InExam, false)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::IllegalTransition {
            from: AppointmentStatus::Draft,
            to: AppointmentStatus::InExam
        }
    ));

    let err = core
        .change_status(&appt.id, AppointmentStatus::Completed, false)
        .unwrap_err();
    assert!(matches!(err, CoreError::IllegalTransition { .. }));
}

#[test]
fn test_terminal_statuses_are_final() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);

    core.change_status(&appt.id, AppointmentStatus::Cancelled, false)
        .unwrap();

    for target in [
        AppointmentStatus::Draft,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
    ] {
        assert!(matches!(
            core.change_status(&appt.id, target, false),
            Err(CoreError::IllegalTransition { .. })
        ));
    }
}

#[test]
fn test_completion_requires_work_or_override() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);

    core.change_status(&appt.id, AppointmentStatus::Confirmed, false)
        .unwrap();
    core.change_status(&appt.id, AppointmentStatus::InExam, false)
        .unwrap();
    core.change_status(&appt.id, AppointmentStatus::ExamCompleted, false)
        .unwrap();

    // Empty ledger, no override
    assert!(matches!(
        core.change_status(&appt.id, AppointmentStatus::Completed, false),
        Err(CoreError::IllegalTransition { .. })
    ));

    // Override closes it out with a zero total
    let done = core
        .change_status(&appt.id, AppointmentStatus::Completed, true)
        .unwrap();
    assert_eq!(done.total_cost, Some(Decimal::ZERO));
}

#[test]
fn test_ledger_locks_on_completion() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);

    // Mutable while open, even in Draft
    let recorded = core
        .add_procedure(&appt.id, 8, None, Some(Decimal::new(3000, 2)), None)
        .unwrap();

    core.change_status(&appt.id, AppointmentStatus::Confirmed, false)
        .unwrap();
    core.change_status(&appt.id, AppointmentStatus::InExam, false)
        .unwrap();
    core.change_status(&appt.id, AppointmentStatus::ExamCompleted, false)
        .unwrap();
    core.change_status(&appt.id, AppointmentStatus::Completed, false)
        .unwrap();

    assert!(matches!(
        core.add_procedure(&appt.id, 9, None, Some(Decimal::new(1000, 2)), None),
        Err(CoreError::AppointmentClosed)
    ));
    assert!(matches!(
        core.remove_procedure(&appt.id, &recorded.id),
        Err(CoreError::AppointmentClosed)
    ));

    // Reads stay open
    assert_eq!(core.total_cost(&appt.id).unwrap(), Decimal::new(3000, 2));
    assert_eq!(core.list_procedures(&appt.id).unwrap().len(), 1);
}

#[test]
fn test_procedure_costs_snapshot_catalog_prices() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);

    let mut service =
        dentio_core::ServiceItem::new("Root canal".into(), Decimal::new(30000, 2));
    core.upsert_service(&service).unwrap();

    let recorded = core
        .add_procedure(&appt.id, 19, Some(&service.id), None, None)
        .unwrap();
    assert_eq!(recorded.cost, Decimal::new(30000, 2));

    service.price = Decimal::new(35000, 2);
    core.upsert_service(&service).unwrap();

    assert_eq!(core.total_cost(&appt.id).unwrap(), Decimal::new(30000, 2));
}

#[test]
fn test_walk_in_can_start_exam_immediately() {
    let (core, patient_id, doctor_id) = setup();

    // Far-future window; a reserved appointment could not enter the exam yet
    let future = Utc::now() + chrono::Duration::days(30);
    let appt = core
        .create_appointment(NewAppointment {
            patient_id: patient_id.clone(),
            doctor_id: Some(doctor_id.clone()),
            assigned_to: None,
            start_time: future,
            end_time: future + chrono::Duration::minutes(30),
            all_day: false,
            kind: AppointmentKind::WalkIn,
            chief_complaints: None,
            notes: None,
        })
        .unwrap();

    core.change_status(&appt.id, AppointmentStatus::Confirmed, false)
        .unwrap();
    let in_exam = core
        .change_status(&appt.id, AppointmentStatus::InExam, false)
        .unwrap();
    assert_eq!(in_exam.status, AppointmentStatus::InExam);
}

#[test]
fn test_reserved_exam_blocked_before_window() {
    let (core, patient_id, doctor_id) = setup();

    let future = Utc::now() + chrono::Duration::days(30);
    let appt = core
        .create_appointment(NewAppointment {
            patient_id,
            doctor_id: Some(doctor_id),
            assigned_to: None,
            start_time: future,
            end_time: future + chrono::Duration::minutes(30),
            all_day: false,
            kind: AppointmentKind::Reserved,
            chief_complaints: None,
            notes: None,
        })
        .unwrap();

    core.change_status(&appt.id, AppointmentStatus::Confirmed, false)
        .unwrap();
    assert!(matches!(
        core.change_status(&appt.id, AppointmentStatus::InExam, false),
        Err(CoreError::IllegalTransition { .. })
    ));
}

#[test]
fn test_serials_are_unique_under_concurrency() {
    let core = ClinicCore::open_in_memory().unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let core = core.clone();
        handles.push(std::thread::spawn(move || {
            let mut serials = Vec::new();
            for j in 0..5 {
                let p = core
                    .register_patient(
                        format!("First{i}"),
                        format!("Last{j}"),
                        "555".into(),
                    )
                    .unwrap();
                serials.push(p.serial);
            }
            serials
        }));
    }

    let mut all: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(all.len(), 40);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 40, "duplicate serials were minted");
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    let patient_id = {
        let core = ClinicCore::open(&path).unwrap();
        let patient = core
            .register_patient("Amina".into(), "Khan".into(), "555-0101".into())
            .unwrap();
        assert_eq!(patient.serial, "PAT-000001");
        patient.id
    };

    let core = ClinicCore::open(&path).unwrap();
    let stored = core.get_patient(&patient_id).unwrap().unwrap();
    assert_eq!(stored.serial, "PAT-000001");

    // Serial counter continues where it left off
    let next = core
        .register_patient("Omar".into(), "Said".into(), "555-0102".into())
        .unwrap();
    assert_eq!(next.serial, "PAT-000002");
}

#[test]
fn test_cancelled_appointment_retained_for_audit() {
    let (core, patient_id, doctor_id) = setup();
    let appt = book(&core, &patient_id, &doctor_id);

    core.change_status(&appt.id, AppointmentStatus::Cancelled, false)
        .unwrap();

    // Cancelled rows are retained for audit and still filterable
    let filter = dentio_core::AppointmentFilter {
        patient_id: Some(patient_id),
        doctor_id: None,
        status: Some(AppointmentStatus::Cancelled),
        from: None,
        to: None,
    };
    let cancelled = core.list_appointments(&filter).unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, appt.id);
}
