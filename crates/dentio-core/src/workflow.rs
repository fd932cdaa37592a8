//! Appointment status state machine.
//!
//! The transition table is the single authority on workflow legality.
//! Callers go through [`ensure_transition`]; nothing else may move an
//! appointment between statuses.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentKind, AppointmentStatus};
use crate::CoreError;

/// Facts about the appointment the preconditions need, gathered by the
/// caller before the transition is attempted.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub now: DateTime<Utc>,
    /// Number of procedures currently on the ledger
    pub procedure_count: usize,
    /// Explicit override for completing with an empty ledger
    pub override_completion: bool,
}

impl TransitionContext {
    pub fn new(now: DateTime<Utc>, procedure_count: usize) -> Self {
        Self {
            now,
            procedure_count,
            override_completion: false,
        }
    }
}

/// All statuses reachable from `from` in one step. Terminal statuses
/// return the empty slice.
pub fn valid_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;
    match from {
        Draft => &[Confirmed, Cancelled],
        Confirmed => &[InExam, Cancelled],
        InExam => &[ExamCompleted, Cancelled],
        ExamCompleted => &[Completed, Cancelled],
        Completed | Cancelled => &[],
    }
}

/// Check table legality only, ignoring preconditions.
pub fn check_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), CoreError> {
    debug!(%from, %to, "validating status transition");
    if valid_transitions(from).contains(&to) {
        Ok(())
    } else {
        warn!(%from, %to, "illegal status transition attempted");
        Err(CoreError::IllegalTransition { from, to })
    }
}

/// Check that the transition is legal for this appointment right now,
/// table and preconditions both.
pub fn ensure_transition(
    appt: &Appointment,
    target: AppointmentStatus,
    ctx: &TransitionContext,
) -> Result<(), CoreError> {
    check_transition(appt.status, target)?;

    match (appt.status, target) {
        // Soft start-time gate; walk-ins are seen whenever a chair frees up.
        (AppointmentStatus::Confirmed, AppointmentStatus::InExam) => {
            if appt.kind == AppointmentKind::Reserved && ctx.now < appt.start_time {
                warn!(
                    serial = %appt.serial,
                    start = %appt.start_time,
                    "exam cannot start before the appointment window"
                );
                return Err(CoreError::IllegalTransition {
                    from: appt.status,
                    to: target,
                });
            }
        }
        // Closing out requires work on the ledger unless explicitly overridden.
        (AppointmentStatus::ExamCompleted, AppointmentStatus::Completed) => {
            if ctx.procedure_count == 0 && !ctx.override_completion {
                warn!(
                    serial = %appt.serial,
                    "completion refused: empty procedure ledger and no override"
                );
                return Err(CoreError::IllegalTransition {
                    from: appt.status,
                    to: target,
                });
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_appointment(status: AppointmentStatus, kind: AppointmentKind) -> Appointment {
        let mut appt = Appointment::new(
            "APT-000001".into(),
            "patient-1".into(),
            Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0).unwrap(),
            kind,
        );
        appt.status = status;
        appt
    }

    #[test]
    fn test_full_transition_table() {
        use AppointmentStatus::*;
        let all = [Draft, Confirmed, InExam, ExamCompleted, Completed, Cancelled];
        let legal = [
            (Draft, Confirmed),
            (Draft, Cancelled),
            (Confirmed, InExam),
            (Confirmed, Cancelled),
            (InExam, ExamCompleted),
            (InExam, Cancelled),
            (ExamCompleted, Completed),
            (ExamCompleted, Cancelled),
        ];

        for from in all {
            for to in all {
                let expected = legal.contains(&(from, to));
                let actual = check_transition(from, to).is_ok();
                assert_eq!(actual, expected, "transition {from} -> {to}");
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        assert!(valid_transitions(AppointmentStatus::Completed).is_empty());
        assert!(valid_transitions(AppointmentStatus::Cancelled).is_empty());
    }

    #[test]
    fn test_draft_cannot_skip_to_in_exam() {
        let err = check_transition(AppointmentStatus::Draft, AppointmentStatus::InExam)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::IllegalTransition {
                from: AppointmentStatus::Draft,
                to: AppointmentStatus::InExam
            }
        ));
    }

    #[test]
    fn test_reserved_exam_waits_for_start_time() {
        let appt = make_appointment(AppointmentStatus::Confirmed, AppointmentKind::Reserved);

        let before = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        let ctx = TransitionContext::new(before, 0);
        assert!(ensure_transition(&appt, AppointmentStatus::InExam, &ctx).is_err());

        let at_start = appt.start_time;
        let ctx = TransitionContext::new(at_start, 0);
        assert!(ensure_transition(&appt, AppointmentStatus::InExam, &ctx).is_ok());
    }

    #[test]
    fn test_walk_in_exam_starts_any_time() {
        let appt = make_appointment(AppointmentStatus::Confirmed, AppointmentKind::WalkIn);

        let before = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        let ctx = TransitionContext::new(before, 0);
        assert!(ensure_transition(&appt, AppointmentStatus::InExam, &ctx).is_ok());
    }

    #[test]
    fn test_completion_requires_procedures_or_override() {
        let appt = make_appointment(AppointmentStatus::ExamCompleted, AppointmentKind::Reserved);
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 10, 0, 0).unwrap();

        // Empty ledger, no override
        let ctx = TransitionContext::new(now, 0);
        assert!(ensure_transition(&appt, AppointmentStatus::Completed, &ctx).is_err());

        // Empty ledger, explicit override
        let mut ctx = TransitionContext::new(now, 0);
        ctx.override_completion = true;
        assert!(ensure_transition(&appt, AppointmentStatus::Completed, &ctx).is_ok());

        // One procedure, no override
        let ctx = TransitionContext::new(now, 1);
        assert!(ensure_transition(&appt, AppointmentStatus::Completed, &ctx).is_ok());
    }

    #[test]
    fn test_cancel_needs_no_preconditions() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        for status in [
            AppointmentStatus::Draft,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InExam,
            AppointmentStatus::ExamCompleted,
        ] {
            let appt = make_appointment(status, AppointmentKind::Reserved);
            let ctx = TransitionContext::new(now, 0);
            assert!(ensure_transition(&appt, AppointmentStatus::Cancelled, &ctx).is_ok());
        }
    }
}
