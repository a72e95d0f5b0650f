// libs/scheduling-cell/tests/lifecycle_test.rs

use assert_matches::assert_matches;

use scheduling_cell::models::{AppointmentStatus, ConflictKind, SchedulingError};
use scheduling_cell::services::lifecycle::AppointmentStatusMachine;

use AppointmentStatus::*;

#[test]
fn test_terminal_states_have_no_transitions() {
    for terminal in [Completed, Cancelled, NoShow, Declined] {
        assert!(AppointmentStatusMachine::is_terminal(terminal));
        for to in AppointmentStatus::ALL {
            assert!(
                !AppointmentStatusMachine::can_transition(terminal, to),
                "{} -> {} should be rejected",
                terminal,
                to
            );
        }
    }
}

#[test]
fn test_transition_table() {
    let expected: [(AppointmentStatus, &[AppointmentStatus]); 6] = [
        (Scheduled, &[Confirmed, Cancelled, Rescheduled, Declined]),
        (Confirmed, &[CheckedIn, Cancelled, Rescheduled]),
        (CheckedIn, &[InProgress, NoShow]),
        (InProgress, &[Completed, Cancelled]),
        (Rescheduled, &[Scheduled, Cancelled]),
        (PendingConfirmation, &[Confirmed, Declined, Cancelled]),
    ];

    for (from, allowed) in expected {
        for to in AppointmentStatus::ALL {
            assert_eq!(
                AppointmentStatusMachine::can_transition(from, to),
                allowed.contains(&to),
                "unexpected result for {} -> {}",
                from,
                to
            );
        }
    }
}

#[test]
fn test_specific_transitions() {
    assert!(AppointmentStatusMachine::can_transition(Scheduled, Confirmed));
    assert!(!AppointmentStatusMachine::can_transition(Scheduled, Completed));
    assert!(!AppointmentStatusMachine::can_transition(Confirmed, InProgress));
    assert!(!AppointmentStatusMachine::can_transition(Scheduled, Scheduled));
}

#[test]
fn test_initial_states() {
    let initial: Vec<_> = AppointmentStatus::ALL
        .into_iter()
        .filter(|s| AppointmentStatusMachine::is_initial(*s))
        .collect();
    assert_eq!(initial, vec![Scheduled, PendingConfirmation]);
}

#[test]
fn test_validate_transition_treats_same_status_as_noop() {
    for status in AppointmentStatus::ALL {
        assert!(AppointmentStatusMachine::validate_transition(status, status).is_ok());
    }
}

#[test]
fn test_validate_transition_reports_both_ends() {
    let err = AppointmentStatusMachine::validate_transition(Completed, Scheduled).unwrap_err();
    assert_matches!(
        err,
        SchedulingError::Conflict(ConflictKind::InvalidTransition { from: Completed, to: Scheduled })
    );
}

#[test]
fn test_status_wire_names() {
    assert_eq!(serde_json::to_string(&PendingConfirmation).unwrap(), "\"PENDING_CONFIRMATION\"");
    assert_eq!(serde_json::from_str::<AppointmentStatus>("\"CHECKED_IN\"").unwrap(), CheckedIn);
    assert_eq!(AppointmentStatus::default(), Scheduled);
}
