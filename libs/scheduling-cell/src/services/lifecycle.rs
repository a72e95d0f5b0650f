// libs/scheduling-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, ConflictKind, SchedulingError};

pub struct AppointmentStatusMachine;

impl AppointmentStatusMachine {
    /// Statuses an appointment may be reached from `from` in a single step.
    pub fn allowed_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;

        match from {
            Scheduled => &[Confirmed, Cancelled, Rescheduled, Declined],
            Confirmed => &[CheckedIn, Cancelled, Rescheduled],
            CheckedIn => &[InProgress, NoShow],
            InProgress => &[Completed, Cancelled],
            Rescheduled => &[Scheduled, Cancelled],
            PendingConfirmation => &[Confirmed, Declined, Cancelled],
            // Terminal states - no transitions allowed
            Completed | Cancelled | NoShow | Declined => &[],
        }
    }

    pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
        Self::allowed_transitions(from).contains(&to)
    }

    /// Statuses a newly created appointment may start in.
    pub fn is_initial(status: AppointmentStatus) -> bool {
        matches!(
            status,
            AppointmentStatus::Scheduled | AppointmentStatus::PendingConfirmation
        )
    }

    pub fn is_terminal(status: AppointmentStatus) -> bool {
        Self::allowed_transitions(status).is_empty()
    }

    /// Unchanged status is a no-op and never checked against the table.
    pub fn validate_transition(
        current: AppointmentStatus,
        requested: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        if current == requested {
            debug!("Status unchanged ({}), skipping transition check", current);
            return Ok(());
        }

        if !Self::can_transition(current, requested) {
            warn!("Invalid status transition attempted: {} -> {}", current, requested);
            return Err(ConflictKind::InvalidTransition {
                from: current,
                to: requested,
            }
            .into());
        }

        debug!("Status transition validated: {} -> {}", current, requested);
        Ok(())
    }
}
