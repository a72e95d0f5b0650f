pub mod availability_conflict;
pub mod conflict;
pub mod lifecycle;
pub mod orchestrator;
pub mod overlap;
pub mod time;

pub use availability_conflict::{AvailabilityConflictChecker, SlotCandidate};
pub use conflict::AppointmentConflictChecker;
pub use lifecycle::AppointmentStatusMachine;
pub use orchestrator::SchedulingOrchestrator;
pub use time::TimeValidator;
