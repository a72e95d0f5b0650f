// libs/scheduling-cell/src/services/availability_conflict.rs
use chrono::NaiveTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{AvailabilityFilter, AvailabilitySlot, AvailabilityType, DayOfWeek};
use crate::services::overlap::overlaps;

/// The parts of a slot that decide whether it collides with another.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCandidate {
    pub provider_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub availability_type: AvailabilityType,
    pub location_id: Option<Uuid>,
    /// Set when the candidate replaces an existing slot, so it is not compared with itself.
    pub exclude_id: Option<i64>,
}

impl SlotCandidate {
    /// Query returning every existing slot this candidate must be compared with.
    ///
    /// OFFLINE slots only compete with OFFLINE slots at the same location;
    /// VIRTUAL slots compete with every VIRTUAL slot of the provider.
    pub fn comparison_filter(&self) -> AvailabilityFilter {
        AvailabilityFilter {
            provider_id: Some(self.provider_id),
            day_of_week: Some(self.day_of_week),
            availability_type: Some(self.availability_type),
            location_id: match self.availability_type {
                AvailabilityType::Offline => self.location_id,
                AvailabilityType::Virtual => None,
            },
            is_active: Some(true),
            exclude_id: self.exclude_id,
        }
    }
}

pub struct AvailabilityConflictChecker;

impl AvailabilityConflictChecker {
    /// Slots among `existing` that illegally overlap the candidate.
    ///
    /// `existing` may be a superset of the relevant slots; the type, location,
    /// day, activity and exclusion rules are re-applied here.
    pub fn find_conflicts<'a>(
        candidate: &SlotCandidate,
        existing: &'a [AvailabilitySlot],
    ) -> Vec<&'a AvailabilitySlot> {
        let filter = candidate.comparison_filter();

        let conflicts: Vec<&AvailabilitySlot> = existing
            .iter()
            .filter(|slot| filter.matches(slot))
            .filter(|slot| {
                overlaps(
                    candidate.start_time,
                    candidate.end_time,
                    slot.start_time,
                    slot.end_time,
                )
            })
            .collect();

        if conflicts.is_empty() {
            debug!(
                "No {} availability conflicts for provider {} on {}",
                candidate.availability_type, candidate.provider_id, candidate.day_of_week
            );
        } else {
            warn!(
                "{} availability {}-{} for provider {} on {} overlaps {} slot(s)",
                candidate.availability_type,
                candidate.start_time.format("%H:%M"),
                candidate.end_time.format("%H:%M"),
                candidate.provider_id,
                candidate.day_of_week,
                conflicts.len()
            );
        }

        conflicts
    }

    pub fn has_conflict(candidate: &SlotCandidate, existing: &[AvailabilitySlot]) -> bool {
        !Self::find_conflicts(candidate, existing).is_empty()
    }
}
