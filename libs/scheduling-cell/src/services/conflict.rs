// libs/scheduling-cell/src/services/conflict.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    AppointmentFilter, AvailabilityFilter, AvailabilityMatch, AvailabilitySlot, DayOfWeek,
    SchedulingError,
};
use crate::services::overlap::contains;
use crate::store::SchedulingStore;

pub struct AppointmentConflictChecker<'a, S: SchedulingStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SchedulingStore + ?Sized> AppointmentConflictChecker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// True if the patient already has any appointment on `date`, other than `exclude_id`.
    pub async fn has_duplicate_same_day(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<i64>,
    ) -> Result<bool, SchedulingError> {
        debug!("Checking same-day appointments for patient {} on {}", patient_id, date);

        let filter = AppointmentFilter {
            patient_id: Some(patient_id),
            date: Some(date),
            exclude_id,
            ..Default::default()
        };

        let existing = self.store.find_appointments(&filter).await?;
        let duplicate = existing.iter().any(|appointment| filter.matches(appointment));

        if duplicate {
            warn!("Patient {} already has an appointment on {}", patient_id, date);
        }

        Ok(duplicate)
    }

    /// Matches `time` against the provider's active slots on the weekday of `date`.
    pub async fn is_within_availability(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        location_id: Option<Uuid>,
    ) -> Result<AvailabilityMatch, SchedulingError> {
        let day_of_week = DayOfWeek::from_date(date);
        debug!(
            "Checking availability for provider {} on {} ({}) at {}",
            provider_id, date, day_of_week, time
        );

        let filter = AvailabilityFilter {
            provider_id: Some(provider_id),
            day_of_week: Some(day_of_week),
            location_id,
            is_active: Some(true),
            ..Default::default()
        };

        let slots = self.store.find_availability(&filter).await?;
        let slots: Vec<AvailabilitySlot> =
            slots.into_iter().filter(|slot| filter.matches(slot)).collect();

        let result = match_time_to_slots(time, &slots);
        if result != AvailabilityMatch::Available {
            warn!(
                "Provider {} unavailable on {} at {}: {:?}",
                provider_id, day_of_week, time, result
            );
        }

        Ok(result)
    }
}

/// Closed-interval match of an appointment time against already filtered slots.
pub fn match_time_to_slots(time: NaiveTime, slots: &[AvailabilitySlot]) -> AvailabilityMatch {
    if slots.is_empty() {
        return AvailabilityMatch::NoActiveSlots;
    }

    if slots
        .iter()
        .any(|slot| contains(time, slot.start_time, slot.end_time))
    {
        AvailabilityMatch::Available
    } else {
        AvailabilityMatch::OutsideSlots
    }
}
