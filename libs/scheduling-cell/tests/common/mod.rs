// libs/scheduling-cell/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AvailabilityFilter, AvailabilitySlot,
    AvailabilityType, DayOfWeek, LocationRecord, PartyRecord, SchedulingError,
};
use scheduling_cell::store::SchedulingStore;

/// Fixed "today" used across orchestrator tests (a Monday).
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[derive(Default)]
pub struct InMemoryStore {
    pub patients: Vec<PartyRecord>,
    pub providers: Vec<PartyRecord>,
    pub locations: Vec<LocationRecord>,
    pub slots: Vec<AvailabilitySlot>,
    pub appointments: Vec<Appointment>,
    pub unavailable: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, id: Uuid, archived: bool) -> Self {
        self.patients.push(PartyRecord { id, archived });
        self
    }

    pub fn with_provider(mut self, id: Uuid, archived: bool) -> Self {
        self.providers.push(PartyRecord { id, archived });
        self
    }

    pub fn with_location(mut self, id: Uuid, is_active: bool) -> Self {
        self.locations.push(LocationRecord { id, is_active });
        self
    }

    pub fn with_slot(mut self, slot: AvailabilitySlot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_appointment(mut self, appointment: Appointment) -> Self {
        self.appointments.push(appointment);
        self
    }

    fn check(&self) -> Result<(), SchedulingError> {
        if self.unavailable {
            return Err(SchedulingError::Storage("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn find_patient(&self, id: Uuid) -> Result<Option<PartyRecord>, SchedulingError> {
        self.check()?;
        Ok(self.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn find_provider(&self, id: Uuid) -> Result<Option<PartyRecord>, SchedulingError> {
        self.check()?;
        Ok(self.providers.iter().find(|p| p.id == id).cloned())
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<LocationRecord>, SchedulingError> {
        self.check()?;
        Ok(self.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn find_availability(
        &self,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        self.check()?;
        Ok(self.slots.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.check()?;
        Ok(self
            .appointments
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn load_appointment(&self, id: i64) -> Result<Option<Appointment>, SchedulingError> {
        self.check()?;
        Ok(self.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn load_availability(
        &self,
        id: i64,
        provider_scope: Option<Uuid>,
    ) -> Result<Option<AvailabilitySlot>, SchedulingError> {
        self.check()?;
        Ok(self
            .slots
            .iter()
            .find(|s| s.id == id && provider_scope.map_or(true, |p| s.provider_id == p))
            .cloned())
    }
}

pub fn slot(
    id: i64,
    provider_id: Uuid,
    availability_type: AvailabilityType,
    location_id: Option<Uuid>,
    day_of_week: DayOfWeek,
    start: NaiveTime,
    end: NaiveTime,
) -> AvailabilitySlot {
    AvailabilitySlot {
        id,
        provider_id,
        location_id,
        availability_type,
        day_of_week,
        start_time: start,
        end_time: end,
        repeat_type: Some("WEEKLY".to_string()),
        is_active: true,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

pub fn appointment(
    id: i64,
    patient_id: Uuid,
    provider_id: Uuid,
    on: NaiveDate,
    time: Option<NaiveTime>,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id,
        uuid: Uuid::new_v4(),
        date: on,
        time,
        patient_id,
        provider_id,
        location_id: None,
        chief_complaint: Some("Persistent cough".to_string()),
        is_emergency: false,
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
