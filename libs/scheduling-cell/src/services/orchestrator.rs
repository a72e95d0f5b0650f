// libs/scheduling-cell/src/services/orchestrator.rs
//
// Accept/reject decisions for appointment and availability mutations.
// Nothing here writes: an approved value is returned for the caller to persist.

use chrono::{Local, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Actor, Appointment, AppointmentStatus, AvailabilityFilter, AvailabilityMatch,
    AvailabilitySlot, AvailabilityType, ConflictKind, CreateAppointmentRequest,
    CreateAvailabilityRequest, NewAppointment, NewAvailabilitySlot, SchedulingError,
    SchedulingRules, UpdateAppointmentRequest, UpdateAvailabilityRequest,
};
use crate::services::availability_conflict::{AvailabilityConflictChecker, SlotCandidate};
use crate::services::conflict::AppointmentConflictChecker;
use crate::services::lifecycle::AppointmentStatusMachine;
use crate::services::time::TimeValidator;
use crate::store::SchedulingStore;

type Today = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct SchedulingOrchestrator<'a, S: SchedulingStore + ?Sized> {
    store: &'a S,
    rules: SchedulingRules,
    today: Today,
}

impl<'a, S: SchedulingStore + ?Sized> SchedulingOrchestrator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            rules: SchedulingRules::default(),
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Pins "today" for past-date checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Box::new(move || today);
        self
    }

    pub fn with_rules(mut self, rules: SchedulingRules) -> Self {
        self.rules = rules;
        self
    }

    // ==============================================================================
    // APPOINTMENTS
    // ==============================================================================

    pub async fn create_appointment(
        &self,
        candidate: CreateAppointmentRequest,
        actor: Option<&Actor>,
    ) -> Result<NewAppointment, SchedulingError> {
        debug!(
            "Validating new appointment for patient {} with provider {} on {}",
            candidate.patient_id, candidate.provider_id, candidate.date
        );

        if let Some(actor) = actor {
            self.ensure_may_act_for(actor, candidate.patient_id, candidate.provider_id)?;
        }

        let status = candidate.status.unwrap_or_default();
        if !AppointmentStatusMachine::is_initial(status) {
            return Err(SchedulingError::Validation(format!(
                "New appointments cannot start in status {}",
                status
            )));
        }

        self.ensure_not_past(candidate.date)?;

        let time = candidate
            .time
            .as_deref()
            .map(Self::parse_appointment_time)
            .transpose()?;

        self.validate_chief_complaint(candidate.chief_complaint.as_deref())?;

        self.ensure_patient(candidate.patient_id).await?;
        self.ensure_provider(candidate.provider_id).await?;

        if let Some(location_id) = candidate.location_id {
            self.ensure_location_for_provider(location_id, candidate.provider_id)
                .await?;
        }

        self.ensure_no_duplicate(candidate.patient_id, candidate.date, None)
            .await?;

        if let Some(time) = time {
            self.ensure_available(
                candidate.provider_id,
                candidate.date,
                time,
                candidate.location_id,
            )
            .await?;
        }

        info!(
            "Appointment approved for patient {} on {}",
            candidate.patient_id, candidate.date
        );

        Ok(NewAppointment {
            date: candidate.date,
            time,
            patient_id: candidate.patient_id,
            provider_id: candidate.provider_id,
            location_id: candidate.location_id,
            chief_complaint: candidate.chief_complaint,
            is_emergency: candidate.is_emergency,
            status,
        })
    }

    /// Re-checks only the rules touched by fields present in `patch`.
    pub async fn update_appointment(
        &self,
        id: i64,
        patch: UpdateAppointmentRequest,
        actor: Option<&Actor>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Validating update of appointment {}", id);

        let current = self.load_appointment(id).await?;
        if let Some(actor) = actor {
            Self::ensure_owner(actor, &current)?;
        }

        if let Some(status) = patch.status {
            AppointmentStatusMachine::validate_transition(current.status, status)?;
        }

        let date = patch.date.unwrap_or(current.date);
        let time = match &patch.time {
            Some(Some(raw)) => Some(Self::parse_appointment_time(raw)?),
            Some(None) => None,
            None => current.time,
        };
        let patient_id = patch.patient_id.unwrap_or(current.patient_id);
        let provider_id = patch.provider_id.unwrap_or(current.provider_id);
        let location_id = patch.location_id.unwrap_or(current.location_id);

        if let Some(actor) = actor {
            self.ensure_may_act_for(actor, patient_id, provider_id)?;
        }

        if patch.date.is_some() {
            self.ensure_not_past(date)?;
        }

        if patch.chief_complaint.is_some() {
            self.validate_chief_complaint(patch.chief_complaint.as_deref())?;
        }

        if patch.patient_id.is_some() {
            self.ensure_patient(patient_id).await?;
        }
        if patch.provider_id.is_some() {
            self.ensure_provider(provider_id).await?;
        }

        let location_touched = patch.location_id.is_some() || patch.provider_id.is_some();
        if let (true, Some(location_id)) = (location_touched, location_id) {
            self.ensure_location_for_provider(location_id, provider_id)
                .await?;
        }

        if patch.date.is_some() || patch.patient_id.is_some() {
            self.ensure_no_duplicate(patient_id, date, Some(current.id))
                .await?;
        }

        let slot_touched = patch.date.is_some()
            || patch.time.is_some()
            || patch.provider_id.is_some()
            || patch.location_id.is_some();
        if let (true, Some(time)) = (slot_touched, time) {
            self.ensure_available(provider_id, date, time, location_id)
                .await?;
        }

        info!("Appointment {} update approved", id);

        Ok(Appointment {
            date,
            time,
            patient_id,
            provider_id,
            location_id,
            chief_complaint: patch.chief_complaint.or(current.chief_complaint),
            is_emergency: patch.is_emergency.unwrap_or(current.is_emergency),
            status: patch.status.unwrap_or(current.status),
            updated_at: Utc::now(),
            ..current
        })
    }

    pub async fn update_status(
        &self,
        id: i64,
        new_status: AppointmentStatus,
        actor: Option<&Actor>,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Validating status change of appointment {} to {}", id, new_status);

        let current = self.load_appointment(id).await?;
        if let Some(actor) = actor {
            Self::ensure_owner(actor, &current)?;
        }

        AppointmentStatusMachine::validate_transition(current.status, new_status)?;

        info!(
            "Appointment {} status change approved: {} -> {}",
            id, current.status, new_status
        );

        Ok(Appointment {
            status: new_status,
            updated_at: Utc::now(),
            ..current
        })
    }

    pub async fn remove_appointment(
        &self,
        id: i64,
        actor: Option<&Actor>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.load_appointment(id).await?;
        if let Some(actor) = actor {
            Self::ensure_owner(actor, &current)?;
        }

        info!("Appointment {} removal approved", id);
        Ok(current)
    }

    /// Current status of an appointment and the statuses it may move to next.
    pub async fn next_statuses(
        &self,
        id: i64,
        actor: Option<&Actor>,
    ) -> Result<(AppointmentStatus, &'static [AppointmentStatus]), SchedulingError> {
        let current = self.load_appointment(id).await?;
        if let Some(actor) = actor {
            Self::ensure_owner(actor, &current)?;
        }

        Ok((
            current.status,
            AppointmentStatusMachine::allowed_transitions(current.status),
        ))
    }

    // ==============================================================================
    // AVAILABILITY
    // ==============================================================================

    pub async fn create_availability(
        &self,
        candidate: CreateAvailabilityRequest,
    ) -> Result<NewAvailabilitySlot, SchedulingError> {
        debug!(
            "Validating new {} availability for provider {} on {}",
            candidate.availability_type, candidate.provider_id, candidate.day_of_week
        );

        let (start_time, end_time) =
            Self::parse_slot_range(&candidate.start_time, &candidate.end_time)?;

        let slot = NewAvailabilitySlot {
            provider_id: candidate.provider_id,
            location_id: candidate.location_id,
            availability_type: candidate.availability_type,
            day_of_week: candidate.day_of_week,
            start_time,
            end_time,
            repeat_type: candidate.repeat_type,
            is_active: candidate.is_active.unwrap_or(true),
        };

        self.validate_slot(&slot, None).await?;

        info!(
            "Availability approved for provider {} on {}",
            slot.provider_id, slot.day_of_week
        );
        Ok(slot)
    }

    /// Validates the fully merged slot, excluding the slot itself from overlap checks.
    pub async fn update_availability(
        &self,
        id: i64,
        patch: UpdateAvailabilityRequest,
        provider_scope: Option<Uuid>,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        debug!("Validating update of availability {}", id);

        let current = self.load_scoped_availability(id, provider_scope).await?;

        let start_raw = patch.start_time.as_deref();
        let end_raw = patch.end_time.as_deref();
        for raw in [start_raw, end_raw].into_iter().flatten() {
            if !TimeValidator::is_valid_time(raw) {
                return Err(SchedulingError::Validation(format!(
                    "Invalid time '{}', expected HH:MM",
                    raw
                )));
            }
        }

        let start_time = start_raw
            .and_then(TimeValidator::parse_time)
            .unwrap_or(current.start_time);
        let end_time = end_raw
            .and_then(TimeValidator::parse_time)
            .unwrap_or(current.end_time);
        if start_time >= end_time {
            return Err(SchedulingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        let slot = NewAvailabilitySlot {
            provider_id: current.provider_id,
            location_id: patch.location_id.unwrap_or(current.location_id),
            availability_type: patch.availability_type.unwrap_or(current.availability_type),
            day_of_week: patch.day_of_week.unwrap_or(current.day_of_week),
            start_time,
            end_time,
            repeat_type: patch.repeat_type.unwrap_or(current.repeat_type.clone()),
            is_active: patch.is_active.unwrap_or(current.is_active),
        };

        self.validate_slot(&slot, Some(current.id)).await?;

        info!("Availability {} update approved", id);

        Ok(AvailabilitySlot {
            location_id: slot.location_id,
            availability_type: slot.availability_type,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
            repeat_type: slot.repeat_type,
            is_active: slot.is_active,
            updated_at: Some(Utc::now()),
            ..current
        })
    }

    pub async fn remove_availability(
        &self,
        id: i64,
        provider_scope: Option<Uuid>,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        let current = self.load_scoped_availability(id, provider_scope).await?;

        info!("Availability {} removal approved", id);
        Ok(current)
    }

    /// Reports how a prospective appointment time matches the provider's slots.
    pub async fn check_availability(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time: &str,
        location_id: Option<Uuid>,
    ) -> Result<AvailabilityMatch, SchedulingError> {
        let time = Self::parse_appointment_time(time)?;
        self.ensure_provider(provider_id).await?;

        AppointmentConflictChecker::new(self.store)
            .is_within_availability(provider_id, date, time, location_id)
            .await
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    fn ensure_not_past(&self, date: NaiveDate) -> Result<(), SchedulingError> {
        let today = (self.today)();
        if date < today {
            warn!("Rejected appointment date {} before today {}", date, today);
            return Err(SchedulingError::Validation(format!(
                "Appointment date {} is in the past",
                date
            )));
        }
        Ok(())
    }

    fn parse_appointment_time(raw: &str) -> Result<NaiveTime, SchedulingError> {
        TimeValidator::parse_time(raw).ok_or_else(|| {
            SchedulingError::Validation(format!("Invalid time '{}', expected HH:MM", raw))
        })
    }

    fn parse_slot_range(start: &str, end: &str) -> Result<(NaiveTime, NaiveTime), SchedulingError> {
        let start_time = Self::parse_appointment_time(start)?;
        let end_time = Self::parse_appointment_time(end)?;

        if !TimeValidator::is_valid_range(start, end) {
            return Err(SchedulingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        Ok((start_time, end_time))
    }

    fn validate_chief_complaint(&self, complaint: Option<&str>) -> Result<(), SchedulingError> {
        match complaint {
            Some(text) if text.chars().count() > self.rules.max_chief_complaint_chars => {
                Err(SchedulingError::Validation(format!(
                    "Chief complaint must be at most {} characters",
                    self.rules.max_chief_complaint_chars
                )))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> Result<(), SchedulingError> {
        match self.store.find_patient(patient_id).await? {
            Some(patient) if !patient.archived => Ok(()),
            Some(_) => Err(SchedulingError::NotFound(format!(
                "Patient {} is archived",
                patient_id
            ))),
            None => Err(SchedulingError::NotFound(format!(
                "Patient {} not found",
                patient_id
            ))),
        }
    }

    async fn ensure_provider(&self, provider_id: Uuid) -> Result<(), SchedulingError> {
        match self.store.find_provider(provider_id).await? {
            Some(provider) if !provider.archived => Ok(()),
            Some(_) => Err(SchedulingError::NotFound(format!(
                "Provider {} is archived",
                provider_id
            ))),
            None => Err(SchedulingError::NotFound(format!(
                "Provider {} not found",
                provider_id
            ))),
        }
    }

    async fn ensure_active_location(&self, location_id: Uuid) -> Result<(), SchedulingError> {
        let location = self
            .store
            .find_location(location_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("Location {} not found", location_id)))?;

        if !location.is_active {
            return Err(SchedulingError::Validation(format!(
                "Location {} is not active",
                location_id
            )));
        }
        Ok(())
    }

    /// Location must be active and the provider must hold an active slot there on some day.
    async fn ensure_location_for_provider(
        &self,
        location_id: Uuid,
        provider_id: Uuid,
    ) -> Result<(), SchedulingError> {
        self.ensure_active_location(location_id).await?;

        let filter = AvailabilityFilter {
            provider_id: Some(provider_id),
            location_id: Some(location_id),
            is_active: Some(true),
            ..Default::default()
        };
        let slots = self.store.find_availability(&filter).await?;

        if !slots.iter().any(|slot| filter.matches(slot)) {
            warn!(
                "Provider {} has no active availability at location {}",
                provider_id, location_id
            );
            return Err(SchedulingError::Validation(format!(
                "Provider {} is not assigned to location {}",
                provider_id, location_id
            )));
        }
        Ok(())
    }

    async fn ensure_no_duplicate(
        &self,
        patient_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<i64>,
    ) -> Result<(), SchedulingError> {
        let duplicate = AppointmentConflictChecker::new(self.store)
            .has_duplicate_same_day(patient_id, date, exclude_id)
            .await?;

        if duplicate {
            return Err(ConflictKind::DuplicateAppointment.into());
        }
        Ok(())
    }

    async fn ensure_available(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        location_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        let result = AppointmentConflictChecker::new(self.store)
            .is_within_availability(provider_id, date, time, location_id)
            .await?;

        match result {
            AvailabilityMatch::Available => Ok(()),
            AvailabilityMatch::NoActiveSlots => Err(ConflictKind::ProviderNotAvailable.into()),
            AvailabilityMatch::OutsideSlots => Err(ConflictKind::TimeOutsideAvailability.into()),
        }
    }

    fn ensure_owner(actor: &Actor, appointment: &Appointment) -> Result<(), SchedulingError> {
        if !actor.owns(appointment) {
            warn!(
                "{:?} {} attempted to access appointment {}",
                actor.role, actor.id, appointment.id
            );
            return Err(SchedulingError::Forbidden(
                "Not authorized to access this appointment".to_string(),
            ));
        }
        Ok(())
    }

    /// Patients book only for themselves and providers only onto their own schedule.
    fn ensure_may_act_for(
        &self,
        actor: &Actor,
        patient_id: Uuid,
        provider_id: Uuid,
    ) -> Result<(), SchedulingError> {
        use crate::models::ActorRole;

        let allowed = match actor.role {
            ActorRole::Patient => patient_id == actor.id,
            ActorRole::Provider => provider_id == actor.id,
            ActorRole::Staff => true,
        };

        if !allowed {
            warn!("{:?} {} attempted to book on behalf of another party", actor.role, actor.id);
            return Err(SchedulingError::Forbidden(
                "Not authorized to book this appointment".to_string(),
            ));
        }
        Ok(())
    }

    async fn load_appointment(&self, id: i64) -> Result<Appointment, SchedulingError> {
        self.store
            .load_appointment(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("Appointment {} not found", id)))
    }

    /// Out-of-scope slots are reported as Forbidden, missing ones as NotFound.
    async fn load_scoped_availability(
        &self,
        id: i64,
        provider_scope: Option<Uuid>,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        if let Some(slot) = self.store.load_availability(id, provider_scope).await? {
            if provider_scope.map_or(true, |provider_id| slot.provider_id == provider_id) {
                return Ok(slot);
            }
        } else if provider_scope.is_none() {
            return Err(SchedulingError::NotFound(format!("Availability {} not found", id)));
        }

        match self.store.load_availability(id, None).await? {
            Some(_) => {
                warn!("Availability {} is outside provider scope {:?}", id, provider_scope);
                Err(SchedulingError::Forbidden(
                    "Not authorized to modify this availability".to_string(),
                ))
            }
            None => Err(SchedulingError::NotFound(format!("Availability {} not found", id))),
        }
    }

    async fn validate_slot(
        &self,
        slot: &NewAvailabilitySlot,
        exclude_id: Option<i64>,
    ) -> Result<(), SchedulingError> {
        match (slot.availability_type, slot.location_id) {
            (AvailabilityType::Offline, None) => {
                return Err(SchedulingError::Validation(
                    "OFFLINE availability requires a location".to_string(),
                ));
            }
            (AvailabilityType::Virtual, Some(_)) => {
                return Err(SchedulingError::Validation(
                    "VIRTUAL availability cannot have a location".to_string(),
                ));
            }
            _ => {}
        }

        if self.store.find_provider(slot.provider_id).await?.is_none() {
            return Err(SchedulingError::NotFound(format!(
                "Provider {} not found",
                slot.provider_id
            )));
        }

        if let Some(location_id) = slot.location_id {
            self.ensure_active_location(location_id).await?;
        }

        if !slot.is_active {
            debug!("Inactive availability skips overlap checks");
            return Ok(());
        }

        let candidate = SlotCandidate {
            provider_id: slot.provider_id,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
            availability_type: slot.availability_type,
            location_id: slot.location_id,
            exclude_id,
        };

        let existing = self
            .store
            .find_availability(&candidate.comparison_filter())
            .await?;

        if AvailabilityConflictChecker::has_conflict(&candidate, &existing) {
            return Err(ConflictKind::SlotOverlap.into());
        }
        Ok(())
    }
}
