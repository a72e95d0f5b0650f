// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub uuid: Uuid,
    pub date: NaiveDate,
    #[serde(default, with = "hhmm::option")]
    pub time: Option<NaiveTime>,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
    PendingConfirmation,
    Declined,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 10] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
        AppointmentStatus::Rescheduled,
        AppointmentStatus::PendingConfirmation,
        AppointmentStatus::Declined,
    ];
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "SCHEDULED"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::CheckedIn => write!(f, "CHECKED_IN"),
            AppointmentStatus::InProgress => write!(f, "IN_PROGRESS"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::NoShow => write!(f, "NO_SHOW"),
            AppointmentStatus::Rescheduled => write!(f, "RESCHEDULED"),
            AppointmentStatus::PendingConfirmation => write!(f, "PENDING_CONFIRMATION"),
            AppointmentStatus::Declined => write!(f, "DECLINED"),
        }
    }
}

/// Candidate appointment as submitted by a caller. Times stay raw until validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub date: NaiveDate,
    pub time: Option<String>,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
    pub status: Option<AppointmentStatus>,
}

/// Partial update. For `time` and `location_id` an explicit `null` clears the
/// stored value while an absent key leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub time: Option<Option<String>>,
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_id: Option<Option<Uuid>>,
    pub chief_complaint: Option<String>,
    pub is_emergency: Option<bool>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Appointment approved for insertion; identity and audit fields are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub date: NaiveDate,
    #[serde(with = "hhmm::option")]
    pub time: Option<NaiveTime>,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub chief_complaint: Option<String>,
    pub is_emergency: bool,
    pub status: AppointmentStatus,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityType {
    Offline,
    Virtual,
}

impl fmt::Display for AvailabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityType::Offline => write!(f, "OFFLINE"),
            AvailabilityType::Virtual => write!(f, "VIRTUAL"),
        }
    }
}

/// Day of week, numbered ISO-style (Monday first) on the proleptic Gregorian calendar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub availability_type: AvailabilityType,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub repeat_type: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub availability_type: AvailabilityType,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub repeat_type: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub location_id: Option<Option<Uuid>>,
    pub availability_type: Option<AvailabilityType>,
    pub day_of_week: Option<DayOfWeek>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub repeat_type: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Availability slot approved for insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAvailabilitySlot {
    pub provider_id: Uuid,
    pub location_id: Option<Uuid>,
    pub availability_type: AvailabilityType,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub repeat_type: Option<String>,
    pub is_active: bool,
}

/// Outcome of matching a prospective appointment time against a provider's slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityMatch {
    Available,
    NoActiveSlots,
    OutsideSlots,
}

// ==============================================================================
// REFERENCED ENTITIES
// ==============================================================================

/// Existence/archival view of a patient or provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyRecord {
    pub id: Uuid,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationRecord {
    pub id: Uuid,
    pub is_active: bool,
}

// ==============================================================================
// QUERY FILTERS
// ==============================================================================

/// Availability query. Every `None` field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityFilter {
    pub provider_id: Option<Uuid>,
    pub day_of_week: Option<DayOfWeek>,
    pub availability_type: Option<AvailabilityType>,
    pub location_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub exclude_id: Option<i64>,
}

impl AvailabilityFilter {
    pub fn matches(&self, slot: &AvailabilitySlot) -> bool {
        self.provider_id.map_or(true, |id| slot.provider_id == id)
            && self.day_of_week.map_or(true, |day| slot.day_of_week == day)
            && self
                .availability_type
                .map_or(true, |kind| slot.availability_type == kind)
            && self
                .location_id
                .map_or(true, |id| slot.location_id == Some(id))
            && self.is_active.map_or(true, |active| slot.is_active == active)
            && self.exclude_id.map_or(true, |id| slot.id != id)
    }
}

/// Appointment query. Every `None` field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub exclude_id: Option<i64>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.provider_id.map_or(true, |id| appointment.provider_id == id)
            && self.date.map_or(true, |date| appointment.date == date)
            && self.exclude_id.map_or(true, |id| appointment.id != id)
    }
}

// ==============================================================================
// ACTORS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Patient,
    Provider,
    Staff,
}

impl ActorRole {
    /// Missing or unrecognized roles map to `None` and get no access.
    pub fn from_claim(role: Option<&str>) -> Option<Self> {
        match role?.to_ascii_lowercase().as_str() {
            "patient" => Some(ActorRole::Patient),
            "provider" | "doctor" => Some(ActorRole::Provider),
            "admin" | "staff" => Some(ActorRole::Staff),
            _ => None,
        }
    }
}

/// The caller on whose behalf an appointment mutation is made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn owns(&self, appointment: &Appointment) -> bool {
        match self.role {
            ActorRole::Patient => appointment.patient_id == self.id,
            ActorRole::Provider => appointment.provider_id == self.id,
            ActorRole::Staff => true,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictKind {
    #[error("Patient already has an appointment on this day")]
    DuplicateAppointment,

    #[error("Availability overlaps an existing slot")]
    SlotOverlap,

    #[error("Provider has no active availability on this day")]
    ProviderNotAvailable,

    #[error("Requested time is outside the provider's availability")]
    TimeOutsideAvailability,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictKind),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for SchedulingError {
    fn from(err: anyhow::Error) -> Self {
        SchedulingError::Storage(err.to_string())
    }
}

// ==============================================================================
// VALIDATION RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingRules {
    pub max_chief_complaint_chars: usize,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            max_chief_complaint_chars: 500,
        }
    }
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

fn default_true() -> bool {
    true
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `HH:MM` wall-clock times. Reading also accepts `HH:MM:SS` as returned by Postgres `time` columns.
pub mod hhmm {
    use super::*;

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub(crate) fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, FORMAT))
            .map_err(|_| format!("invalid time '{}', expected HH:MM", raw))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.serialize_some(&time.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
