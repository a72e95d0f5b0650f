// libs/scheduling-cell/src/store/mod.rs
pub mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentFilter, AvailabilityFilter, AvailabilitySlot, LocationRecord,
    PartyRecord, SchedulingError,
};

pub use supabase::SupabaseSchedulingStore;

/// Read access to the records the scheduling rules are checked against.
///
/// Each call inside one orchestrator operation is expected to see a consistent
/// snapshot; nothing here locks across requests.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn find_patient(&self, id: Uuid) -> Result<Option<PartyRecord>, SchedulingError>;

    async fn find_provider(&self, id: Uuid) -> Result<Option<PartyRecord>, SchedulingError>;

    async fn find_location(&self, id: Uuid) -> Result<Option<LocationRecord>, SchedulingError>;

    async fn find_availability(
        &self,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError>;

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    async fn load_appointment(&self, id: i64) -> Result<Option<Appointment>, SchedulingError>;

    /// With `provider_scope` set, slots owned by other providers are not returned.
    async fn load_availability(
        &self,
        id: i64,
        provider_scope: Option<Uuid>,
    ) -> Result<Option<AvailabilitySlot>, SchedulingError>;
}
