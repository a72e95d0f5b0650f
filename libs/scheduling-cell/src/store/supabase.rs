// libs/scheduling-cell/src/store/supabase.rs
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header::HeaderMap, header::HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentFilter, AvailabilityFilter, AvailabilitySlot, LocationRecord,
    NewAppointment, NewAvailabilitySlot, PartyRecord, SchedulingError,
};
use crate::store::SchedulingStore;

const PATIENTS: &str = "/rest/v1/patients";
const PROVIDERS: &str = "/rest/v1/providers";
const LOCATIONS: &str = "/rest/v1/locations";
const AVAILABILITY: &str = "/rest/v1/provider_availability";
const APPOINTMENTS: &str = "/rest/v1/appointments";

/// PostgREST-backed store. Built per request so every query runs with the caller's token.
pub struct SupabaseSchedulingStore {
    supabase: SupabaseClient,
    auth_token: String,
}

impl SupabaseSchedulingStore {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token: auth_token.to_string(),
        }
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query_parts: &[String],
    ) -> Result<Vec<T>, SchedulingError> {
        let path = if query_parts.is_empty() {
            table.to_string()
        } else {
            format!("{}?{}", table, query_parts.join("&"))
        };

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(&self.auth_token), None)
            .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| SchedulingError::Storage(format!("Failed to parse {} rows: {}", table, e)))
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query_parts: &[String],
    ) -> Result<Option<T>, SchedulingError> {
        let mut parts = query_parts.to_vec();
        parts.push("limit=1".to_string());
        Ok(self.select(table, &parts).await?.into_iter().next())
    }

    async fn write_returning<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Value,
    ) -> Result<T, SchedulingError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(method, path, Some(&self.auth_token), Some(body), Some(headers))
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Write to {} returned no rows", path))?;

        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Storage(format!("Failed to parse written row: {}", e)))
    }

    async fn delete(&self, table: &str, id: i64) -> Result<(), SchedulingError> {
        let path = format!("{}?id=eq.{}", table, id);
        let _: Value = self
            .supabase
            .request(Method::DELETE, &path, Some(&self.auth_token), None)
            .await?;
        Ok(())
    }

    // ==============================================================================
    // WRITES (performed by callers after the orchestrator approves a mutation)
    // ==============================================================================

    pub async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Inserting appointment for patient {}", appointment.patient_id);

        let mut body = to_object(appointment)?;
        body.insert("uuid".to_string(), json!(Uuid::new_v4()));
        stamp(&mut body, true);

        self.write_returning(Method::POST, APPOINTMENTS, Value::Object(body))
            .await
    }

    pub async fn save_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Saving appointment {}", appointment.id);

        let mut body = to_object(appointment)?;
        for key in ["id", "uuid", "created_at"] {
            body.remove(key);
        }
        stamp(&mut body, false);

        let path = format!("{}?id=eq.{}", APPOINTMENTS, appointment.id);
        self.write_returning(Method::PATCH, &path, Value::Object(body))
            .await
    }

    pub async fn delete_appointment(&self, id: i64) -> Result<(), SchedulingError> {
        debug!("Deleting appointment {}", id);
        self.delete(APPOINTMENTS, id).await
    }

    pub async fn insert_availability(
        &self,
        slot: &NewAvailabilitySlot,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        debug!("Inserting availability for provider {}", slot.provider_id);

        let mut body = to_object(slot)?;
        stamp(&mut body, true);

        self.write_returning(Method::POST, AVAILABILITY, Value::Object(body))
            .await
    }

    pub async fn save_availability(
        &self,
        slot: &AvailabilitySlot,
    ) -> Result<AvailabilitySlot, SchedulingError> {
        debug!("Saving availability {}", slot.id);

        let mut body = to_object(slot)?;
        for key in ["id", "created_at"] {
            body.remove(key);
        }
        stamp(&mut body, false);

        let path = format!("{}?id=eq.{}", AVAILABILITY, slot.id);
        self.write_returning(Method::PATCH, &path, Value::Object(body))
            .await
    }

    pub async fn delete_availability(&self, id: i64) -> Result<(), SchedulingError> {
        debug!("Deleting availability {}", id);
        self.delete(AVAILABILITY, id).await
    }
}

#[async_trait]
impl SchedulingStore for SupabaseSchedulingStore {
    async fn find_patient(&self, id: Uuid) -> Result<Option<PartyRecord>, SchedulingError> {
        self.select_one(
            PATIENTS,
            &[format!("id=eq.{}", id), "select=id,archived".to_string()],
        )
        .await
    }

    async fn find_provider(&self, id: Uuid) -> Result<Option<PartyRecord>, SchedulingError> {
        self.select_one(
            PROVIDERS,
            &[format!("id=eq.{}", id), "select=id,archived".to_string()],
        )
        .await
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<LocationRecord>, SchedulingError> {
        self.select_one(
            LOCATIONS,
            &[format!("id=eq.{}", id), "select=id,is_active".to_string()],
        )
        .await
    }

    async fn find_availability(
        &self,
        filter: &AvailabilityFilter,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        let mut query_parts = Vec::new();

        if let Some(provider_id) = filter.provider_id {
            query_parts.push(format!("provider_id=eq.{}", provider_id));
        }
        if let Some(day) = filter.day_of_week {
            query_parts.push(format!("day_of_week=eq.{}", day));
        }
        if let Some(kind) = filter.availability_type {
            query_parts.push(format!("availability_type=eq.{}", kind));
        }
        if let Some(location_id) = filter.location_id {
            query_parts.push(format!("location_id=eq.{}", location_id));
        }
        if let Some(active) = filter.is_active {
            query_parts.push(format!("is_active=is.{}", active));
        }
        if let Some(exclude_id) = filter.exclude_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }
        query_parts.push("order=start_time.asc".to_string());

        self.select(AVAILABILITY, &query_parts).await
    }

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut query_parts = Vec::new();

        if let Some(patient_id) = filter.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(provider_id) = filter.provider_id {
            query_parts.push(format!("provider_id=eq.{}", provider_id));
        }
        if let Some(date) = filter.date {
            query_parts.push(format!("date=eq.{}", date));
        }
        if let Some(exclude_id) = filter.exclude_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        self.select(APPOINTMENTS, &query_parts).await
    }

    async fn load_appointment(&self, id: i64) -> Result<Option<Appointment>, SchedulingError> {
        self.select_one(APPOINTMENTS, &[format!("id=eq.{}", id)]).await
    }

    async fn load_availability(
        &self,
        id: i64,
        provider_scope: Option<Uuid>,
    ) -> Result<Option<AvailabilitySlot>, SchedulingError> {
        let mut query_parts = vec![format!("id=eq.{}", id)];
        if let Some(provider_id) = provider_scope {
            query_parts.push(format!("provider_id=eq.{}", provider_id));
        }

        self.select_one(AVAILABILITY, &query_parts).await
    }
}

fn to_object<T: serde::Serialize>(
    value: &T,
) -> Result<serde_json::Map<String, Value>, SchedulingError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SchedulingError::Storage("Expected a JSON object".to_string())),
        Err(e) => Err(SchedulingError::Storage(e.to_string())),
    }
}

fn stamp(body: &mut serde_json::Map<String, Value>, created: bool) {
    let now = Utc::now().to_rfc3339();
    if created {
        body.insert("created_at".to_string(), json!(now));
    }
    body.insert("updated_at".to_string(), json!(now));
}
