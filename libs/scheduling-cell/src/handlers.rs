// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::locks::SchedulingLocks;
use crate::models::{
    Actor, ActorRole, AvailabilityMatch, ConflictKind, CreateAppointmentRequest,
    CreateAvailabilityRequest, SchedulingError, UpdateAppointmentRequest,
    UpdateAvailabilityRequest, UpdateStatusRequest,
};
use crate::services::orchestrator::SchedulingOrchestrator;
use crate::store::{SchedulingStore, SupabaseSchedulingStore};

pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub locks: SchedulingLocks,
}

impl SchedulingState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            locks: SchedulingLocks::new(),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(msg) => AppError::ValidationError(msg),
            SchedulingError::NotFound(msg) => AppError::NotFound(msg),
            SchedulingError::Forbidden(msg) => AppError::Forbidden(msg),
            SchedulingError::Conflict(
                kind @ (ConflictKind::DuplicateAppointment | ConflictKind::SlotOverlap),
            ) => AppError::Conflict(kind.to_string()),
            SchedulingError::Conflict(kind) => AppError::BadRequest(kind.to_string()),
            SchedulingError::Storage(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityCheckQuery {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub location_id: Option<Uuid>,
}

fn actor_for(user: &User) -> Result<Actor, AppError> {
    let role = ActorRole::from_claim(user.role.as_deref()).ok_or_else(|| {
        AppError::Forbidden(format!(
            "Role {:?} is not allowed to use scheduling",
            user.role.as_deref().unwrap_or("none")
        ))
    })?;
    let id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Forbidden("Token subject is not a valid user id".to_string()))?;
    Ok(Actor::new(id, role))
}

/// Providers only see their own slots; patients may not manage availability at all.
fn availability_scope(actor: &Actor) -> Result<Option<Uuid>, AppError> {
    match actor.role {
        ActorRole::Provider => Ok(Some(actor.id)),
        ActorRole::Staff => Ok(None),
        ActorRole::Patient => Err(AppError::Forbidden(
            "Patients cannot manage provider availability".to_string(),
        )),
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor = actor_for(&user)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let _lock = state
        .locks
        .acquire(SchedulingLocks::appointment_key(request.patient_id, request.date))
        .await;

    let approved = SchedulingOrchestrator::new(&store)
        .create_appointment(request, Some(&actor))
        .await?;
    let appointment = store.insert_appointment(&approved).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment created"
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_for(&user)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    // Lock both the day being left and the day being moved to
    let mut keys = Vec::new();
    if let Some(current) = store.load_appointment(appointment_id).await? {
        keys.push(SchedulingLocks::appointment_key(current.patient_id, current.date));
        keys.push(SchedulingLocks::appointment_key(
            request.patient_id.unwrap_or(current.patient_id),
            request.date.unwrap_or(current.date),
        ));
    }
    let _locks = state.locks.acquire_all(keys).await;

    let approved = SchedulingOrchestrator::new(&store)
        .update_appointment(appointment_id, request, Some(&actor))
        .await?;
    let appointment = store.save_appointment(&approved).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated"
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_for(&user)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let approved = SchedulingOrchestrator::new(&store)
        .update_status(appointment_id, request.status, Some(&actor))
        .await?;
    let appointment = store.save_appointment(&approved).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment status is now {}", appointment.status)
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_for(&user)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let approved = SchedulingOrchestrator::new(&store)
        .remove_appointment(appointment_id, Some(&actor))
        .await?;
    store.delete_appointment(approved.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_transitions(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_for(&user)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let (current, allowed) = SchedulingOrchestrator::new(&store)
        .next_statuses(appointment_id, Some(&actor))
        .await?;

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "status": current,
        "allowed_transitions": allowed
    })))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor = actor_for(&user)?;
    if let Some(provider_id) = availability_scope(&actor)? {
        if provider_id != request.provider_id {
            return Err(AppError::Forbidden(
                "Providers can only create their own availability".to_string(),
            ));
        }
    }

    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let _lock = state
        .locks
        .acquire(SchedulingLocks::availability_key(
            request.provider_id,
            request.day_of_week,
            request.location_id,
        ))
        .await;

    let approved = SchedulingOrchestrator::new(&store)
        .create_availability(request)
        .await?;
    let availability = store.insert_availability(&approved).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "availability": availability,
            "message": "Availability created"
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(availability_id): Path<i64>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_for(&user)?;
    let scope = availability_scope(&actor)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let mut keys = Vec::new();
    if let Some(current) = store.load_availability(availability_id, scope).await? {
        keys.push(SchedulingLocks::availability_key(
            current.provider_id,
            current.day_of_week,
            current.location_id,
        ));
        keys.push(SchedulingLocks::availability_key(
            current.provider_id,
            request.day_of_week.unwrap_or(current.day_of_week),
            request.location_id.unwrap_or(current.location_id),
        ));
    }
    let _locks = state.locks.acquire_all(keys).await;

    let approved = SchedulingOrchestrator::new(&store)
        .update_availability(availability_id, request, scope)
        .await?;
    let availability = store.save_availability(&approved).await?;

    Ok(Json(json!({
        "success": true,
        "availability": availability,
        "message": "Availability updated"
    })))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(availability_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_for(&user)?;
    let scope = availability_scope(&actor)?;
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let approved = SchedulingOrchestrator::new(&store)
        .remove_availability(availability_id, scope)
        .await?;
    store.delete_availability(approved.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability deleted"
    })))
}

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let store = SupabaseSchedulingStore::new(&state.config, auth.token());

    let result = SchedulingOrchestrator::new(&store)
        .check_availability(query.provider_id, query.date, &query.time, query.location_id)
        .await?;

    Ok(Json(json!({
        "provider_id": query.provider_id,
        "date": query.date,
        "time": query.time,
        "available": result == AvailabilityMatch::Available,
        "result": result
    })))
}
