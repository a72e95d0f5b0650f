// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, SchedulingState};

pub fn scheduling_routes(config: Arc<AppConfig>) -> Router {
    let state = Arc::new(SchedulingState::new(config.clone()));

    // All scheduling operations require authentication
    let protected_routes = Router::new()
        .route("/appointments", post(handlers::create_appointment))
        .route(
            "/appointments/{appointment_id}",
            put(handlers::update_appointment).delete(handlers::delete_appointment),
        )
        .route(
            "/appointments/{appointment_id}/status",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/appointments/{appointment_id}/transitions",
            get(handlers::get_appointment_transitions),
        )
        .route("/availability", post(handlers::create_availability))
        .route("/availability/check", get(handlers::check_availability))
        .route(
            "/availability/{availability_id}",
            put(handlers::update_availability).delete(handlers::delete_availability),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
