use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, AppointmentState};
use schedule_cell::{schedule_routes, ScheduleState};
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let schedule = ScheduleState::from_config(&config);
    let appointments = AppointmentState::from_config(&config, schedule.availability.clone());

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/schedule", schedule_routes(config.clone(), schedule))
        .nest("/appointments", appointment_routes(config, appointments))
}
