// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use schedule_cell::models::parse_calendar_date;
use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentListQuery, AvailableActionsResponse, CreateAppointmentRequest,
    SlotQuery, TransitionRequest,
};
use crate::router::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Conflict(msg) => AppError::Conflict(msg),
            e @ AppointmentError::ForbiddenTransition { .. } => AppError::Forbidden(e.to_string()),
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::NotFound(msg) => AppError::NotFound(msg),
            AppointmentError::Store(msg) => AppError::Database(msg),
        }
    }
}

/// Explicit bounds win; otherwise the window is the booking horizon
/// starting today (or at `from`).
fn slot_window(state: &AppointmentState, query: &SlotQuery) -> Result<(NaiveDate, NaiveDate), AppError> {
    let parse = |value: &str| parse_calendar_date(value).map_err(AppError::ValidationError);

    let from = match query.from.as_deref() {
        Some(value) => parse(value)?,
        None => Utc::now().date_naive(),
    };
    let to = match query.to.as_deref() {
        Some(value) => parse(value)?,
        None => state.booking.rules().window(from).1,
    };

    Ok((from, to))
}

// ==============================================================================
// SLOT RESOLUTION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<AppointmentState>,
    Extension(_actor): Extension<Actor>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let (from, to) = slot_window(&state, &query)?;

    let resolved = state.slots
        .resolve(query.specialist_id, &query.specialty, from, to)
        .await?;

    let slots: BTreeMap<String, _> = resolved
        .into_iter()
        .map(|(date, times)| (date.to_string(), times))
        .collect();

    Ok(Json(json!({
        "specialist_id": query.specialist_id,
        "specialty": query.specialty.trim(),
        "from": from,
        "to": to,
        "slots": slots
    })))
}

pub async fn get_available_days(
    State(state): State<AppointmentState>,
    Extension(_actor): Extension<Actor>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let (from, to) = slot_window(&state, &query)?;

    let days = state.slots
        .available_days(query.specialist_id, &query.specialty, from, to)
        .await?;

    Ok(Json(json!({
        "specialist_id": query.specialist_id,
        "specialty": query.specialty.trim(),
        "days": days
    })))
}

// ==============================================================================
// BOOKING LEDGER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.booking.create(&actor, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment requested"
    }))))
}

pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.list(&actor, &query).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.get(&actor, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

pub async fn get_available_actions(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<AvailableActionsResponse>, AppError> {
    let (appointment, actions) = state.booking.available_actions(&actor, appointment_id).await?;

    Ok(Json(AvailableActionsResponse {
        appointment_id: appointment.id,
        status: appointment.status,
        actions,
    }))
}

#[axum::debug_handler]
pub async fn apply_transition(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let action = request.action();
    let outcome = state.booking.apply_transition(&actor, appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.appointment,
        "clinical_record": outcome.clinical_record,
        "message": format!("Action '{}' applied", action)
    })))
}

// ==============================================================================
// CLINICAL RECORD HANDLERS
// ==============================================================================

pub async fn list_clinical_records(
    State(state): State<AppointmentState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let records = state.records.list(&actor, &query).await?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
    })))
}
