// libs/schedule-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{AddSpecialtyRequest, AvailabilityError, SetTemplateRequest, TemplateResponse};
use crate::router::ScheduleState;

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation(msg) => AppError::ValidationError(msg),
            AvailabilityError::NotFound(msg) => AppError::NotFound(msg),
            AvailabilityError::Store(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// WEEKLY TEMPLATE HANDLERS
// ==============================================================================

pub async fn get_template(
    State(state): State<ScheduleState>,
    Extension(_actor): Extension<Actor>,
    Path(specialist_id): Path<Uuid>,
) -> Result<Json<TemplateResponse>, AppError> {
    let templates = state.availability.get_template(specialist_id).await?;

    Ok(Json(TemplateResponse { specialist_id, templates }))
}

/// Only the specialist themself or an administrator may replace a template.
pub async fn set_template(
    State(state): State<ScheduleState>,
    Extension(actor): Extension<Actor>,
    Path(specialist_id): Path<Uuid>,
    Json(request): Json<SetTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    let allowed = match &actor {
        Actor::Specialist { id, .. } => *id == specialist_id,
        Actor::Administrator { .. } => true,
        Actor::Patient { .. } => false,
    };

    if !allowed {
        warn!("{} {} tried to edit the template of specialist {}", actor.role(), actor.id(), specialist_id);
        return Err(AppError::Forbidden("Not authorized to edit this specialist's schedule".to_string()));
    }

    let templates = state.availability.set_template(specialist_id, request.templates).await?;

    Ok(Json(TemplateResponse { specialist_id, templates }))
}

// ==============================================================================
// SPECIALTY CATALOG HANDLERS
// ==============================================================================

pub async fn list_specialties(
    State(state): State<ScheduleState>,
    Extension(_actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let specialties = state.specialties.list().await?;

    Ok(Json(json!({
        "specialties": specialties,
        "total": specialties.len()
    })))
}

pub async fn add_specialty(
    State(state): State<ScheduleState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<AddSpecialtyRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if matches!(actor, Actor::Patient { .. }) {
        return Err(AppError::Forbidden("Patients cannot register specialties".to_string()));
    }

    let name = state.specialties.add(&request.name).await?;

    Ok((StatusCode::CREATED, Json(json!({ "name": name }))))
}
