// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use schedule_cell::models::parse_calendar_date;
use shared_models::auth::Actor;

use crate::models::{
    Action, Appointment, AppointmentError, AppointmentFilter, AppointmentListQuery,
    CreateAppointmentRequest, NewAppointment, TransitionRequest, TransitionResponse,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::slots::SlotResolverService;
use crate::store::AppointmentStore;

/// Longest accepted booking horizon, roughly ten years.
pub const MAX_BOOKING_HORIZON_DAYS: i64 = 3650;

/// Bookable window: `today` up to, but excluding, `today + horizon_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRules {
    pub horizon_days: i64,
}

impl BookingRules {
    pub fn new(horizon_days: i64) -> Self {
        let clamped = horizon_days.clamp(1, MAX_BOOKING_HORIZON_DAYS);
        if clamped != horizon_days {
            warn!("Booking horizon of {} days is out of range, using {}", horizon_days, clamped);
        }
        Self { horizon_days: clamped }
    }

    /// First and last bookable dates. The end saturates at the last
    /// representable date.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let last = today
            .checked_add_signed(Duration::days(self.horizon_days - 1))
            .unwrap_or(NaiveDate::MAX);
        (today, last)
    }

    pub fn check_date(&self, date: NaiveDate, today: NaiveDate) -> Result<(), AppointmentError> {
        let (first, last) = self.window(today);
        if date < first {
            return Err(AppointmentError::Validation(format!("{} is in the past", date)));
        }
        if date > last {
            return Err(AppointmentError::Validation(format!(
                "{} is beyond the {}-day booking horizon", date, self.horizon_days
            )));
        }
        Ok(())
    }
}

/// Which appointments a caller may list. Patients and specialists only see
/// their own; administrators may narrow by patient or specialist.
pub fn scope_for(actor: &Actor, query: &AppointmentListQuery) -> Result<AppointmentFilter, AppointmentError> {
    match actor {
        Actor::Patient { id, .. } => {
            if query.patient_id.is_some_and(|p| p != *id) || query.specialist_id.is_some() {
                return Err(AppointmentError::Forbidden("Patients can only list their own appointments".to_string()));
            }
            Ok(AppointmentFilter::ByPatient(*id))
        }
        Actor::Specialist { id, .. } => {
            if query.specialist_id.is_some_and(|s| s != *id) || query.patient_id.is_some() {
                return Err(AppointmentError::Forbidden("Specialists can only list their own appointments".to_string()));
            }
            Ok(AppointmentFilter::BySpecialist(*id))
        }
        Actor::Administrator { .. } => Ok(match (query.patient_id, query.specialist_id) {
            (Some(patient_id), Some(specialist_id)) => AppointmentFilter::Between { patient_id, specialist_id },
            (Some(patient_id), None) => AppointmentFilter::ByPatient(patient_id),
            (None, Some(specialist_id)) => AppointmentFilter::BySpecialist(specialist_id),
            (None, None) => AppointmentFilter::All,
        }),
    }
}

fn required(value: &str, field: &str) -> Result<String, AppointmentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppointmentError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    slots: Arc<SlotResolverService>,
    lifecycle: AppointmentLifecycleService,
    rules: BookingRules,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn AppointmentStore>, slots: Arc<SlotResolverService>, rules: BookingRules) -> Self {
        Self {
            store,
            slots,
            lifecycle: AppointmentLifecycleService::new(),
            rules,
        }
    }

    pub fn rules(&self) -> BookingRules {
        self.rules
    }

    /// Books a `requested` appointment. The free-slot check is the store's
    /// atomic insert; the template lookup only rejects times never offered.
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (patient_id, patient_name) = match actor {
            Actor::Patient { id, display_name } => {
                if request.patient_id.is_some_and(|p| p != *id) {
                    return Err(AppointmentError::Forbidden("Patients can only book for themselves".to_string()));
                }
                (*id, required(display_name, "Patient name")?)
            }
            Actor::Administrator { .. } => {
                let patient_id = request.patient_id.ok_or_else(|| {
                    AppointmentError::Validation("patient_id is required when booking on a patient's behalf".to_string())
                })?;
                (patient_id, required(request.patient_name.as_deref().unwrap_or(""), "Patient name")?)
            }
            Actor::Specialist { .. } => {
                return Err(AppointmentError::Forbidden("Specialists cannot book appointments".to_string()));
            }
        };

        let specialty = required(&request.specialty, "Specialty")?;
        let specialist_name = required(&request.specialist_name, "Specialist name")?;
        let date = parse_calendar_date(&request.date).map_err(AppointmentError::Validation)?;

        self.rules.check_date(date, Utc::now().date_naive())?;

        let offered = self.slots.candidate_times(request.specialist_id, &specialty, date).await?;
        if !offered.contains(&request.time) {
            warn!("Specialist {} does not offer {} on {} for {}", request.specialist_id, request.time, date, specialty);
            return Err(AppointmentError::Validation(format!(
                "{} is not an available time on {}", request.time, date
            )));
        }

        let appointment = self.store
            .insert_if_slot_free(NewAppointment {
                patient_id,
                patient_name,
                specialist_id: request.specialist_id,
                specialist_name,
                specialty,
                date,
                time: request.time,
            })
            .await
            .map_err(|e| {
                if let AppointmentError::Conflict(_) = e {
                    warn!("Booking conflict for specialist {} at {} {}", request.specialist_id, date, request.time);
                }
                e
            })?;

        info!("Appointment {} requested by patient {} with specialist {} at {} {}",
              appointment.id, appointment.patient_id, appointment.specialist_id, appointment.date, appointment.time);

        Ok(appointment)
    }

    /// Ordered by date, then time.
    pub async fn list(
        &self,
        actor: &Actor,
        query: &AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = scope_for(actor, query)?;
        debug!("Listing appointments with filter {:?}", filter);

        let mut appointments = self.store.list(filter).await?;
        appointments.sort_by_key(|a| (a.date, a.time, a.created_at));
        Ok(appointments)
    }

    /// Appointments the caller is not party to read as missing.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Appointment, AppointmentError> {
        match self.store.find(id).await? {
            Some(appointment) if self.lifecycle.is_party(&appointment, actor) => Ok(appointment),
            _ => Err(AppointmentError::appointment_not_found(id)),
        }
    }

    pub async fn available_actions(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<(Appointment, Vec<Action>), AppointmentError> {
        let appointment = self.get(actor, id).await?;
        let actions = self.lifecycle.available_actions(&appointment, actor);
        Ok((appointment, actions))
    }

    /// Validates against the transition table, then persists with a
    /// conditional update on the status that was read.
    pub async fn apply_transition(
        &self,
        actor: &Actor,
        id: Uuid,
        request: TransitionRequest,
    ) -> Result<TransitionResponse, AppointmentError> {
        let appointment = self.store
            .find(id)
            .await?
            .ok_or_else(|| AppointmentError::appointment_not_found(id))?;

        let action = request.action();
        let plan = self.lifecycle.plan(&appointment, actor, request, Utc::now())?;

        let outcome = match plan.record {
            Some(record) => self.store
                .complete(id, plan.guard, &plan.update, record)
                .await?
                .map(|(appointment, record)| (appointment, Some(record))),
            None => self.store
                .update_if(id, plan.guard, &plan.update)
                .await?
                .map(|appointment| (appointment, None)),
        };

        let (appointment, clinical_record) = outcome.ok_or_else(|| {
            warn!("Appointment {} was modified concurrently during {}", id, action);
            AppointmentError::Conflict(format!("Appointment {} was modified concurrently", id))
        })?;

        info!("Appointment {}: {} by {} {} (now {})", id, action, actor.role(), actor.id(), appointment.status);
        if let Some(record) = &clinical_record {
            info!("Clinical record {} created for appointment {}", record.id, id);
        }

        Ok(TransitionResponse { appointment, clinical_record })
    }
}
