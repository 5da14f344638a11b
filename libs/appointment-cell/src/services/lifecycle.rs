// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use shared_models::auth::{Actor, Role};

use crate::models::{
    Action, Appointment, AppointmentError, AppointmentStatus, AppointmentUpdate, NewClinicalRecord,
    TransitionRequest, UpdateGuard,
};
use crate::models::AppointmentStatus::{Accepted, Cancelled, Completed, Rejected, Requested};
use crate::services::clinical_record::{clean_notes, validate_vitals};

/// One row of the transition table. `to: None` marks an annotation that
/// leaves the status unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: AppointmentStatus,
    pub action: Action,
    pub role: Role,
    pub to: Option<AppointmentStatus>,
}

const fn rule(from: AppointmentStatus, action: Action, role: Role, to: Option<AppointmentStatus>) -> TransitionRule {
    TransitionRule { from, action, role, to }
}

/// Every legal (state, action, role) triple. Anything absent is forbidden.
pub const TRANSITIONS: &[TransitionRule] = &[
    rule(Requested, Action::Accept, Role::Specialist, Some(Accepted)),
    rule(Requested, Action::Reject, Role::Specialist, Some(Rejected)),
    rule(Requested, Action::Cancel, Role::Patient, Some(Cancelled)),
    rule(Requested, Action::Cancel, Role::Specialist, Some(Cancelled)),
    rule(Requested, Action::Cancel, Role::Administrator, Some(Cancelled)),
    rule(Accepted, Action::Cancel, Role::Patient, Some(Cancelled)),
    rule(Accepted, Action::Cancel, Role::Administrator, Some(Cancelled)),
    rule(Accepted, Action::Complete, Role::Specialist, Some(Completed)),
    rule(Completed, Action::Survey, Role::Patient, None),
    rule(Completed, Action::Rate, Role::Patient, None),
];

/// What the ledger must persist for one accepted transition request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub guard: UpdateGuard,
    pub update: AppointmentUpdate,
    pub record: Option<NewClinicalRecord>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn rule_for(&self, from: AppointmentStatus, action: Action, role: Role) -> Option<&'static TransitionRule> {
        TRANSITIONS
            .iter()
            .find(|r| r.from == from && r.action == action && r.role == role)
    }

    /// Patients act on their own appointments, specialists on the ones
    /// assigned to them, administrators on any.
    pub fn is_party(&self, appointment: &Appointment, actor: &Actor) -> bool {
        match actor {
            Actor::Patient { id, .. } => appointment.patient_id == *id,
            Actor::Specialist { id, .. } => appointment.specialist_id == *id,
            Actor::Administrator { .. } => true,
        }
    }

    fn permitted(&self, appointment: &Appointment, actor: &Actor, action: Action) -> Option<&'static TransitionRule> {
        if !self.is_party(appointment, actor) {
            return None;
        }
        let rule = self.rule_for(appointment.status, action, actor.role())?;

        // survey and rating are append-once
        match action.annotation() {
            Some(field) if appointment.annotation(field).is_some() => None,
            _ => Some(rule),
        }
    }

    pub fn available_actions(&self, appointment: &Appointment, actor: &Actor) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.permitted(appointment, actor, *action).is_some())
            .collect()
    }

    /// Checks permission first, then the payload, and turns the request into
    /// a guarded update. Nothing is written here.
    pub fn plan(
        &self,
        appointment: &Appointment,
        actor: &Actor,
        request: TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<TransitionPlan, AppointmentError> {
        let action = request.action();
        debug!("Planning {} on appointment {} ({}) by {}", action, appointment.id, appointment.status, actor.role());

        let rule = self.permitted(appointment, actor, action).ok_or_else(|| {
            warn!("Forbidden transition: {} {} tried to {} appointment {} in state {}",
                  actor.role(), actor.id(), action, appointment.id, appointment.status);
            AppointmentError::ForbiddenTransition {
                from: appointment.status,
                action,
                role: actor.role(),
            }
        })?;

        let mut update = AppointmentUpdate::at(now);
        update.status = rule.to;
        let mut record = None;

        match request {
            TransitionRequest::Accept => {}
            TransitionRequest::Reject { reason } => {
                update.specialist_reason = Some(required_text(reason, "A rejection reason is required")?);
            }
            TransitionRequest::Cancel { reason } => {
                let reason = required_text(reason, "A cancellation reason is required")?;
                match actor {
                    Actor::Patient { .. } => update.patient_cancellation_reason = Some(reason),
                    Actor::Specialist { .. } | Actor::Administrator { .. } => {
                        update.specialist_reason = Some(reason)
                    }
                }
            }
            TransitionRequest::Complete { summary, vitals, notes } => {
                let summary = required_text(summary, "A closing summary is required")?;
                let vitals = validate_vitals(&vitals)?;
                let notes = clean_notes(notes)?;

                update.closing_summary = Some(summary);
                record = Some(NewClinicalRecord {
                    appointment_id: appointment.id,
                    patient_id: appointment.patient_id,
                    patient_name: appointment.patient_name.clone(),
                    specialist_id: appointment.specialist_id,
                    specialist_name: appointment.specialist_name.clone(),
                    specialty: appointment.specialty.clone(),
                    appointment_date: appointment.date,
                    recorded_at: now,
                    vitals,
                    notes,
                });
            }
            TransitionRequest::Survey { text } => {
                update.patient_survey = Some(required_text(text, "Survey text is required")?);
            }
            TransitionRequest::Rate { text } => {
                update.patient_rating = Some(required_text(text, "Rating text is required")?);
            }
        }

        Ok(TransitionPlan {
            guard: UpdateGuard {
                status: appointment.status,
                unset: action.annotation(),
            },
            update,
            record,
        })
    }
}

fn required_text(value: String, message: &str) -> Result<String, AppointmentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppointmentError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}
