// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schedule_cell::models::{AvailabilityError, SlotTime};
use shared_models::auth::Role;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Requested,
        AppointmentStatus::Accepted,
        AppointmentStatus::Rejected,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    /// Active appointments hold their slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Rejected)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Rejected | AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Requested => "requested",
            AppointmentStatus::Accepted => "accepted",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub specialist_id: Uuid,
    pub specialist_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub status: AppointmentStatus,
    pub patient_cancellation_reason: Option<String>,
    /// Rejection or cancellation reason given by the clinic side.
    pub specialist_reason: Option<String>,
    pub closing_summary: Option<String>,
    pub patient_survey: Option<String>,
    pub patient_rating: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn from_new(new: NewAppointment, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            specialist_id: new.specialist_id,
            specialist_name: new.specialist_name,
            specialty: new.specialty,
            date: new.date,
            time: new.time,
            status: AppointmentStatus::Requested,
            patient_cancellation_reason: None,
            specialist_reason: None,
            closing_summary: None,
            patient_survey: None,
            patient_rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn occupies(&self, specialist_id: Uuid, date: NaiveDate, time: SlotTime) -> bool {
        self.status.is_active()
            && self.specialist_id == specialist_id
            && self.date == date
            && self.time == time
    }

    pub fn annotation(&self, field: AnnotationField) -> Option<&str> {
        match field {
            AnnotationField::Survey => self.patient_survey.as_deref(),
            AnnotationField::Rating => self.patient_rating.as_deref(),
        }
    }

    /// Applies only the fields present in `update`.
    pub fn apply(&mut self, update: &AppointmentUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(reason) = &update.patient_cancellation_reason {
            self.patient_cancellation_reason = Some(reason.clone());
        }
        if let Some(reason) = &update.specialist_reason {
            self.specialist_reason = Some(reason.clone());
        }
        if let Some(summary) = &update.closing_summary {
            self.closing_summary = Some(summary.clone());
        }
        if let Some(survey) = &update.patient_survey {
            self.patient_survey = Some(survey.clone());
        }
        if let Some(rating) = &update.patient_rating {
            self.patient_rating = Some(rating.clone());
        }
        self.updated_at = update.updated_at;
    }
}

/// Insert payload for the ledger; the store assigns id, status and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub specialist_id: Uuid,
    pub specialist_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub time: SlotTime,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialist_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_survey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_rating: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentUpdate {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            status: None,
            patient_cancellation_reason: None,
            specialist_reason: None,
            closing_summary: None,
            patient_survey: None,
            patient_rating: None,
            updated_at: now,
        }
    }
}

/// Append-once patient annotations on a completed appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationField {
    Survey,
    Rating,
}

impl AnnotationField {
    pub fn column(&self) -> &'static str {
        match self {
            AnnotationField::Survey => "patient_survey",
            AnnotationField::Rating => "patient_rating",
        }
    }
}

/// Condition a stored appointment must still meet for an update to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateGuard {
    pub status: AppointmentStatus,
    pub unset: Option<AnnotationField>,
}

impl UpdateGuard {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        appointment.status == self.status
            && self.unset.map_or(true, |field| appointment.annotation(field).is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentFilter {
    ByPatient(Uuid),
    BySpecialist(Uuid),
    /// Appointments of one patient with one specialist.
    Between { patient_id: Uuid, specialist_id: Uuid },
    All,
}

// ==============================================================================
// LIFECYCLE ACTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accept,
    Reject,
    Cancel,
    Complete,
    Survey,
    Rate,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Accept,
        Action::Reject,
        Action::Cancel,
        Action::Complete,
        Action::Survey,
        Action::Rate,
    ];

    pub fn annotation(&self) -> Option<AnnotationField> {
        match self {
            Action::Survey => Some(AnnotationField::Survey),
            Action::Rate => Some(AnnotationField::Rating),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Cancel => "cancel",
            Action::Complete => "complete",
            Action::Survey => "survey",
            Action::Rate => "rate",
        };
        f.write_str(name)
    }
}

/// Body of `POST /appointments/{id}/transitions`. Missing text fields read as
/// empty so that they fail validation rather than deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionRequest {
    Accept,
    Reject {
        #[serde(default)]
        reason: String,
    },
    Cancel {
        #[serde(default)]
        reason: String,
    },
    Complete {
        #[serde(default)]
        summary: String,
        #[serde(default)]
        vitals: VitalsInput,
        #[serde(default)]
        notes: Vec<ClinicalNote>,
    },
    Survey {
        #[serde(default)]
        text: String,
    },
    Rate {
        #[serde(default)]
        text: String,
    },
}

impl TransitionRequest {
    pub fn action(&self) -> Action {
        match self {
            TransitionRequest::Accept => Action::Accept,
            TransitionRequest::Reject { .. } => Action::Reject,
            TransitionRequest::Cancel { .. } => Action::Cancel,
            TransitionRequest::Complete { .. } => Action::Complete,
            TransitionRequest::Survey { .. } => Action::Survey,
            TransitionRequest::Rate { .. } => Action::Rate,
        }
    }
}

// ==============================================================================
// CLINICAL RECORD MODELS
// ==============================================================================

/// A measurement as typed into a form: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Number(f64),
    Text(String),
}

impl Measurement {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Measurement::Number(n) => Some(*n),
            Measurement::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsInput {
    pub height: Option<Measurement>,
    pub weight: Option<Measurement>,
    pub temperature: Option<Measurement>,
    pub blood_pressure: Option<String>,
}

/// Height in cm, weight in kg, temperature in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub height: f64,
    pub weight: f64,
    pub temperature: f64,
    pub blood_pressure: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalNote {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClinicalRecord {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub specialist_id: Uuid,
    pub specialist_name: String,
    pub specialty: String,
    pub appointment_date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub vitals: Vitals,
    pub notes: Vec<ClinicalNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub specialist_id: Uuid,
    pub specialist_name: String,
    pub specialty: String,
    pub appointment_date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub vitals: Vitals,
    pub notes: Vec<ClinicalNote>,
}

impl ClinicalRecord {
    pub fn from_new(new: NewClinicalRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_id: new.appointment_id,
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            specialist_id: new.specialist_id,
            specialist_name: new.specialist_name,
            specialty: new.specialty,
            appointment_date: new.appointment_date,
            recorded_at: new.recorded_at,
            vitals: new.vitals,
            notes: new.notes,
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    /// Required when an administrator books on a patient's behalf.
    pub patient_id: Option<Uuid>,
    pub patient_name: Option<String>,
    pub specialist_id: Uuid,
    pub specialist_name: String,
    pub specialty: String,
    /// `YYYY-MM-DD` or a timestamp, truncated to its calendar date.
    pub date: String,
    pub time: SlotTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub patient_id: Option<Uuid>,
    pub specialist_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub specialist_id: Uuid,
    pub specialty: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableActionsResponse {
    pub appointment_id: Uuid,
    pub status: AppointmentStatus,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub appointment: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_record: Option<ClinicalRecord>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Role {role} may not {action} an appointment that is {from}")]
    ForbiddenTransition {
        from: AppointmentStatus,
        action: Action,
        role: Role,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl AppointmentError {
    pub fn slot_taken(date: NaiveDate, time: SlotTime) -> Self {
        AppointmentError::Conflict(format!("The slot {} {} is already booked", date, time))
    }

    pub fn appointment_not_found(id: Uuid) -> Self {
        AppointmentError::NotFound(format!("Appointment {} not found", id))
    }
}

impl From<AvailabilityError> for AppointmentError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation(msg) => AppointmentError::Validation(msg),
            AvailabilityError::NotFound(msg) => AppointmentError::NotFound(msg),
            AvailabilityError::Store(msg) => AppointmentError::Store(msg),
        }
    }
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::Store(err.to_string())
    }
}
