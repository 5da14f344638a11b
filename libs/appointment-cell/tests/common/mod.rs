// Shared fixtures for the appointment-cell integration suites.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::json;
use uuid::Uuid;

use appointment_cell::models::{CreateAppointmentRequest, TransitionRequest, VitalsInput};
use appointment_cell::AppointmentState;
use schedule_cell::models::{SlotTime, SpecialtyAvailability};
use schedule_cell::ScheduleState;
use shared_config::AppConfig;
use shared_models::auth::Actor;
use shared_utils::test_utils::{TestConfig, TestUser};

pub const SPECIALTY: &str = "Cardiology";

pub struct Clinic {
    pub config: Arc<AppConfig>,
    pub schedule: ScheduleState,
    pub appointments: AppointmentState,
    pub patient: TestUser,
    pub other_patient: TestUser,
    pub specialist: TestUser,
    pub admin: TestUser,
}

impl Clinic {
    pub fn new() -> Self {
        let config = TestConfig::default().to_arc();
        let schedule = ScheduleState::in_memory();
        let appointments = AppointmentState::in_memory(&config, schedule.availability.clone());

        Self {
            config,
            schedule,
            appointments,
            patient: TestUser::patient("Ana Ruiz"),
            other_patient: TestUser::patient("Pablo Diaz"),
            specialist: TestUser::specialist("Laura Gomez"),
            admin: TestUser::admin("Front Desk"),
        }
    }

    /// Cardiology on Tuesdays at 09:00 and 10:00 only.
    pub async fn with_tuesday_template(self) -> Self {
        let template: SpecialtyAvailability = serde_json::from_value(json!({
            "specialty": SPECIALTY,
            "days": { "tuesday": ["10:00", "09:00"] }
        }))
        .unwrap();

        self.schedule
            .availability
            .set_template(self.specialist.id, vec![template])
            .await
            .unwrap();
        self
    }

    pub fn booking(&self, date: NaiveDate, time: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: None,
            patient_name: None,
            specialist_id: self.specialist.id,
            specialist_name: self.specialist.full_name.clone(),
            specialty: SPECIALTY.to_string(),
            date: date.to_string(),
            time: slot(time),
        }
    }

    pub fn patient_actor(&self) -> Actor {
        self.patient.to_actor()
    }

    pub fn specialist_actor(&self) -> Actor {
        self.specialist.to_actor()
    }

    pub fn admin_actor(&self) -> Actor {
        self.admin.to_actor()
    }
}

pub fn slot(value: &str) -> SlotTime {
    value.parse().unwrap()
}

/// The next date (today included) falling on `weekday`; always inside the booking horizon.
pub fn upcoming(weekday: Weekday) -> NaiveDate {
    let today = Utc::now().date_naive();
    (0..7)
        .map(|offset| today + Duration::days(offset))
        .find(|date| date.weekday() == weekday)
        .unwrap()
}

pub fn complete_request() -> TransitionRequest {
    serde_json::from_value(json!({
        "action": "complete",
        "summary": "Routine control, no findings",
        "vitals": { "height": 168, "weight": "64.2", "temperature": 36.7, "blood_pressure": "118/76" },
        "notes": [
            { "key": "Allergies", "value": "None known" },
            { "key": "", "value": "dropped" }
        ]
    }))
    .unwrap()
}

pub fn incomplete_vitals() -> VitalsInput {
    serde_json::from_value(json!({ "height": 168, "weight": 64.2, "temperature": 36.7 })).unwrap()
}

pub fn random_id() -> Uuid {
    Uuid::new_v4()
}
