use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use schedule_cell::models::SlotTime;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentUpdate, ClinicalRecord,
    NewAppointment, NewClinicalRecord, UpdateGuard,
};
use super::{AppointmentStore, ClinicalRecordStore};

#[derive(Default)]
struct Ledger {
    appointments: HashMap<Uuid, Appointment>,
    records: Vec<ClinicalRecord>,
}

/// Single-lock ledger; each operation runs entirely under the mutex.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    ledger: Mutex<Ledger>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(patient_id: Uuid, specialist_id: Uuid, filter: AppointmentFilter) -> bool {
    match filter {
        AppointmentFilter::ByPatient(id) => patient_id == id,
        AppointmentFilter::BySpecialist(id) => specialist_id == id,
        AppointmentFilter::Between { patient_id: p, specialist_id: s } => patient_id == p && specialist_id == s,
        AppointmentFilter::All => true,
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert_if_slot_free(&self, new: NewAppointment) -> Result<Appointment, AppointmentError> {
        let mut ledger = self.ledger.lock().await;

        let taken = ledger
            .appointments
            .values()
            .any(|a| a.occupies(new.specialist_id, new.date, new.time));
        if taken {
            return Err(AppointmentError::slot_taken(new.date, new.time));
        }

        let appointment = Appointment::from_new(new, Utc::now());
        ledger.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.ledger.lock().await.appointments.get(&id).cloned())
    }

    async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let ledger = self.ledger.lock().await;
        let mut appointments: Vec<Appointment> = ledger
            .appointments
            .values()
            .filter(|a| matches_filter(a.patient_id, a.specialist_id, filter))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.date, a.time, a.created_at));
        Ok(appointments)
    }

    async fn active_slots(
        &self,
        specialist_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, SlotTime)>, AppointmentError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .appointments
            .values()
            .filter(|a| a.specialist_id == specialist_id && a.status.is_active())
            .filter(|a| a.date >= from && a.date <= to)
            .map(|a| (a.date, a.time))
            .collect())
    }

    async fn update_if(
        &self,
        id: Uuid,
        guard: UpdateGuard,
        update: &AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut ledger = self.ledger.lock().await;
        match ledger.appointments.get_mut(&id) {
            Some(appointment) if guard.matches(appointment) => {
                appointment.apply(update);
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete(
        &self,
        id: Uuid,
        guard: UpdateGuard,
        update: &AppointmentUpdate,
        record: NewClinicalRecord,
    ) -> Result<Option<(Appointment, ClinicalRecord)>, AppointmentError> {
        let mut ledger = self.ledger.lock().await;

        if ledger.records.iter().any(|r| r.appointment_id == id) {
            return Err(AppointmentError::Conflict(format!(
                "Appointment {} already has a clinical record", id
            )));
        }

        let appointment = match ledger.appointments.get_mut(&id) {
            Some(appointment) if guard.matches(appointment) => {
                appointment.apply(update);
                appointment.clone()
            }
            _ => return Ok(None),
        };

        let record = ClinicalRecord::from_new(record);
        ledger.records.push(record.clone());
        Ok(Some((appointment, record)))
    }
}

#[async_trait]
impl ClinicalRecordStore for InMemoryAppointmentStore {
    async fn list_records(&self, filter: AppointmentFilter) -> Result<Vec<ClinicalRecord>, AppointmentError> {
        let ledger = self.ledger.lock().await;
        let mut records: Vec<ClinicalRecord> = ledger
            .records
            .iter()
            .filter(|r| matches_filter(r.patient_id, r.specialist_id, filter))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }
}
