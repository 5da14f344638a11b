use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use schedule_cell::models::SlotTime;
use shared_database::supabase::{api_error, SupabaseClient};

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentStatus,
    AppointmentUpdate, ClinicalRecord, NewAppointment, NewClinicalRecord, UpdateGuard,
};
use super::{AppointmentStore, ClinicalRecordStore};

/// PostgREST-backed ledger over `appointments` and `clinical_records`.
///
/// Slot arbitration relies on the partial unique index
/// `appointments_active_slot_key` (see `migrations/0001_scheduling.sql`);
/// state transitions are conditional PATCHes filtered on the expected status.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn filter_query(filter: AppointmentFilter) -> String {
        match filter {
            AppointmentFilter::ByPatient(id) => format!("patient_id=eq.{}&", id),
            AppointmentFilter::BySpecialist(id) => format!("specialist_id=eq.{}&", id),
            AppointmentFilter::Between { patient_id, specialist_id } => {
                format!("patient_id=eq.{}&specialist_id=eq.{}&", patient_id, specialist_id)
            }
            AppointmentFilter::All => String::new(),
        }
    }

    fn guard_query(id: Uuid, guard: UpdateGuard) -> String {
        let mut query = format!("id=eq.{}&status=eq.{}", id, guard.status);
        if let Some(field) = guard.unset {
            query.push_str(&format!("&{}=is.null", field.column()));
        }
        query
    }

    fn decode_appointment(row: Value) -> Result<Appointment, AppointmentError> {
        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Store(format!("Failed to parse appointment: {}", e)))
    }
}

#[derive(Deserialize)]
struct SlotRow {
    date: NaiveDate,
    time: SlotTime,
}

#[derive(Deserialize)]
struct CompletionRow {
    appointment: Appointment,
    record: ClinicalRecord,
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert_if_slot_free(&self, new: NewAppointment) -> Result<Appointment, AppointmentError> {
        let mut body = serde_json::to_value(&new)
            .map_err(|e| AppointmentError::Store(e.to_string()))?;
        body["status"] = json!(AppointmentStatus::Requested);

        let rows = match self.supabase
            .request_returning(Method::POST, "/rest/v1/appointments", Some(body))
            .await
        {
            Ok(rows) => rows,
            Err(e) if api_error(&e).is_some_and(|api| api.is_unique_violation()) => {
                warn!("Slot {} {} for specialist {} lost to a concurrent booking",
                      new.date, new.time, new.specialist_id);
                return Err(AppointmentError::slot_taken(new.date, new.time));
            }
            Err(e) => return Err(e.into()),
        };

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Store("Insert returned no row".to_string()))?;

        Self::decode_appointment(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&select=*", id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        rows.into_iter().next().map(Self::decode_appointment).transpose()
    }

    async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?{}select=*&order=date.asc,time.asc,created_at.asc",
            Self::filter_query(filter)
        );

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;
        debug!("Fetched {} appointments", rows.len());

        rows.into_iter().map(Self::decode_appointment).collect()
    }

    async fn active_slots(
        &self,
        specialist_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, SlotTime)>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?specialist_id=eq.{}&date=gte.{}&date=lte.{}&status=not.in.(cancelled,rejected)&select=date,time",
            specialist_id, from, to
        );

        let rows: Vec<SlotRow> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().map(|row| (row.date, row.time)).collect())
    }

    async fn update_if(
        &self,
        id: Uuid,
        guard: UpdateGuard,
        update: &AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}", Self::guard_query(id, guard));
        let body = serde_json::to_value(update)
            .map_err(|e| AppointmentError::Store(e.to_string()))?;

        let rows = self.supabase.request_returning(Method::PATCH, &path, Some(body)).await?;

        // zero rows: the guard filtered the row out
        rows.into_iter().next().map(Self::decode_appointment).transpose()
    }

    async fn complete(
        &self,
        id: Uuid,
        guard: UpdateGuard,
        update: &AppointmentUpdate,
        record: NewClinicalRecord,
    ) -> Result<Option<(Appointment, ClinicalRecord)>, AppointmentError> {
        let args = json!({
            "p_appointment_id": id,
            "p_expected_status": guard.status,
            "p_closing_summary": update.closing_summary,
            "p_completed_at": update.updated_at,
            "p_record": record,
        });

        let result: Result<Option<CompletionRow>, _> = self.supabase.rpc("complete_appointment", args).await;
        match result {
            Ok(row) => Ok(row.map(|row| (row.appointment, row.record))),
            Err(e) if api_error(&e).is_some_and(|api| api.is_unique_violation()) => Err(
                AppointmentError::Conflict(format!("Appointment {} already has a clinical record", id)),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ClinicalRecordStore for SupabaseAppointmentStore {
    async fn list_records(&self, filter: AppointmentFilter) -> Result<Vec<ClinicalRecord>, AppointmentError> {
        let path = format!(
            "/rest/v1/clinical_records?{}select=*&order=recorded_at.desc",
            Self::filter_query(filter)
        );

        let records: Vec<ClinicalRecord> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(records)
    }
}
