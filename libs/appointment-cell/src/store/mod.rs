// libs/appointment-cell/src/store/mod.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use schedule_cell::models::SlotTime;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentUpdate, ClinicalRecord,
    NewAppointment, NewClinicalRecord, UpdateGuard,
};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

/// The booking ledger's persistence. Every write is a single atomic step in
/// the backing store; none of them is a read followed by a write.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Inserts a `requested` appointment unless an active one already holds
    /// (specialist, date, time). A taken slot yields `AppointmentError::Conflict`.
    async fn insert_if_slot_free(&self, new: NewAppointment) -> Result<Appointment, AppointmentError>;

    async fn find(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError>;

    /// Times held by active appointments of the specialist within `from..=to`.
    async fn active_slots(
        &self,
        specialist_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, SlotTime)>, AppointmentError>;

    /// Applies `update` only if the stored row still satisfies `guard`.
    /// `Ok(None)` means the guard no longer matched.
    async fn update_if(
        &self,
        id: Uuid,
        guard: UpdateGuard,
        update: &AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Guarded update plus clinical record insert, both or neither.
    async fn complete(
        &self,
        id: Uuid,
        guard: UpdateGuard,
        update: &AppointmentUpdate,
        record: NewClinicalRecord,
    ) -> Result<Option<(Appointment, ClinicalRecord)>, AppointmentError>;
}

#[async_trait]
pub trait ClinicalRecordStore: Send + Sync {
    async fn list_records(&self, filter: AppointmentFilter) -> Result<Vec<ClinicalRecord>, AppointmentError>;
}
