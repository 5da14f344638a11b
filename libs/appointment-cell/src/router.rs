// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use schedule_cell::services::AvailabilityService;
use shared_config::{AppConfig, StoreBackend};
use shared_database::supabase::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{AppointmentBookingService, BookingRules, ClinicalRecordService, SlotResolverService};
use crate::store::{AppointmentStore, ClinicalRecordStore, InMemoryAppointmentStore, SupabaseAppointmentStore};

#[derive(Clone)]
pub struct AppointmentState {
    pub booking: Arc<AppointmentBookingService>,
    pub slots: Arc<SlotResolverService>,
    pub records: Arc<ClinicalRecordService>,
}

impl AppointmentState {
    pub fn new(
        config: &AppConfig,
        availability: Arc<AvailabilityService>,
        appointments: Arc<dyn AppointmentStore>,
        records: Arc<dyn ClinicalRecordStore>,
    ) -> Self {
        let slots = Arc::new(SlotResolverService::new(
            availability,
            appointments.clone(),
            config.max_slot_window_days,
        ));
        let booking = Arc::new(AppointmentBookingService::new(
            appointments,
            slots.clone(),
            BookingRules::new(config.booking_horizon_days),
        ));

        Self {
            booking,
            slots,
            records: Arc::new(ClinicalRecordService::new(records)),
        }
    }

    pub fn in_memory(config: &AppConfig, availability: Arc<AvailabilityService>) -> Self {
        let store = Arc::new(InMemoryAppointmentStore::new());
        Self::new(config, availability, store.clone(), store)
    }

    pub fn from_config(config: &AppConfig, availability: Arc<AvailabilityService>) -> Self {
        match config.store_backend {
            StoreBackend::Supabase => {
                let store = Arc::new(SupabaseAppointmentStore::new(Arc::new(SupabaseClient::new(config))));
                Self::new(config, availability, store.clone(), store)
            }
            StoreBackend::Memory => Self::in_memory(config, availability),
        }
    }
}

pub fn appointment_routes(config: Arc<AppConfig>, state: AppointmentState) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment).get(handlers::list_appointments))
        .route("/slots", get(handlers::get_slots))
        .route("/slots/days", get(handlers::get_available_days))
        .route("/clinical-records", get(handlers::list_clinical_records))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/actions", get(handlers::get_available_actions))
        .route("/{appointment_id}/transitions", post(handlers::apply_transition))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
