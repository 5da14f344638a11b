// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::{AppConfig, StoreBackend};
use shared_database::supabase::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{AvailabilityService, SpecialtyService};
use crate::store::{InMemoryScheduleStore, SpecialtyStore, SupabaseScheduleStore, TemplateStore};

#[derive(Clone)]
pub struct ScheduleState {
    pub availability: Arc<AvailabilityService>,
    pub specialties: Arc<SpecialtyService>,
}

impl ScheduleState {
    pub fn new(templates: Arc<dyn TemplateStore>, specialties: Arc<dyn SpecialtyStore>) -> Self {
        Self {
            availability: Arc::new(AvailabilityService::new(templates)),
            specialties: Arc::new(SpecialtyService::new(specialties)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryScheduleStore::new());
        Self::new(store.clone(), store)
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match config.store_backend {
            StoreBackend::Supabase => {
                let store = Arc::new(SupabaseScheduleStore::new(Arc::new(SupabaseClient::new(config))));
                Self::new(store.clone(), store)
            }
            StoreBackend::Memory => Self::in_memory(),
        }
    }
}

pub fn schedule_routes(config: Arc<AppConfig>, state: ScheduleState) -> Router {
    Router::new()
        .route("/specialties", get(handlers::list_specialties).post(handlers::add_specialty))
        .route(
            "/specialists/{specialist_id}/template",
            get(handlers::get_template).put(handlers::set_template),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
