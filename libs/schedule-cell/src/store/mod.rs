// libs/schedule-cell/src/store/mod.rs
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AvailabilityError, SpecialtyAvailability};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryScheduleStore;
pub use supabase::SupabaseScheduleStore;

/// Persistence for specialists' weekly templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Every saved template of the specialist; specialties never saved are absent.
    async fn load_templates(&self, specialist_id: Uuid) -> Result<Vec<SpecialtyAvailability>, AvailabilityError>;

    /// Replace the specialist's whole template set in one step.
    async fn replace_templates(
        &self,
        specialist_id: Uuid,
        templates: &[SpecialtyAvailability],
    ) -> Result<(), AvailabilityError>;
}

/// The clinic's catalog of specialty names.
#[async_trait]
pub trait SpecialtyStore: Send + Sync {
    async fn list_specialties(&self) -> Result<Vec<String>, AvailabilityError>;

    /// Adding a name that already exists is not an error.
    async fn add_specialty(&self, name: &str) -> Result<(), AvailabilityError>;
}
