use std::sync::Arc;

use tracing::info;

use crate::models::AvailabilityError;
use crate::store::SpecialtyStore;

pub struct SpecialtyService {
    store: Arc<dyn SpecialtyStore>,
}

impl SpecialtyService {
    pub fn new(store: Arc<dyn SpecialtyStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<String>, AvailabilityError> {
        let mut names = self.store.list_specialties().await?;
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub async fn add(&self, name: &str) -> Result<String, AvailabilityError> {
        let cleaned = name.trim();
        if cleaned.is_empty() {
            return Err(AvailabilityError::Validation("Specialty name is required".to_string()));
        }

        self.store.add_specialty(cleaned).await?;
        info!("Specialty registered: {}", cleaned);

        Ok(cleaned.to_string())
    }
}
