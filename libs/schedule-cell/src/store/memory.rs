use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AvailabilityError, SpecialtyAvailability};
use super::{SpecialtyStore, TemplateStore};

#[derive(Default)]
pub struct InMemoryScheduleStore {
    templates: RwLock<HashMap<Uuid, Vec<SpecialtyAvailability>>>,
    specialties: RwLock<BTreeSet<String>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryScheduleStore {
    async fn load_templates(&self, specialist_id: Uuid) -> Result<Vec<SpecialtyAvailability>, AvailabilityError> {
        let templates = self.templates.read().await;
        Ok(templates.get(&specialist_id).cloned().unwrap_or_default())
    }

    async fn replace_templates(
        &self,
        specialist_id: Uuid,
        templates: &[SpecialtyAvailability],
    ) -> Result<(), AvailabilityError> {
        let mut all = self.templates.write().await;
        if templates.is_empty() {
            all.remove(&specialist_id);
        } else {
            all.insert(specialist_id, templates.to_vec());
        }
        Ok(())
    }
}

#[async_trait]
impl SpecialtyStore for InMemoryScheduleStore {
    async fn list_specialties(&self) -> Result<Vec<String>, AvailabilityError> {
        Ok(self.specialties.read().await.iter().cloned().collect())
    }

    async fn add_specialty(&self, name: &str) -> Result<(), AvailabilityError> {
        self.specialties.write().await.insert(name.to_string());
        Ok(())
    }
}
