// libs/schedule-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{AvailabilityError, SpecialtyAvailability, WeeklyAvailability};
use crate::store::TemplateStore;

/// Owns each specialist's weekly templates. Storage and normalization only;
/// no booking or conflict logic lives here.
pub struct AvailabilityService {
    store: Arc<dyn TemplateStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Normalized copy of every saved template, ordered by specialty.
    pub async fn get_template(&self, specialist_id: Uuid) -> Result<Vec<SpecialtyAvailability>, AvailabilityError> {
        debug!("Fetching availability templates for specialist: {}", specialist_id);

        let mut templates = self.store.load_templates(specialist_id).await?;
        templates.sort_by(|a, b| a.specialty.cmp(&b.specialty));

        Ok(templates)
    }

    /// Replace the specialist's full template set.
    pub async fn set_template(
        &self,
        specialist_id: Uuid,
        templates: Vec<SpecialtyAvailability>,
    ) -> Result<Vec<SpecialtyAvailability>, AvailabilityError> {
        debug!("Saving {} availability templates for specialist: {}", templates.len(), specialist_id);

        let normalized = Self::normalize(templates)?;
        self.store.replace_templates(specialist_id, &normalized).await?;

        info!("Availability templates replaced for specialist {} ({} specialties)",
              specialist_id, normalized.len());

        Ok(normalized)
    }

    /// Template for one specialty, if the specialist saved one.
    pub async fn template_for(
        &self,
        specialist_id: Uuid,
        specialty: &str,
    ) -> Result<Option<WeeklyAvailability>, AvailabilityError> {
        let wanted = specialty.trim();

        Ok(self.store
            .load_templates(specialist_id)
            .await?
            .into_iter()
            .find(|t| t.specialty == wanted)
            .map(|t| t.days))
    }

    fn normalize(templates: Vec<SpecialtyAvailability>) -> Result<Vec<SpecialtyAvailability>, AvailabilityError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(templates.len());

        for template in templates {
            let specialty = template.specialty.trim().to_string();

            if specialty.is_empty() {
                warn!("Rejected availability template with empty specialty");
                return Err(AvailabilityError::Validation("Specialty name is required".to_string()));
            }
            if !seen.insert(specialty.clone()) {
                warn!("Rejected duplicate availability template for {}", specialty);
                return Err(AvailabilityError::Validation(format!(
                    "Specialty {} appears more than once", specialty
                )));
            }

            // day sets are already deduplicated and sorted by construction
            normalized.push(SpecialtyAvailability::new(specialty, template.days));
        }

        normalized.sort_by(|a, b| a.specialty.cmp(&b.specialty));
        Ok(normalized)
    }
}
