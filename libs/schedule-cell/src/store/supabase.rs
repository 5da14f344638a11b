use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityError, AvailabilityTemplateRow, SpecialtyAvailability};
use super::{SpecialtyStore, TemplateStore};

/// PostgREST-backed store over `availability_templates` and `specialties`.
pub struct SupabaseScheduleStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseScheduleStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl TemplateStore for SupabaseScheduleStore {
    async fn load_templates(&self, specialist_id: Uuid) -> Result<Vec<SpecialtyAvailability>, AvailabilityError> {
        let path = format!(
            "/rest/v1/availability_templates?specialist_id=eq.{}&select=specialist_id,specialty,days&order=specialty.asc",
            specialist_id
        );

        let rows: Vec<AvailabilityTemplateRow> = self.supabase
            .request(Method::GET, &path, None, None)
            .await?;

        debug!("Loaded {} templates for specialist {}", rows.len(), specialist_id);

        Ok(rows
            .into_iter()
            .map(|row| SpecialtyAvailability::new(row.specialty, row.days))
            .collect())
    }

    async fn replace_templates(
        &self,
        specialist_id: Uuid,
        templates: &[SpecialtyAvailability],
    ) -> Result<(), AvailabilityError> {
        // the function deletes and re-inserts inside one transaction
        let _: Value = self.supabase
            .rpc(
                "replace_availability_templates",
                json!({
                    "p_specialist_id": specialist_id,
                    "p_templates": templates,
                }),
            )
            .await?;

        Ok(())
    }
}

#[derive(Deserialize)]
struct SpecialtyRow {
    name: String,
}

#[async_trait]
impl SpecialtyStore for SupabaseScheduleStore {
    async fn list_specialties(&self) -> Result<Vec<String>, AvailabilityError> {
        let rows: Vec<SpecialtyRow> = self.supabase
            .request(Method::GET, "/rest/v1/specialties?select=name&order=name.asc", None, None)
            .await?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn add_specialty(&self, name: &str) -> Result<(), AvailabilityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=ignore-duplicates,return=minimal"),
        );

        let _: Value = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/specialties?on_conflict=name",
                None,
                Some(json!({ "name": name })),
                Some(headers),
            )
            .await?;

        Ok(())
    }
}
