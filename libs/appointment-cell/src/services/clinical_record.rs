use std::sync::Arc;

use tracing::debug;

use shared_models::auth::Actor;

use crate::models::{
    AppointmentError, AppointmentFilter, AppointmentListQuery, ClinicalNote, ClinicalRecord,
    Measurement, Vitals, VitalsInput,
};
use crate::services::booking::scope_for;
use crate::store::ClinicalRecordStore;

pub const MAX_CLINICAL_NOTES: usize = 3;

fn measurement(value: &Option<Measurement>, name: &str) -> Result<f64, AppointmentError> {
    let value = value
        .as_ref()
        .ok_or_else(|| AppointmentError::Validation(format!("{} is required", name)))?;

    match value.as_f64() {
        Some(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(AppointmentError::Validation(format!("{} must be a positive number", name))),
    }
}

/// All four vitals are mandatory to close an appointment.
pub fn validate_vitals(input: &VitalsInput) -> Result<Vitals, AppointmentError> {
    let height = measurement(&input.height, "Height")?;
    let weight = measurement(&input.weight, "Weight")?;
    let temperature = measurement(&input.temperature, "Temperature")?;

    let blood_pressure = input
        .blood_pressure
        .as_deref()
        .map(str::trim)
        .filter(|bp| !bp.is_empty())
        .ok_or_else(|| AppointmentError::Validation("Blood pressure is required".to_string()))?;

    Ok(Vitals {
        height,
        weight,
        temperature,
        blood_pressure: blood_pressure.to_string(),
    })
}

/// Drops blank entries; more than three remaining is rejected.
pub fn clean_notes(notes: Vec<ClinicalNote>) -> Result<Vec<ClinicalNote>, AppointmentError> {
    let cleaned: Vec<ClinicalNote> = notes
        .into_iter()
        .map(|note| ClinicalNote {
            key: note.key.trim().to_string(),
            value: note.value.trim().to_string(),
        })
        .filter(|note| !note.key.is_empty() && !note.value.is_empty())
        .collect();

    if cleaned.len() > MAX_CLINICAL_NOTES {
        return Err(AppointmentError::Validation(format!(
            "At most {} clinical notes are allowed", MAX_CLINICAL_NOTES
        )));
    }

    Ok(cleaned)
}

pub struct ClinicalRecordService {
    store: Arc<dyn ClinicalRecordStore>,
}

impl ClinicalRecordService {
    pub fn new(store: Arc<dyn ClinicalRecordStore>) -> Self {
        Self { store }
    }

    /// Newest first, scoped to the caller like appointment listings.
    pub async fn list(
        &self,
        actor: &Actor,
        query: &AppointmentListQuery,
    ) -> Result<Vec<ClinicalRecord>, AppointmentError> {
        let filter: AppointmentFilter = scope_for(actor, query)?;
        debug!("Listing clinical records with filter {:?}", filter);

        let mut records = self.store.list_records(filter).await?;
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn note(key: &str, value: &str) -> ClinicalNote {
        ClinicalNote { key: key.to_string(), value: value.to_string() }
    }

    #[test]
    fn vitals_accept_numeric_strings() {
        let vitals = validate_vitals(&VitalsInput {
            height: Some(Measurement::Text(" 180 ".to_string())),
            weight: Some(Measurement::Number(82.3)),
            temperature: Some(Measurement::Text("37.1".to_string())),
            blood_pressure: Some("130/85".to_string()),
        })
        .unwrap();

        assert_eq!(vitals.height, 180.0);
        assert_eq!(vitals.temperature, 37.1);
    }

    #[test]
    fn vitals_reject_non_positive_or_garbage() {
        let base = VitalsInput {
            height: Some(Measurement::Number(180.0)),
            weight: Some(Measurement::Number(80.0)),
            temperature: Some(Measurement::Number(36.5)),
            blood_pressure: Some("120/80".to_string()),
        };

        let mut zero = base.clone();
        zero.weight = Some(Measurement::Number(0.0));
        assert_matches!(validate_vitals(&zero), Err(AppointmentError::Validation(_)));

        let mut text = base.clone();
        text.height = Some(Measurement::Text("tall".to_string()));
        assert_matches!(validate_vitals(&text), Err(AppointmentError::Validation(_)));

        let mut blank = base;
        blank.blood_pressure = Some("  ".to_string());
        assert_matches!(validate_vitals(&blank), Err(AppointmentError::Validation(_)));
    }

    #[test]
    fn blank_notes_are_dropped_before_counting() {
        let notes = clean_notes(vec![
            note("Allergies", "Penicillin"),
            note("", "orphan value"),
            note("Diet", " "),
            note("Smoker", "No"),
            note("Exercise", "Weekly"),
        ])
        .unwrap();

        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0], note("Allergies", "Penicillin"));
    }

    #[test]
    fn more_than_three_notes_is_rejected() {
        let notes = (0..4).map(|i| note(&format!("k{}", i), "v")).collect();
        assert_matches!(clean_notes(notes), Err(AppointmentError::Validation(_)));
    }
}
