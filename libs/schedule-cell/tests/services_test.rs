// libs/schedule-cell/tests/services_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;

use schedule_cell::models::*;
use schedule_cell::services::{AvailabilityService, SpecialtyService};
use schedule_cell::store::InMemoryScheduleStore;

fn slot(s: &str) -> SlotTime {
    s.parse().unwrap()
}

fn services() -> (AvailabilityService, SpecialtyService) {
    let store = Arc::new(InMemoryScheduleStore::new());
    (AvailabilityService::new(store.clone()), SpecialtyService::new(store))
}

fn template(specialty: &str, days: serde_json::Value) -> SpecialtyAvailability {
    serde_json::from_value(json!({ "specialty": specialty, "days": days })).unwrap()
}

#[tokio::test]
async fn unknown_specialist_has_no_templates() {
    let (availability, _) = services();

    let templates = availability.get_template(Uuid::new_v4()).await.unwrap();
    assert!(templates.is_empty());
}

#[tokio::test]
async fn saved_template_is_normalized() {
    let (availability, _) = services();
    let specialist = Uuid::new_v4();

    let saved = availability
        .set_template(specialist, vec![
            template("  Dermatology ", json!({ "friday": ["16:00"] })),
            template("Cardiology", json!({ "monday": ["10:00", "09:00", "09:00"] })),
        ])
        .await
        .unwrap();

    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].specialty, "Cardiology");
    assert_eq!(saved[1].specialty, "Dermatology");

    let monday: Vec<_> = saved[0].days.times(DayOfWeek::Monday).iter().copied().collect();
    assert_eq!(monday, vec![slot("09:00"), slot("10:00")]);

    let loaded = availability.get_template(specialist).await.unwrap();
    assert_eq!(loaded, saved);

    let as_json = serde_json::to_value(&loaded[0].days).unwrap();
    assert_eq!(as_json["monday"], json!(["09:00", "10:00"]));
    assert_eq!(as_json["sunday"], json!([]));
}

#[tokio::test]
async fn replacing_a_template_drops_absent_specialties() {
    let (availability, _) = services();
    let specialist = Uuid::new_v4();

    availability
        .set_template(specialist, vec![
            template("Cardiology", json!({ "monday": ["09:00"] })),
            template("Dermatology", json!({ "tuesday": ["09:00"] })),
        ])
        .await
        .unwrap();

    availability
        .set_template(specialist, vec![template("Dermatology", json!({ "wednesday": ["11:00"] }))])
        .await
        .unwrap();

    assert!(availability.template_for(specialist, "Cardiology").await.unwrap().is_none());

    let derm = availability.template_for(specialist, "Dermatology").await.unwrap().unwrap();
    assert!(derm.times(DayOfWeek::Tuesday).is_empty());
    assert!(derm.times(DayOfWeek::Wednesday).contains(&slot("11:00")));

    availability.set_template(specialist, vec![]).await.unwrap();
    assert!(availability.get_template(specialist).await.unwrap().is_empty());
}

#[tokio::test]
async fn templates_are_kept_per_specialist() {
    let (availability, _) = services();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    availability
        .set_template(first, vec![template("Cardiology", json!({ "monday": ["09:00"] }))])
        .await
        .unwrap();

    assert!(availability.template_for(second, "Cardiology").await.unwrap().is_none());
    assert!(availability.template_for(first, "Cardiology").await.unwrap().is_some());
}

#[tokio::test]
async fn blank_or_repeated_specialty_is_rejected() {
    let (availability, _) = services();
    let specialist = Uuid::new_v4();

    let blank = availability
        .set_template(specialist, vec![template("   ", json!({}))])
        .await;
    assert_matches!(blank, Err(AvailabilityError::Validation(_)));

    let repeated = availability
        .set_template(specialist, vec![
            template("Cardiology", json!({})),
            template(" Cardiology", json!({ "monday": ["09:00"] })),
        ])
        .await;
    assert_matches!(repeated, Err(AvailabilityError::Validation(_)));

    assert!(availability.get_template(specialist).await.unwrap().is_empty());
}

#[tokio::test]
async fn specialty_catalog_trims_sorts_and_ignores_duplicates() {
    let (_, specialties) = services();

    assert_eq!(specialties.add("  Pediatrics ").await.unwrap(), "Pediatrics");
    specialties.add("Cardiology").await.unwrap();
    specialties.add("Pediatrics").await.unwrap();

    assert_eq!(specialties.list().await.unwrap(), vec!["Cardiology", "Pediatrics"]);
}

#[tokio::test]
async fn empty_specialty_name_is_rejected() {
    let (_, specialties) = services();

    assert_matches!(specialties.add("   ").await, Err(AvailabilityError::Validation(_)));
    assert!(specialties.list().await.unwrap().is_empty());
}
