// libs/appointment-cell/tests/supabase_store_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::*;
use appointment_cell::store::{AppointmentStore, ClinicalRecordStore, SupabaseAppointmentStore};
use shared_database::supabase::SupabaseClient;
use shared_utils::test_utils::TestConfig;

fn store_for(server: &MockServer) -> SupabaseAppointmentStore {
    let config = TestConfig::supabase_at(&server.uri());
    SupabaseAppointmentStore::new(Arc::new(SupabaseClient::new(&config)))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
}

fn new_appointment() -> NewAppointment {
    NewAppointment {
        patient_id: Uuid::new_v4(),
        patient_name: "Ana Ruiz".to_string(),
        specialist_id: Uuid::new_v4(),
        specialist_name: "Laura Gomez".to_string(),
        specialty: "Cardiology".to_string(),
        date: date(),
        time: "09:00".parse().unwrap(),
    }
}

fn appointment_row(id: Uuid, new: &NewAppointment, status: &str) -> Value {
    json!({
        "id": id,
        "patient_id": new.patient_id,
        "patient_name": new.patient_name,
        "specialist_id": new.specialist_id,
        "specialist_name": new.specialist_name,
        "specialty": new.specialty,
        "date": "2025-03-04",
        "time": "09:00:00",
        "status": status,
        "patient_cancellation_reason": null,
        "specialist_reason": null,
        "closing_summary": null,
        "patient_survey": null,
        "patient_rating": null,
        "created_at": "2025-03-01T10:00:00+00:00",
        "updated_at": "2025-03-01T10:00:00+00:00"
    })
}

#[tokio::test]
async fn insert_returns_the_stored_row() {
    let server = MockServer::start().await;
    let new = new_appointment();
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "status": "requested", "time": "09:00", "date": "2025-03-04" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(id, &new, "requested")])))
        .expect(1)
        .mount(&server)
        .await;

    let appointment = store_for(&server).insert_if_slot_free(new).await.unwrap();

    assert_eq!(appointment.id, id);
    assert_eq!(appointment.status, AppointmentStatus::Requested);
    assert_eq!(appointment.time.to_string(), "09:00");
}

#[tokio::test]
async fn unique_violation_becomes_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_active_slot_key\"",
            "details": null
        })))
        .mount(&server)
        .await;

    let result = store_for(&server).insert_if_slot_free(new_appointment()).await;
    assert_matches!(result, Err(AppointmentError::Conflict(_)));
}

#[tokio::test]
async fn other_failures_are_store_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let result = store_for(&server).insert_if_slot_free(new_appointment()).await;
    assert_matches!(result, Err(AppointmentError::Store(_)));
}

#[tokio::test]
async fn guarded_patch_with_no_rows_is_a_lost_race() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("status", "eq.requested"))
        .and(body_partial_json(json!({ "status": "accepted" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut update = AppointmentUpdate::at(Utc::now());
    update.status = Some(AppointmentStatus::Accepted);
    let guard = UpdateGuard { status: AppointmentStatus::Requested, unset: None };

    let outcome = store_for(&server).update_if(id, guard, &update).await.unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn annotation_patch_requires_empty_column() {
    let server = MockServer::start().await;
    let new = new_appointment();
    let id = Uuid::new_v4();
    let mut row = appointment_row(id, &new, "completed");
    row["patient_survey"] = json!("Great");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.completed"))
        .and(query_param("patient_survey", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&server)
        .await;

    let mut update = AppointmentUpdate::at(Utc::now());
    update.patient_survey = Some("Great".to_string());
    let guard = UpdateGuard { status: AppointmentStatus::Completed, unset: Some(AnnotationField::Survey) };

    let stored = store_for(&server).update_if(id, guard, &update).await.unwrap().unwrap();
    assert_eq!(stored.patient_survey.as_deref(), Some("Great"));
}

#[tokio::test]
async fn active_slots_exclude_released_states() {
    let server = MockServer::start().await;
    let specialist = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("specialist_id", format!("eq.{}", specialist)))
        .and(query_param("status", "not.in.(cancelled,rejected)"))
        .and(query_param("select", "date,time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2025-03-04", "time": "09:00:00" },
            { "date": "2025-03-05", "time": "14:00:00" }
        ])))
        .mount(&server)
        .await;

    let held = store_for(&server)
        .active_slots(specialist, date(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
        .await
        .unwrap();

    assert_eq!(held.len(), 2);
    assert_eq!(held[0], (date(), "09:00".parse().unwrap()));
}

#[tokio::test]
async fn completion_goes_through_rpc() {
    let server = MockServer::start().await;
    let new = new_appointment();
    let id = Uuid::new_v4();
    let now = Utc::now();

    let record = NewClinicalRecord {
        appointment_id: id,
        patient_id: new.patient_id,
        patient_name: new.patient_name.clone(),
        specialist_id: new.specialist_id,
        specialist_name: new.specialist_name.clone(),
        specialty: new.specialty.clone(),
        appointment_date: date(),
        recorded_at: now,
        vitals: Vitals { height: 170.0, weight: 70.0, temperature: 36.5, blood_pressure: "120/80".to_string() },
        notes: vec![],
    };

    let mut completed = appointment_row(id, &new, "completed");
    completed["closing_summary"] = json!("Fine");
    let mut stored_record = serde_json::to_value(&record).unwrap();
    stored_record["id"] = json!(Uuid::new_v4());

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/complete_appointment"))
        .and(body_partial_json(json!({ "p_appointment_id": id, "p_expected_status": "accepted" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appointment": completed,
            "record": stored_record
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut update = AppointmentUpdate::at(now);
    update.status = Some(AppointmentStatus::Completed);
    update.closing_summary = Some("Fine".to_string());
    let guard = UpdateGuard { status: AppointmentStatus::Accepted, unset: None };

    let (appointment, record) = store_for(&server)
        .complete(id, guard, &update, record)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Completed);
    assert_eq!(record.appointment_id, id);
}

#[tokio::test]
async fn completion_rpc_null_means_guard_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/complete_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let record = NewClinicalRecord {
        appointment_id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        patient_name: "Ana Ruiz".to_string(),
        specialist_id: Uuid::new_v4(),
        specialist_name: "Laura Gomez".to_string(),
        specialty: "Cardiology".to_string(),
        appointment_date: date(),
        recorded_at: Utc::now(),
        vitals: Vitals { height: 170.0, weight: 70.0, temperature: 36.5, blood_pressure: "120/80".to_string() },
        notes: vec![],
    };
    let guard = UpdateGuard { status: AppointmentStatus::Accepted, unset: None };

    let outcome = store_for(&server)
        .complete(record.appointment_id, guard, &AppointmentUpdate::at(Utc::now()), record)
        .await
        .unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn records_are_listed_newest_first_per_patient() {
    let server = MockServer::start().await;
    let patient = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinical_records"))
        .and(query_param("patient_id", format!("eq.{}", patient)))
        .and(query_param("order", "recorded_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let records = store_for(&server).list_records(AppointmentFilter::ByPatient(patient)).await.unwrap();
    assert!(records.is_empty());
}
