use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};
use tempfile::TempDir;

use wardkeeper::config::DatabaseConfig;
use wardkeeper::{HospitalStore, handlers};

fn open_store() -> (TempDir, web::Data<HospitalStore>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("wardkeeper.db");
    let config = DatabaseConfig::new(
        path.to_string_lossy().into_owned(),
        4,
        Duration::from_secs(5),
    )
    .expect("valid config");
    let store = HospitalStore::open(&config).expect("store opens");
    (dir, web::Data::new(store))
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data($store.clone())
                .configure(handlers::configure),
        )
        .await
    };
}

fn room_status(rooms: &Value, room_id: &str) -> String {
    rooms
        .as_array()
        .and_then(|rooms| rooms.iter().find(|r| r["room_id"] == room_id))
        .map(|r| r["status"].as_str().unwrap_or_default().to_string())
        .unwrap_or_default()
}

#[actix_web::test]
async fn health_reports_ok() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn admission_occupies_room_until_discharge() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/patient")
        .set_json(json!({ "name": "Jane Doe", "phone_numbers": ["555-0100"] }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let pid = created["pid"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/room")
        .set_json(json!({ "room_id": "R1", "room_type": "General", "room_cost": 150.0 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/admission")
        .set_json(json!({ "patient_id": pid, "room_id": "R1", "days_count": 3, "admission_fee": 100.0 }))
        .to_request();
    let admitted: Value = test::call_and_read_body_json(&app, req).await;
    let admission_id = admitted["admission_id"].as_i64().unwrap();

    let rooms: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/rooms").to_request())
            .await;
    assert_eq!(room_status(&rooms, "R1"), "Occupied");

    let roster: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/patients").to_request(),
    )
    .await;
    assert_eq!(roster[0]["status"], "Admitted");
    assert_eq!(roster[0]["phone_numbers"], "555-0100");

    let req = test::TestRequest::delete().uri("/api/rooms?room_id=R1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "Cannot delete room that is currently allocated. Please discharge patients first."
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/discharge/{pid}"))
        .to_request();
    let discharged: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(discharged["admission_id"].as_i64(), Some(admission_id));
    assert_eq!(discharged["freed_room"], "R1");

    let rooms: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/rooms").to_request())
            .await;
    assert_eq!(room_status(&rooms, "R1"), "Available");

    let detail: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(&format!("/api/patient/{pid}")).to_request(),
    )
    .await;
    assert!(detail["admissions"][0]["discharge_date"].is_string());

    let roster: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/patients").to_request(),
    )
    .await;
    assert_eq!(roster[0]["status"], "Outpatient");

    let req = test::TestRequest::delete().uri("/api/rooms?room_id=R1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn visit_total_adds_doctor_tests_medicines_and_other_charges() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let post = |uri: &str, body: Value| {
        test::TestRequest::post().uri(uri).set_json(body).to_request()
    };

    let patient: Value =
        test::call_and_read_body_json(&app, post("/api/patient", json!({ "name": "Jane Doe" }))).await;
    let test_row: Value = test::call_and_read_body_json(
        &app,
        post("/api/test", json!({ "test_name": "CBC", "test_cost": 20.0 })),
    )
    .await;
    let medicine: Value = test::call_and_read_body_json(
        &app,
        post("/api/medicine", json!({ "medicine_name": "Paracetamol", "medicine_cost": 5.0 })),
    )
    .await;
    let doctor: Value = test::call_and_read_body_json(
        &app,
        post(
            "/api/employee",
            json!({ "etype": "Doctor", "name": "Dr. Grey", "visit_fee": 50.0 }),
        ),
    )
    .await;

    let visit: Value = test::call_and_read_body_json(
        &app,
        post(
            "/api/visit",
            json!({
                "patient_id": patient["pid"],
                "doctor_id": doctor["eid"],
                "description": "Fever",
                "test_ids": [test_row["test_id"]],
                "medicine_ids": [medicine["medicine_id"]],
                "other_charges": 10.0,
            }),
        ),
    )
    .await;
    assert_eq!(visit["success"], true);
    assert_eq!(visit["total_cost"].as_f64(), Some(85.0));

    let uri = format!("/api/patient/{}", patient["pid"]);
    let detail: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    let bill = &detail["bills"][0];
    assert_eq!(bill["doctor_cost"].as_f64(), Some(50.0));
    assert_eq!(bill["medicine_cost"].as_f64(), Some(5.0));
    assert_eq!(bill["room_cost"].as_f64(), Some(0.0));
    assert_eq!(detail["treatments"][0]["doctor_name"], "Dr. Grey");
    assert_eq!(detail["treatments"][0]["tests"][0]["test_name"], "CBC");

    let again: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(detail, again);
}

#[actix_web::test]
async fn create_room_requires_every_field() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/room")
        .set_json(json!({ "room_id": "R9", "room_cost": 80.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "room_id, room_type, and room_cost are required");
}

#[actix_web::test]
async fn discharge_without_admission_is_not_found() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/patient")
        .set_json(json!({ "name": "John Roe" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/discharge/{}", created["pid"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/patient/404").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn store_failures_hide_their_cause() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/visit")
        .set_json(json!({ "patient_id": 12 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to create visit");
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/admission")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn second_admission_for_admitted_patient_conflicts() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/patient")
        .set_json(json!({ "name": "Jane Doe" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let admit = || {
        test::TestRequest::post()
            .uri("/api/admission")
            .set_json(json!({ "patient_id": created["pid"] }))
            .to_request()
    };
    assert_eq!(test::call_service(&app, admit()).await.status(), StatusCode::CREATED);
    assert_eq!(test::call_service(&app, admit()).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn typed_staff_and_room_routes_create_records() {
    let (_dir, store) = open_store();
    let app = app!(store);

    let req = test::TestRequest::post()
        .uri("/api/doctor")
        .set_json(json!({ "name": "Dr. Grey", "specialty": "Cardiology", "visit_fee": 40.0 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/nurse")
        .set_json(json!({ "name": "Nurse Joy", "patient_count": 2 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/rooms")
        .set_json(json!({ "room_id": "ICU-1", "room_type": "ICU", "room_cost": 300.0 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let doctors: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/doctor").to_request())
            .await;
    assert_eq!(doctors[0]["etype"], "Doctor");
    assert_eq!(doctors[0]["visit_fee"].as_f64(), Some(40.0));

    let nurses: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/nurse").to_request())
            .await;
    assert_eq!(nurses[0]["etype"], "Nurse");
    assert_eq!(nurses[0]["patient_count"], 2);

    let rooms: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/rooms").to_request())
            .await;
    assert_eq!(room_status(&rooms, "ICU-1"), "Available");
}
