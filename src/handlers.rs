//! HTTP handlers and the route table.
//!
//! Handlers only decode the request, hand the store work to the blocking pool and shape the JSON
//! reply. Failures leave through `ApiError`, which picks the status code.

use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::entities::catalog::{self, NewLabTest, NewMedicine};
use crate::entities::employees::{
    self, DoctorUpdate, EmployeeType, NewEmployee, NewSpecialist, NurseUpdate,
};
use crate::entities::patients::{self, NewPatient, PatientChanges};
use crate::entities::rooms::{self, NewRoom, RoomUpdate};
use crate::error::{ActionContext, ApiError};
use crate::queries;
use crate::store::HospitalStore;
use crate::workflows::{self, NewAdmission, NewVisit};

type HandlerResult = Result<HttpResponse, ApiError>;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other rejection.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": format!("Invalid request body: {err}") });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": format!("Invalid query string: {err}") });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health))
        .service(
            web::scope("/api")
                .route("/patient", web::get().to(list_patients))
                .route("/patient", web::post().to(create_patient))
                .route("/patient", web::put().to(update_patient))
                .route("/patient", web::delete().to(delete_patient))
                .route("/patient/{pid}", web::get().to(patient_detail))
                .route("/patients", web::get().to(patient_roster))
                .route("/employee", web::post().to(create_employee))
                .route("/employees", web::get().to(list_employees))
                .route("/doctor", web::get().to(doctor_roster))
                .route("/doctor", web::post().to(create_doctor))
                .route("/doctor", web::put().to(update_doctor))
                .route("/doctor", web::delete().to(delete_doctor))
                .route("/nurse", web::get().to(nurse_roster))
                .route("/nurse", web::post().to(create_nurse))
                .route("/nurse", web::put().to(update_nurse))
                .route("/nurse", web::delete().to(delete_nurse))
                .route("/room", web::post().to(create_room))
                .route("/rooms", web::get().to(room_roster))
                .route("/rooms", web::post().to(create_room))
                .route("/rooms", web::put().to(update_room))
                .route("/rooms", web::delete().to(delete_room))
                .route("/test", web::post().to(create_lab_test))
                .route("/tests", web::get().to(list_lab_tests))
                .route("/medicine", web::post().to(create_medicine))
                .route("/medicines", web::get().to(list_medicines))
                .route("/visit", web::post().to(create_visit))
                .route("/admission", web::post().to(create_admission))
                .route("/discharge/{pid}", web::post().to(discharge_patient)),
        );
}

pub async fn health(store: web::Data<HospitalStore>) -> HandlerResult {
    store.ping().await.action("reach the store")?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

// Patients

#[derive(Debug, Deserialize)]
pub struct PatientQuery {
    pub pid: i32,
}

#[derive(Debug, Deserialize)]
pub struct PatientUpdate {
    pub pid: i32,
    #[serde(flatten)]
    pub changes: PatientChanges,
}

pub async fn list_patients(store: web::Data<HospitalStore>) -> HandlerResult {
    let patients = store
        .run(patients::list_patients)
        .await
        .action("fetch patients")?;
    Ok(HttpResponse::Ok().json(patients))
}

pub async fn create_patient(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewPatient>,
) -> HandlerResult {
    let new = payload.into_inner();
    let pid = store
        .run(move |conn| patients::create_patient(conn, &new))
        .await
        .action("add patient")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Patient added successfully",
        "pid": pid,
    })))
}

pub async fn update_patient(
    store: web::Data<HospitalStore>,
    payload: web::Json<PatientUpdate>,
) -> HandlerResult {
    let PatientUpdate { pid, changes } = payload.into_inner();
    store
        .run(move |conn| patients::update_patient(conn, pid, &changes))
        .await
        .action("update patient")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patient updated successfully",
    })))
}

pub async fn delete_patient(
    store: web::Data<HospitalStore>,
    query: web::Query<PatientQuery>,
) -> HandlerResult {
    let pid = query.pid;
    store
        .run(move |conn| patients::delete_patient(conn, pid))
        .await
        .action("delete patient")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patient deleted successfully",
    })))
}

pub async fn patient_roster(store: web::Data<HospitalStore>) -> HandlerResult {
    let roster = store
        .run(queries::patient_roster)
        .await
        .action("fetch patients")?;
    Ok(HttpResponse::Ok().json(roster))
}

pub async fn patient_detail(
    store: web::Data<HospitalStore>,
    pid: web::Path<i32>,
) -> HandlerResult {
    let pid = pid.into_inner();
    let detail = store
        .run(move |conn| queries::patient_detail(conn, pid))
        .await
        .action("fetch patient details")?;
    Ok(HttpResponse::Ok().json(detail))
}

// Employees

pub async fn create_employee(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewEmployee>,
) -> HandlerResult {
    let new = payload.into_inner();
    let eid = store
        .run(move |conn| employees::create_employee(conn, &new))
        .await
        .action("add employee")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Employee added successfully",
        "eid": eid,
    })))
}

pub async fn create_doctor(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewSpecialist>,
) -> HandlerResult {
    let new = payload.into_inner().into_employee(EmployeeType::Doctor);
    let eid = store
        .run(move |conn| employees::create_employee(conn, &new))
        .await
        .action("add doctor")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Doctor added successfully",
        "eid": eid,
    })))
}

pub async fn create_nurse(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewSpecialist>,
) -> HandlerResult {
    let new = payload.into_inner().into_employee(EmployeeType::Nurse);
    let eid = store
        .run(move |conn| employees::create_employee(conn, &new))
        .await
        .action("add nurse")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Nurse added successfully",
        "eid": eid,
    })))
}

pub async fn list_employees(store: web::Data<HospitalStore>) -> HandlerResult {
    let employees = store
        .run(employees::list_employees)
        .await
        .action("fetch employees")?;
    Ok(HttpResponse::Ok().json(employees))
}

#[derive(Debug, Deserialize)]
pub struct DoctorQuery {
    pub doctor_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct NurseQuery {
    pub nurse_id: i32,
}

pub async fn doctor_roster(store: web::Data<HospitalStore>) -> HandlerResult {
    let doctors = store
        .run(queries::doctor_roster)
        .await
        .action("fetch doctors")?;
    Ok(HttpResponse::Ok().json(doctors))
}

pub async fn update_doctor(
    store: web::Data<HospitalStore>,
    payload: web::Json<DoctorUpdate>,
) -> HandlerResult {
    let update = payload.into_inner();
    store
        .run(move |conn| employees::update_doctor(conn, &update))
        .await
        .action("update doctor")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Doctor updated successfully",
    })))
}

pub async fn delete_doctor(
    store: web::Data<HospitalStore>,
    query: web::Query<DoctorQuery>,
) -> HandlerResult {
    let eid = query.doctor_id;
    store
        .run(move |conn| employees::delete_specialist(conn, eid, EmployeeType::Doctor))
        .await
        .action("delete doctor")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Doctor deleted successfully",
    })))
}

pub async fn nurse_roster(store: web::Data<HospitalStore>) -> HandlerResult {
    let nurses = store
        .run(queries::nurse_roster)
        .await
        .action("fetch nurses")?;
    Ok(HttpResponse::Ok().json(nurses))
}

pub async fn update_nurse(
    store: web::Data<HospitalStore>,
    payload: web::Json<NurseUpdate>,
) -> HandlerResult {
    let update = payload.into_inner();
    store
        .run(move |conn| employees::update_nurse(conn, &update))
        .await
        .action("update nurse")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Nurse updated successfully",
    })))
}

pub async fn delete_nurse(
    store: web::Data<HospitalStore>,
    query: web::Query<NurseQuery>,
) -> HandlerResult {
    let eid = query.nurse_id;
    store
        .run(move |conn| employees::delete_specialist(conn, eid, EmployeeType::Nurse))
        .await
        .action("delete nurse")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Nurse deleted successfully",
    })))
}

// Rooms

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub room_id: String,
}

pub async fn create_room(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewRoom>,
) -> HandlerResult {
    let new = payload.into_inner();
    let room_id = store
        .run(move |conn| rooms::create_room(conn, &new))
        .await
        .action("add room")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Room added successfully",
        "room_id": room_id,
    })))
}

pub async fn room_roster(store: web::Data<HospitalStore>) -> HandlerResult {
    let rooms = store
        .run(queries::room_roster)
        .await
        .action("fetch rooms")?;
    Ok(HttpResponse::Ok().json(rooms))
}

pub async fn update_room(
    store: web::Data<HospitalStore>,
    payload: web::Json<RoomUpdate>,
) -> HandlerResult {
    let update = payload.into_inner();
    store
        .run(move |conn| rooms::update_room(conn, &update))
        .await
        .action("update room")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Room updated successfully",
    })))
}

pub async fn delete_room(
    store: web::Data<HospitalStore>,
    query: web::Query<RoomQuery>,
) -> HandlerResult {
    let room_id = query.into_inner().room_id;
    store
        .run(move |conn| rooms::delete_room(conn, &room_id))
        .await
        .action("delete room")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Room deleted successfully",
    })))
}

// Catalog

pub async fn create_lab_test(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewLabTest>,
) -> HandlerResult {
    let new = payload.into_inner();
    let test_id = store
        .run(move |conn| catalog::create_lab_test(conn, &new))
        .await
        .action("add test")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Test added successfully",
        "test_id": test_id,
    })))
}

pub async fn list_lab_tests(store: web::Data<HospitalStore>) -> HandlerResult {
    let tests = store
        .run(catalog::list_lab_tests)
        .await
        .action("fetch tests")?;
    Ok(HttpResponse::Ok().json(tests))
}

pub async fn create_medicine(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewMedicine>,
) -> HandlerResult {
    let new = payload.into_inner();
    let medicine_id = store
        .run(move |conn| catalog::create_medicine(conn, &new))
        .await
        .action("add medicine")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Medicine added successfully",
        "medicine_id": medicine_id,
    })))
}

pub async fn list_medicines(store: web::Data<HospitalStore>) -> HandlerResult {
    let medicines = store
        .run(catalog::list_medicines)
        .await
        .action("fetch medicines")?;
    Ok(HttpResponse::Ok().json(medicines))
}

// Workflows

pub async fn create_visit(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewVisit>,
) -> HandlerResult {
    let visit = payload.into_inner();
    let today = today();
    let created = store
        .run(move |conn| workflows::create_visit(conn, &visit, today))
        .await
        .action("create visit")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Visit created successfully",
        "treatment_id": created.treatment_id,
        "bill_id": created.bill_id,
        "total_cost": created.total_cost,
    })))
}

pub async fn create_admission(
    store: web::Data<HospitalStore>,
    payload: web::Json<NewAdmission>,
) -> HandlerResult {
    let new = payload.into_inner();
    let today = today();
    let created = store
        .run(move |conn| workflows::create_admission(conn, &new, today))
        .await
        .action("create admission")?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Patient admitted successfully",
        "admission_id": created.admission_id,
    })))
}

pub async fn discharge_patient(
    store: web::Data<HospitalStore>,
    pid: web::Path<i32>,
) -> HandlerResult {
    let pid = pid.into_inner();
    let today = today();
    let discharged = store
        .run(move |conn| workflows::discharge_patient(conn, pid, today))
        .await
        .action("discharge patient")?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patient discharged successfully",
        "admission_id": discharged.admission_id,
        "discharge_date": discharged.discharge_date,
        "freed_room": discharged.freed_room,
    })))
}
