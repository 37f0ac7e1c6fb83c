//! Employees and their Doctor / Nurse specialisations.
//!
//! A Doctor or Nurse row shares its key with an Employee row whose `etype` matches. Creation and
//! deletion write both rows in one transaction, so the pair never exists half-way.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use crate::error::{HospitalError, HospitalResult};
use crate::models::Employee;
use crate::schema::{doctor, employee, nurse};
use crate::store::{IdSequence, next_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeType {
    Doctor,
    Nurse,
    Other,
}

impl EmployeeType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeType::Doctor => "Doctor",
            EmployeeType::Nurse => "Nurse",
            EmployeeType::Other => "Other",
        }
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeType {
    type Err = HospitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Doctor" => Ok(EmployeeType::Doctor),
            "Nurse" => Ok(EmployeeType::Nurse),
            "Other" => Ok(EmployeeType::Other),
            other => Err(HospitalError::InvalidInput(format!("unknown employee type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub etype: EmployeeType,
    pub name: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub salary: Option<f64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    // Doctor only
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub visit_fee: Option<f64>,
    // Nurse only
    #[serde(default)]
    pub patient_count: Option<i32>,
}

impl NewEmployee {
    pub fn new(etype: EmployeeType, name: impl Into<String>) -> Self {
        Self {
            etype,
            name: name.into(),
            birthdate: None,
            salary: None,
            email: None,
            address: None,
            qualification: None,
            specialty: None,
            visit_fee: None,
            patient_count: None,
        }
    }

    fn validate(&self) -> HospitalResult<()> {
        if self.name.trim().is_empty() {
            return Err(HospitalError::InvalidInput("employee name is required".into()));
        }
        check_amount("salary", self.salary)?;
        check_amount("visit_fee", self.visit_fee)?;
        if self.patient_count.is_some_and(|n| n < 0) {
            return Err(HospitalError::InvalidInput("patient_count cannot be negative".into()));
        }
        Ok(())
    }
}

/// Employee payload for routes that already name the type (`/api/doctor`, `/api/nurse`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewSpecialist {
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub qualification: Option<String>,
    pub specialty: Option<String>,
    pub visit_fee: Option<f64>,
    pub patient_count: Option<i32>,
}

impl NewSpecialist {
    pub fn into_employee(self, etype: EmployeeType) -> NewEmployee {
        NewEmployee {
            etype,
            name: self.name,
            birthdate: self.birthdate,
            salary: self.salary,
            email: self.email,
            address: self.address,
            qualification: self.qualification,
            specialty: self.specialty,
            visit_fee: self.visit_fee,
            patient_count: self.patient_count,
        }
    }
}

fn check_amount(field: &str, value: Option<f64>) -> HospitalResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(HospitalError::InvalidInput(format!(
            "{field} must be a non-negative amount"
        ))),
        _ => Ok(()),
    }
}

#[derive(Insertable)]
#[diesel(table_name = employee)]
#[diesel(treat_none_as_default_value = false)]
struct EmployeeRow<'a> {
    eid: i32,
    etype: &'a str,
    name: &'a str,
    birthdate: Option<NaiveDate>,
    salary: Option<f64>,
    email: Option<&'a str>,
    address: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = doctor)]
#[diesel(treat_none_as_default_value = false)]
struct DoctorRow<'a> {
    doctor_id: i32,
    qualification: Option<&'a str>,
    specialty: Option<&'a str>,
    visit_fee: f64,
}

#[derive(Insertable)]
#[diesel(table_name = nurse)]
struct NurseRow {
    nurse_id: i32,
    patient_count: i32,
}

pub fn create_employee(conn: &mut SqliteConnection, new: &NewEmployee) -> HospitalResult<i32> {
    new.validate()?;

    let eid = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        let eid = next_id(conn, IdSequence::Employee)?;
        diesel::insert_into(employee::table)
            .values(&EmployeeRow {
                eid,
                etype: new.etype.as_str(),
                name: new.name.trim(),
                birthdate: new.birthdate,
                salary: new.salary,
                email: new.email.as_deref(),
                address: new.address.as_deref(),
            })
            .execute(conn)?;

        match new.etype {
            EmployeeType::Doctor => {
                diesel::insert_into(doctor::table)
                    .values(&DoctorRow {
                        doctor_id: eid,
                        qualification: new.qualification.as_deref(),
                        specialty: new.specialty.as_deref(),
                        visit_fee: new.visit_fee.unwrap_or(0.0),
                    })
                    .execute(conn)?;
            }
            EmployeeType::Nurse => {
                diesel::insert_into(nurse::table)
                    .values(&NurseRow {
                        nurse_id: eid,
                        patient_count: new.patient_count.unwrap_or(0),
                    })
                    .execute(conn)?;
            }
            EmployeeType::Other => {}
        }
        Ok(eid)
    })?;

    tracing::info!(eid, etype = %new.etype, "employee created");
    Ok(eid)
}

pub fn list_employees(conn: &mut SqliteConnection) -> HospitalResult<Vec<Employee>> {
    Ok(employee::table
        .order(employee::eid.asc())
        .select(Employee::as_select())
        .load(conn)?)
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[serde(default)]
#[diesel(table_name = employee)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl EmployeeChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.birthdate.is_none()
            && self.salary.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[serde(default)]
#[diesel(table_name = doctor)]
pub struct DoctorChanges {
    pub qualification: Option<String>,
    pub specialty: Option<String>,
    pub visit_fee: Option<f64>,
}

impl DoctorChanges {
    fn is_empty(&self) -> bool {
        self.qualification.is_none() && self.specialty.is_none() && self.visit_fee.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[serde(default)]
#[diesel(table_name = nurse)]
pub struct NurseChanges {
    pub patient_count: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorUpdate {
    pub doctor_id: i32,
    #[serde(flatten)]
    pub employee: EmployeeChanges,
    #[serde(flatten)]
    pub doctor: DoctorChanges,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NurseUpdate {
    pub nurse_id: i32,
    #[serde(flatten)]
    pub employee: EmployeeChanges,
    #[serde(flatten)]
    pub nurse: NurseChanges,
}

/// Fails with `NotFound` unless `eid` is an employee of type `expected`.
fn ensure_type(
    conn: &mut SqliteConnection,
    eid: i32,
    expected: EmployeeType,
) -> HospitalResult<()> {
    let etype: Option<String> = employee::table
        .find(eid)
        .select(employee::etype)
        .first(conn)
        .optional()?;
    match etype.as_deref() {
        Some(found) if found == expected.as_str() => Ok(()),
        _ => Err(HospitalError::NotFound(format!(
            "{} {eid}",
            expected.as_str().to_lowercase()
        ))),
    }
}

fn validate_employee_changes(changes: &EmployeeChanges) -> HospitalResult<()> {
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(HospitalError::InvalidInput("employee name cannot be blank".into()));
    }
    check_amount("salary", changes.salary)
}

fn apply_employee_changes(
    conn: &mut SqliteConnection,
    eid: i32,
    changes: &EmployeeChanges,
) -> HospitalResult<()> {
    if !changes.is_empty() {
        diesel::update(employee::table.find(eid))
            .set(changes)
            .execute(conn)?;
    }
    Ok(())
}

pub fn update_doctor(conn: &mut SqliteConnection, update: &DoctorUpdate) -> HospitalResult<()> {
    if update.employee.is_empty() && update.doctor.is_empty() {
        return Err(HospitalError::InvalidInput("no valid fields to update".into()));
    }
    validate_employee_changes(&update.employee)?;
    check_amount("visit_fee", update.doctor.visit_fee)?;

    conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        ensure_type(conn, update.doctor_id, EmployeeType::Doctor)?;
        apply_employee_changes(conn, update.doctor_id, &update.employee)?;
        if !update.doctor.is_empty() {
            diesel::update(doctor::table.find(update.doctor_id))
                .set(&update.doctor)
                .execute(conn)?;
        }
        Ok(())
    })
}

pub fn update_nurse(conn: &mut SqliteConnection, update: &NurseUpdate) -> HospitalResult<()> {
    if update.employee.is_empty() && update.nurse.patient_count.is_none() {
        return Err(HospitalError::InvalidInput("no valid fields to update".into()));
    }
    validate_employee_changes(&update.employee)?;
    if update.nurse.patient_count.is_some_and(|n| n < 0) {
        return Err(HospitalError::InvalidInput("patient_count cannot be negative".into()));
    }

    conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        ensure_type(conn, update.nurse_id, EmployeeType::Nurse)?;
        apply_employee_changes(conn, update.nurse_id, &update.employee)?;
        if update.nurse.patient_count.is_some() {
            diesel::update(nurse::table.find(update.nurse_id))
                .set(&update.nurse)
                .execute(conn)?;
        }
        Ok(())
    })
}

/// Remove a doctor or nurse: the specialisation row first, then the employee row.
pub fn delete_specialist(
    conn: &mut SqliteConnection,
    eid: i32,
    etype: EmployeeType,
) -> HospitalResult<()> {
    conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        ensure_type(conn, eid, etype)?;
        match etype {
            EmployeeType::Doctor => {
                diesel::delete(doctor::table.find(eid)).execute(conn)?;
            }
            EmployeeType::Nurse => {
                diesel::delete(nurse::table.find(eid)).execute(conn)?;
            }
            EmployeeType::Other => {}
        }
        diesel::delete(employee::table.find(eid)).execute(conn)?;
        Ok(())
    })?;
    tracing::info!(eid, etype = %etype, "employee deleted");
    Ok(())
}
