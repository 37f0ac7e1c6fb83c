//! Row types for the hospital schema.

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{
    admission, allocated, assigned_to, bill, doctor, employee, lab_test, medicine, nurse, patient,
    room, treatment,
};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = patient)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Patient {
    pub pid: i32,
    pub name: String,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub relative_num: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = employee)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Employee {
    pub eid: i32,
    pub etype: String,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = doctor)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Doctor {
    pub doctor_id: i32,
    pub qualification: Option<String>,
    pub specialty: Option<String>,
    pub visit_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = nurse)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Nurse {
    pub nurse_id: i32,
    pub patient_count: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = room)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Room {
    pub room_id: String,
    pub room_type: String,
    pub room_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = admission)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Admission {
    pub admission_id: i32,
    pub admission_fee: f64,
    pub admission_date: NaiveDate,
    pub discharge_date: Option<NaiveDate>,
}

impl Admission {
    pub fn is_active(&self) -> bool {
        self.discharge_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = allocated)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Allocation {
    pub admission_id: i32,
    pub room_id: String,
    pub days_count: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = assigned_to)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Assignment {
    pub admission_id: i32,
    pub patient_id: i32,
    pub doctor_id: Option<i32>,
    pub nurse_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = treatment)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Treatment {
    pub tid: i32,
    pub description: Option<String>,
    pub treatment_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = lab_test)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LabTest {
    pub test_id: i32,
    pub test_name: String,
    pub test_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = medicine)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Medicine {
    pub medicine_id: i32,
    pub medicine_name: String,
    pub medicine_cost: f64,
}

/// A persisted bill. The total is derived, never stored.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = bill)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Bill {
    pub bill_id: i32,
    pub patient_id: i32,
    pub bill_date: NaiveDate,
    pub other_charges: f64,
    pub medicine_cost: f64,
    pub room_cost: f64,
    pub doctor_cost: f64,
}

impl Bill {
    pub fn total(&self) -> f64 {
        self.doctor_cost + self.medicine_cost + self.room_cost + self.other_charges
    }
}

/// Bill as shown to callers, with the derived total alongside the stored components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillView {
    #[serde(flatten)]
    pub bill: Bill,
    pub total: f64,
}

impl From<Bill> for BillView {
    fn from(bill: Bill) -> Self {
        let total = bill.total();
        Self { bill, total }
    }
}
