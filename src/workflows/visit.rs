//! Outpatient visits: a treatment record, its associations, and the bill it produces.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use crate::entities::catalog::{lab_test_cost, medicine_cost};
use crate::error::{HospitalError, HospitalResult};
use crate::schema::{bill, consults, doctor, had, takes, takes_medicine, treatment};
use crate::store::{IdSequence, next_id};

use super::{given, given_ids, require_patient};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVisit {
    pub patient_id: i32,
    #[serde(default)]
    pub doctor_id: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub treatment_date: Option<NaiveDate>,
    #[serde(default)]
    pub test_ids: Vec<i32>,
    #[serde(default)]
    pub medicine_ids: Vec<i32>,
    #[serde(default)]
    pub other_charges: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitCreated {
    pub treatment_id: i32,
    pub bill_id: i32,
    pub total_cost: f64,
}

/// Cost breakdown of a visit.
///
/// The bill row stores doctor, medicine and other charges (room is always 0 for a visit). The
/// test component has no column on the bill, yet it is part of the total reported to the
/// caller, so a visit's total cannot be rebuilt from its bill row alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisitCharges {
    pub doctor: f64,
    pub tests: f64,
    pub medicines: f64,
    pub other: f64,
}

impl VisitCharges {
    pub fn total(&self) -> f64 {
        self.doctor + self.tests + self.medicines + self.other
    }
}

#[derive(Insertable)]
#[diesel(table_name = treatment)]
#[diesel(treat_none_as_default_value = false)]
struct TreatmentRow<'a> {
    tid: i32,
    description: Option<&'a str>,
    treatment_date: NaiveDate,
}

#[derive(Insertable)]
#[diesel(table_name = had)]
struct HadRow {
    treatment_id: i32,
    test_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = takes_medicine)]
struct TakesMedicineRow {
    treatment_id: i32,
    medicine_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = bill)]
struct BillRow {
    bill_id: i32,
    patient_id: i32,
    bill_date: NaiveDate,
    other_charges: f64,
    medicine_cost: f64,
    room_cost: f64,
    doctor_cost: f64,
}

fn doctor_fee(conn: &mut SqliteConnection, doctor_id: Option<i32>) -> HospitalResult<f64> {
    let Some(doctor_id) = doctor_id else {
        return Ok(0.0);
    };
    let fee = doctor::table
        .find(doctor_id)
        .select(doctor::visit_fee)
        .first::<f64>(conn)
        .optional()?;
    Ok(fee.unwrap_or(0.0))
}

/// Record a visit and bill it, all in one transaction.
///
/// Association rows are written once per listed id, duplicates included. Costs are summed over
/// the distinct catalog rows the ids refer to. Ids of zero or below are skipped. Unknown patient,
/// doctor, test or medicine ids fail the whole visit and nothing is kept.
pub fn create_visit(
    conn: &mut SqliteConnection,
    visit: &NewVisit,
    today: NaiveDate,
) -> HospitalResult<VisitCreated> {
    require_patient(visit.patient_id)?;
    let doctor_id = given(visit.doctor_id);
    let test_ids = given_ids(&visit.test_ids);
    let medicine_ids = given_ids(&visit.medicine_ids);
    let other_charges = visit.other_charges.unwrap_or(0.0);
    if !other_charges.is_finite() || other_charges < 0.0 {
        return Err(HospitalError::InvalidInput(
            "other_charges must be a non-negative amount".into(),
        ));
    }

    let created = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        let treatment_id = next_id(conn, IdSequence::Treatment)?;
        diesel::insert_into(treatment::table)
            .values(&TreatmentRow {
                tid: treatment_id,
                description: visit.description.as_deref(),
                treatment_date: visit.treatment_date.unwrap_or(today),
            })
            .execute(conn)?;

        diesel::insert_into(takes::table)
            .values((
                takes::patient_id.eq(visit.patient_id),
                takes::treatment_id.eq(treatment_id),
            ))
            .execute(conn)?;

        if let Some(doctor_id) = doctor_id {
            diesel::insert_into(consults::table)
                .values((
                    consults::treatment_id.eq(treatment_id),
                    consults::doctor_id.eq(doctor_id),
                ))
                .execute(conn)?;
        }

        if !test_ids.is_empty() {
            let rows: Vec<HadRow> = test_ids
                .iter()
                .map(|&test_id| HadRow {
                    treatment_id,
                    test_id,
                })
                .collect();
            diesel::insert_into(had::table).values(&rows).execute(conn)?;
        }

        if !medicine_ids.is_empty() {
            let rows: Vec<TakesMedicineRow> = medicine_ids
                .iter()
                .map(|&medicine_id| TakesMedicineRow {
                    treatment_id,
                    medicine_id,
                })
                .collect();
            diesel::insert_into(takes_medicine::table)
                .values(&rows)
                .execute(conn)?;
        }

        let bill_id = next_id(conn, IdSequence::Bill)?;
        let charges = VisitCharges {
            doctor: doctor_fee(conn, doctor_id)?,
            tests: lab_test_cost(conn, &test_ids)?,
            medicines: medicine_cost(conn, &medicine_ids)?,
            other: other_charges,
        };

        diesel::insert_into(bill::table)
            .values(&BillRow {
                bill_id,
                patient_id: visit.patient_id,
                bill_date: today,
                other_charges: charges.other,
                medicine_cost: charges.medicines,
                room_cost: 0.0,
                doctor_cost: charges.doctor,
            })
            .execute(conn)?;

        Ok(VisitCreated {
            treatment_id,
            bill_id,
            total_cost: charges.total(),
        })
    })?;

    tracing::info!(
        patient_id = visit.patient_id,
        treatment_id = created.treatment_id,
        bill_id = created.bill_id,
        total_cost = created.total_cost,
        "visit created"
    );
    Ok(created)
}
