//! Lab test and medicine catalogs: fixed-cost lookups referenced by visits.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{HospitalError, HospitalResult};
use crate::models::{LabTest, Medicine};
use crate::schema::{lab_test, medicine};
use crate::store::{IdSequence, next_id};

#[derive(Debug, Clone, Deserialize)]
pub struct NewLabTest {
    pub test_name: String,
    pub test_cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicine {
    pub medicine_name: String,
    pub medicine_cost: f64,
}

fn validate_entry(kind: &str, name: &str, cost: f64) -> HospitalResult<()> {
    if name.trim().is_empty() {
        return Err(HospitalError::InvalidInput(format!("{kind} name is required")));
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(HospitalError::InvalidInput(format!(
            "{kind} cost must be a non-negative amount"
        )));
    }
    Ok(())
}

pub fn create_lab_test(conn: &mut SqliteConnection, new: &NewLabTest) -> HospitalResult<i32> {
    validate_entry("test", &new.test_name, new.test_cost)?;
    let test_id = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        let test_id = next_id(conn, IdSequence::LabTest)?;
        diesel::insert_into(lab_test::table)
            .values((
                lab_test::test_id.eq(test_id),
                lab_test::test_name.eq(new.test_name.trim()),
                lab_test::test_cost.eq(new.test_cost),
            ))
            .execute(conn)?;
        Ok(test_id)
    })?;
    tracing::info!(test_id, "lab test added");
    Ok(test_id)
}

pub fn list_lab_tests(conn: &mut SqliteConnection) -> HospitalResult<Vec<LabTest>> {
    Ok(lab_test::table
        .order(lab_test::test_id.asc())
        .select(LabTest::as_select())
        .load(conn)?)
}

pub fn create_medicine(conn: &mut SqliteConnection, new: &NewMedicine) -> HospitalResult<i32> {
    validate_entry("medicine", &new.medicine_name, new.medicine_cost)?;
    let medicine_id = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        let medicine_id = next_id(conn, IdSequence::Medicine)?;
        diesel::insert_into(medicine::table)
            .values((
                medicine::medicine_id.eq(medicine_id),
                medicine::medicine_name.eq(new.medicine_name.trim()),
                medicine::medicine_cost.eq(new.medicine_cost),
            ))
            .execute(conn)?;
        Ok(medicine_id)
    })?;
    tracing::info!(medicine_id, "medicine added");
    Ok(medicine_id)
}

pub fn list_medicines(conn: &mut SqliteConnection) -> HospitalResult<Vec<Medicine>> {
    Ok(medicine::table
        .order(medicine::medicine_id.asc())
        .select(Medicine::as_select())
        .load(conn)?)
}

/// Sum of catalog costs over the distinct ids listed. Repeated ids count once; unknown ids
/// contribute nothing.
pub fn lab_test_cost(conn: &mut SqliteConnection, ids: &[i32]) -> HospitalResult<f64> {
    if ids.is_empty() {
        return Ok(0.0);
    }
    let total: Option<f64> = lab_test::table
        .filter(lab_test::test_id.eq_any(ids.to_vec()))
        .select(diesel::dsl::sum(lab_test::test_cost))
        .get_result(conn)?;
    Ok(total.unwrap_or(0.0))
}

/// See [`lab_test_cost`].
pub fn medicine_cost(conn: &mut SqliteConnection, ids: &[i32]) -> HospitalResult<f64> {
    if ids.is_empty() {
        return Ok(0.0);
    }
    let total: Option<f64> = medicine::table
        .filter(medicine::medicine_id.eq_any(ids.to_vec()))
        .select(diesel::dsl::sum(medicine::medicine_cost))
        .get_result(conn)?;
    Ok(total.unwrap_or(0.0))
}
