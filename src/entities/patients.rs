//! Patients and their phone numbers.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Deserialize;

use crate::error::{HospitalError, HospitalResult};
use crate::models::Patient;
use crate::schema::{patient, patient_phone};
use crate::store::{IdSequence, next_id};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub relative_num: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

#[derive(Insertable)]
#[diesel(table_name = patient)]
#[diesel(treat_none_as_default_value = false)]
struct PatientRow<'a> {
    pid: i32,
    name: &'a str,
    gender: Option<&'a str>,
    birthdate: Option<NaiveDate>,
    relative_num: Option<&'a str>,
    address: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = patient_phone)]
struct PhoneRow<'a> {
    patient_id: i32,
    phone_number: &'a str,
}

/// Partial update of a patient's demographic fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[serde(default)]
#[diesel(table_name = patient)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub relative_num: Option<String>,
    pub address: Option<String>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.birthdate.is_none()
            && self.relative_num.is_none()
            && self.address.is_none()
    }
}

/// Insert a patient and their phone numbers. Blank and repeated numbers are skipped.
pub fn create_patient(conn: &mut SqliteConnection, new: &NewPatient) -> HospitalResult<i32> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(HospitalError::InvalidInput("patient name is required".into()));
    }

    let mut phones: Vec<&str> = Vec::new();
    for number in new.phone_numbers.iter().map(|n| n.trim()) {
        if !number.is_empty() && !phones.contains(&number) {
            phones.push(number);
        }
    }

    let pid = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        let pid = next_id(conn, IdSequence::Patient)?;
        diesel::insert_into(patient::table)
            .values(&PatientRow {
                pid,
                name,
                gender: new.gender.as_deref(),
                birthdate: new.birthdate,
                relative_num: new.relative_num.as_deref(),
                address: new.address.as_deref(),
            })
            .execute(conn)?;

        let rows: Vec<PhoneRow<'_>> = phones
            .iter()
            .map(|&phone_number| PhoneRow {
                patient_id: pid,
                phone_number,
            })
            .collect();
        if !rows.is_empty() {
            diesel::insert_into(patient_phone::table)
                .values(&rows)
                .execute(conn)?;
        }
        Ok(pid)
    })?;

    tracing::info!(pid, phones = phones.len(), "patient created");
    Ok(pid)
}

pub fn list_patients(conn: &mut SqliteConnection) -> HospitalResult<Vec<Patient>> {
    Ok(patient::table
        .order(patient::pid.asc())
        .select(Patient::as_select())
        .load(conn)?)
}

pub fn update_patient(
    conn: &mut SqliteConnection,
    pid: i32,
    changes: &PatientChanges,
) -> HospitalResult<()> {
    if changes.is_empty() {
        return Err(HospitalError::InvalidInput("no valid fields to update".into()));
    }
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(HospitalError::InvalidInput("patient name cannot be blank".into()));
    }

    let updated = diesel::update(patient::table.find(pid))
        .set(changes)
        .execute(conn)?;
    if updated == 0 {
        return Err(HospitalError::NotFound(format!("patient {pid}")));
    }
    Ok(())
}

/// Delete a patient and their phone numbers. Any clinical or billing history referencing the
/// patient makes the delete fail and nothing is removed.
pub fn delete_patient(conn: &mut SqliteConnection, pid: i32) -> HospitalResult<()> {
    conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        diesel::delete(patient_phone::table.filter(patient_phone::patient_id.eq(pid)))
            .execute(conn)?;
        let deleted = diesel::delete(patient::table.find(pid)).execute(conn)?;
        if deleted == 0 {
            return Err(HospitalError::NotFound(format!("patient {pid}")));
        }
        Ok(())
    })?;
    tracing::info!(pid, "patient deleted");
    Ok(())
}
