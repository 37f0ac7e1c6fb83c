//! Inpatient admissions.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use crate::entities::rooms::is_occupied;
use crate::error::{HospitalError, HospitalResult};
use crate::schema::{admission, allocated, assigned_to};
use crate::store::{IdSequence, next_id};

use super::{given, require_patient};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAdmission {
    pub patient_id: i32,
    #[serde(default)]
    pub doctor_id: Option<i32>,
    #[serde(default)]
    pub nurse_id: Option<i32>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub days_count: Option<i32>,
    #[serde(default)]
    pub admission_fee: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionCreated {
    pub admission_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = admission)]
#[diesel(treat_none_as_default_value = false)]
struct AdmissionRow {
    admission_id: i32,
    admission_fee: f64,
    admission_date: NaiveDate,
    discharge_date: Option<NaiveDate>,
}

#[derive(Insertable)]
#[diesel(table_name = allocated)]
struct AllocationRow<'a> {
    admission_id: i32,
    room_id: &'a str,
    days_count: i32,
}

#[derive(Insertable)]
#[diesel(table_name = assigned_to)]
#[diesel(treat_none_as_default_value = false)]
struct AssignmentRow {
    admission_id: i32,
    patient_id: i32,
    doctor_id: Option<i32>,
    nurse_id: Option<i32>,
}

/// The patient's active admission, oldest first if several exist.
pub fn active_admission(conn: &mut SqliteConnection, patient_id: i32) -> HospitalResult<Option<i32>> {
    Ok(admission::table
        .inner_join(assigned_to::table)
        .filter(assigned_to::patient_id.eq(patient_id))
        .filter(admission::discharge_date.is_null())
        .order(admission::admission_id.asc())
        .select(admission::admission_id)
        .first::<i32>(conn)
        .optional()?)
}

/// Admit a patient, optionally into a room.
///
/// Runs in one transaction. A patient with an active admission cannot be admitted again, and a
/// room that is already allocated cannot be given out twice; both are reported as conflicts.
/// Doctor and nurse ids of zero or below are stored as unassigned.
pub fn create_admission(
    conn: &mut SqliteConnection,
    new: &NewAdmission,
    today: NaiveDate,
) -> HospitalResult<AdmissionCreated> {
    require_patient(new.patient_id)?;
    let days_count = new.days_count.unwrap_or(1);
    if days_count < 1 {
        return Err(HospitalError::InvalidInput("days_count must be at least 1".into()));
    }
    let admission_fee = new.admission_fee.unwrap_or(0.0);
    if !admission_fee.is_finite() || admission_fee < 0.0 {
        return Err(HospitalError::InvalidInput(
            "admission_fee must be a non-negative amount".into(),
        ));
    }
    let room_id = new
        .room_id
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let admission_id = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        if active_admission(conn, new.patient_id)?.is_some() {
            return Err(HospitalError::Conflict(format!(
                "patient {} already has an active admission",
                new.patient_id
            )));
        }
        if let Some(room_id) = room_id {
            if is_occupied(conn, room_id)? {
                return Err(HospitalError::Conflict(format!("room {room_id} is occupied")));
            }
        }

        let admission_id = next_id(conn, IdSequence::Admission)?;
        diesel::insert_into(admission::table)
            .values(&AdmissionRow {
                admission_id,
                admission_fee,
                admission_date: today,
                discharge_date: None,
            })
            .execute(conn)?;

        if let Some(room_id) = room_id {
            diesel::insert_into(allocated::table)
                .values(&AllocationRow {
                    admission_id,
                    room_id,
                    days_count,
                })
                .execute(conn)?;
        }

        diesel::insert_into(assigned_to::table)
            .values(&AssignmentRow {
                admission_id,
                patient_id: new.patient_id,
                doctor_id: given(new.doctor_id),
                nurse_id: given(new.nurse_id),
            })
            .execute(conn)?;

        Ok(admission_id)
    })?;

    tracing::info!(
        patient_id = new.patient_id,
        admission_id,
        room_id = room_id.unwrap_or("-"),
        "patient admitted"
    );
    Ok(AdmissionCreated { admission_id })
}
