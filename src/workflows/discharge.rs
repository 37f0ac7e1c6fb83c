//! Discharge: closes the active admission and releases its room.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use super::admission::active_admission;
use crate::error::{HospitalError, HospitalResult};
use crate::schema::{admission, allocated};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discharged {
    pub admission_id: i32,
    pub discharge_date: NaiveDate,
    /// Room released by this discharge, if the admission held one.
    pub freed_room: Option<String>,
}

/// Close the patient's active admission and release its room.
///
/// The allocation row is deleted, which is what makes the room available again.
pub fn discharge_patient(
    conn: &mut SqliteConnection,
    patient_id: i32,
    today: NaiveDate,
) -> HospitalResult<Discharged> {
    let discharged = conn.immediate_transaction::<_, HospitalError, _>(|conn| {
        let admission_id = active_admission(conn, patient_id)?.ok_or_else(|| {
            HospitalError::NotFound(format!("active admission for patient {patient_id}"))
        })?;

        diesel::update(admission::table.find(admission_id))
            .set(admission::discharge_date.eq(Some(today)))
            .execute(conn)?;

        let freed_room: Option<String> = allocated::table
            .find(admission_id)
            .select(allocated::room_id)
            .first(conn)
            .optional()?;
        if freed_room.is_some() {
            diesel::delete(allocated::table.find(admission_id)).execute(conn)?;
        }

        Ok(Discharged {
            admission_id,
            discharge_date: today,
            freed_room,
        })
    })?;

    tracing::info!(
        patient_id,
        admission_id = discharged.admission_id,
        room_id = discharged.freed_room.as_deref().unwrap_or("-"),
        "patient discharged"
    );
    Ok(discharged)
}
