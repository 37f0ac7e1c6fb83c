//! Multi-table write workflows. Each one runs inside a single IMMEDIATE transaction and either
//! commits every row it touches or none of them.

pub mod admission;
pub mod discharge;
pub mod visit;

pub use admission::{AdmissionCreated, NewAdmission, create_admission};
pub use discharge::{Discharged, discharge_patient};
pub use visit::{NewVisit, VisitCharges, VisitCreated, create_visit};

use crate::error::{HospitalError, HospitalResult};

/// Optional references of zero or below mean "not given".
pub(crate) fn given(id: Option<i32>) -> Option<i32> {
    id.filter(|&id| id > 0)
}

pub(crate) fn given_ids(ids: &[i32]) -> Vec<i32> {
    ids.iter().copied().filter(|&id| id > 0).collect()
}

pub(crate) fn require_patient(patient_id: i32) -> HospitalResult<()> {
    if patient_id < 1 {
        return Err(HospitalError::InvalidInput("patient_id is required".into()));
    }
    Ok(())
}
