//! Read-only projections for the presentation layer.
//!
//! Each projection runs in one read transaction so it sees a single snapshot, and orders every
//! collection by key so repeated reads of unchanged data are identical.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::error::{HospitalError, HospitalResult};
use crate::models::{
    Admission, Allocation, Assignment, Bill, BillView, Doctor, Employee, LabTest, Medicine, Nurse,
    Patient, Room, Treatment,
};
use crate::schema::{
    admission, allocated, assigned_to, bill, consults, doctor, employee, had, lab_test, medicine,
    nurse, patient, patient_phone, room, takes, takes_medicine, treatment,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatientStatus {
    Admitted,
    Outpatient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    #[serde(flatten)]
    pub patient: Patient,
    /// Phone numbers joined with `,`, empty when none are on file.
    pub phone_numbers: String,
    pub status: PatientStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoomStatus {
    Occupied,
    Available,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorSummary {
    #[serde(flatten)]
    pub employee: Employee,
    #[serde(flatten)]
    pub doctor: Doctor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NurseSummary {
    #[serde(flatten)]
    pub employee: Employee,
    #[serde(flatten)]
    pub nurse: Nurse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentDetail {
    pub tid: i32,
    pub description: Option<String>,
    pub treatment_date: NaiveDate,
    pub doctor_name: Option<String>,
    pub tests: Vec<LabTest>,
    pub medicines: Vec<Medicine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionDetail {
    #[serde(flatten)]
    pub admission: Admission,
    pub room: Option<Room>,
    pub days_count: Option<i32>,
    pub doctor_name: Option<String>,
    pub nurse_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub phone_numbers: Vec<String>,
    pub treatments: Vec<TreatmentDetail>,
    pub admissions: Vec<AdmissionDetail>,
    pub bills: Vec<BillView>,
}

/// Every patient with their phone numbers and whether they currently hold an active admission.
pub fn patient_roster(conn: &mut SqliteConnection) -> HospitalResult<Vec<PatientSummary>> {
    conn.transaction::<_, HospitalError, _>(|conn| {
        let patients: Vec<Patient> = patient::table
            .order(patient::pid.asc())
            .select(Patient::as_select())
            .load(conn)?;

        let mut phones: HashMap<i32, Vec<String>> = HashMap::new();
        let phone_rows: Vec<(i32, String)> = patient_phone::table
            .order((patient_phone::patient_id.asc(), patient_phone::phone_number.asc()))
            .load(conn)?;
        for (pid, number) in phone_rows {
            phones.entry(pid).or_default().push(number);
        }

        let admitted: HashSet<i32> = assigned_to::table
            .inner_join(admission::table)
            .filter(admission::discharge_date.is_null())
            .select(assigned_to::patient_id)
            .load::<i32>(conn)?
            .into_iter()
            .collect();

        Ok(patients
            .into_iter()
            .map(|patient| {
                let status = if admitted.contains(&patient.pid) {
                    PatientStatus::Admitted
                } else {
                    PatientStatus::Outpatient
                };
                let phone_numbers = phones
                    .remove(&patient.pid)
                    .map(|numbers| numbers.join(","))
                    .unwrap_or_default();
                PatientSummary {
                    patient,
                    phone_numbers,
                    status,
                }
            })
            .collect())
    })
}

pub fn room_roster(conn: &mut SqliteConnection) -> HospitalResult<Vec<RoomSummary>> {
    conn.transaction::<_, HospitalError, _>(|conn| {
        let rooms: Vec<Room> = room::table
            .order(room::room_id.asc())
            .select(Room::as_select())
            .load(conn)?;
        let occupied: HashSet<String> = allocated::table
            .select(allocated::room_id)
            .load::<String>(conn)?
            .into_iter()
            .collect();

        Ok(rooms
            .into_iter()
            .map(|room| {
                let status = if occupied.contains(&room.room_id) {
                    RoomStatus::Occupied
                } else {
                    RoomStatus::Available
                };
                RoomSummary { room, status }
            })
            .collect())
    })
}

pub fn doctor_roster(conn: &mut SqliteConnection) -> HospitalResult<Vec<DoctorSummary>> {
    let rows: Vec<(Employee, Doctor)> = employee::table
        .inner_join(doctor::table)
        .order(employee::eid.asc())
        .select((Employee::as_select(), Doctor::as_select()))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(employee, doctor)| DoctorSummary { employee, doctor })
        .collect())
}

pub fn nurse_roster(conn: &mut SqliteConnection) -> HospitalResult<Vec<NurseSummary>> {
    let rows: Vec<(Employee, Nurse)> = employee::table
        .inner_join(nurse::table)
        .order(employee::eid.asc())
        .select((Employee::as_select(), Nurse::as_select()))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(employee, nurse)| NurseSummary { employee, nurse })
        .collect())
}

fn employee_names(
    conn: &mut SqliteConnection,
    ids: Vec<i32>,
) -> HospitalResult<HashMap<i32, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i32, String)> = employee::table
        .filter(employee::eid.eq_any(ids))
        .select((employee::eid, employee::name))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

fn treatments_for(
    conn: &mut SqliteConnection,
    pid: i32,
) -> HospitalResult<Vec<TreatmentDetail>> {
    let treatments: Vec<Treatment> = treatment::table
        .inner_join(takes::table)
        .filter(takes::patient_id.eq(pid))
        .order(treatment::tid.asc())
        .select(Treatment::as_select())
        .load(conn)?;
    let tids: Vec<i32> = treatments.iter().map(|t| t.tid).collect();

    let doctor_names: HashMap<i32, String> = consults::table
        .inner_join(employee::table)
        .filter(consults::treatment_id.eq_any(tids.clone()))
        .select((consults::treatment_id, employee::name))
        .load::<(i32, String)>(conn)?
        .into_iter()
        .collect();

    let mut tests: BTreeMap<i32, Vec<LabTest>> = BTreeMap::new();
    let test_rows: Vec<(i32, LabTest)> = had::table
        .inner_join(lab_test::table)
        .filter(had::treatment_id.eq_any(tids.clone()))
        .order(had::id.asc())
        .select((had::treatment_id, LabTest::as_select()))
        .load(conn)?;
    for (tid, test) in test_rows {
        tests.entry(tid).or_default().push(test);
    }

    let mut medicines: BTreeMap<i32, Vec<Medicine>> = BTreeMap::new();
    let medicine_rows: Vec<(i32, Medicine)> = takes_medicine::table
        .inner_join(medicine::table)
        .filter(takes_medicine::treatment_id.eq_any(tids))
        .order(takes_medicine::id.asc())
        .select((takes_medicine::treatment_id, Medicine::as_select()))
        .load(conn)?;
    for (tid, item) in medicine_rows {
        medicines.entry(tid).or_default().push(item);
    }

    Ok(treatments
        .into_iter()
        .map(|t| TreatmentDetail {
            doctor_name: doctor_names.get(&t.tid).cloned(),
            tests: tests.remove(&t.tid).unwrap_or_default(),
            medicines: medicines.remove(&t.tid).unwrap_or_default(),
            tid: t.tid,
            description: t.description,
            treatment_date: t.treatment_date,
        })
        .collect())
}

fn admissions_for(
    conn: &mut SqliteConnection,
    pid: i32,
) -> HospitalResult<Vec<AdmissionDetail>> {
    let rows: Vec<(Assignment, Admission)> = assigned_to::table
        .inner_join(admission::table)
        .filter(assigned_to::patient_id.eq(pid))
        .order(admission::admission_id.asc())
        .select((Assignment::as_select(), Admission::as_select()))
        .load(conn)?;

    let admission_ids: Vec<i32> = rows.iter().map(|(a, _)| a.admission_id).collect();
    let rooms: HashMap<i32, (Allocation, Room)> = allocated::table
        .inner_join(room::table)
        .filter(allocated::admission_id.eq_any(admission_ids))
        .select((Allocation::as_select(), Room::as_select()))
        .load::<(Allocation, Room)>(conn)?
        .into_iter()
        .map(|(allocation, room)| (allocation.admission_id, (allocation, room)))
        .collect();

    let staff_ids: Vec<i32> = rows
        .iter()
        .flat_map(|(a, _)| [a.doctor_id, a.nurse_id])
        .flatten()
        .collect();
    let names = employee_names(conn, staff_ids)?;

    Ok(rows
        .into_iter()
        .map(|(assignment, admission)| {
            let (days_count, room) = match rooms.get(&assignment.admission_id) {
                Some((allocation, room)) => (Some(allocation.days_count), Some(room.clone())),
                None => (None, None),
            };
            AdmissionDetail {
                admission,
                room,
                days_count,
                doctor_name: assignment.doctor_id.and_then(|id| names.get(&id).cloned()),
                nurse_name: assignment.nurse_id.and_then(|id| names.get(&id).cloned()),
            }
        })
        .collect())
}

/// Everything on file for one patient.
pub fn patient_detail(conn: &mut SqliteConnection, pid: i32) -> HospitalResult<PatientDetail> {
    conn.transaction::<_, HospitalError, _>(|conn| {
        let patient: Patient = patient::table
            .find(pid)
            .select(Patient::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| HospitalError::NotFound(format!("patient {pid}")))?;

        let phone_numbers: Vec<String> = patient_phone::table
            .filter(patient_phone::patient_id.eq(pid))
            .order(patient_phone::phone_number.asc())
            .select(patient_phone::phone_number)
            .load(conn)?;

        let treatments = treatments_for(conn, pid)?;
        let admissions = admissions_for(conn, pid)?;

        let bills: Vec<BillView> = bill::table
            .filter(bill::patient_id.eq(pid))
            .order(bill::bill_id.asc())
            .select(Bill::as_select())
            .load(conn)?
            .into_iter()
            .map(BillView::from)
            .collect();

        Ok(PatientDetail {
            patient,
            phone_numbers,
            treatments,
            admissions,
            bills,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::catalog::{NewLabTest, NewMedicine, create_lab_test, create_medicine};
    use crate::entities::employees::{EmployeeType, NewEmployee, create_employee, tests::doctor_with_fee};
    use crate::entities::patients::{NewPatient, create_patient, tests::jane_doe};
    use crate::entities::rooms::{create_room, tests::ward};
    use crate::store::testing::temp_store;
    use crate::workflows::{NewAdmission, NewVisit, create_admission, create_visit, discharge_patient};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn roster_status_tracks_active_admissions_only() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        let jane = create_patient(&mut conn, &jane_doe()).unwrap();
        let john = create_patient(
            &mut conn,
            &NewPatient {
                name: "John Roe".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let admit = |patient_id| NewAdmission {
            patient_id,
            ..Default::default()
        };
        create_admission(&mut conn, &admit(jane), day(1)).unwrap();
        create_admission(&mut conn, &admit(john), day(1)).unwrap();
        discharge_patient(&mut conn, john, day(2)).unwrap();

        let roster = patient_roster(&mut conn).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].status, PatientStatus::Admitted);
        assert_eq!(roster[0].phone_numbers, "555-0100,555-0101");
        assert_eq!(roster[1].status, PatientStatus::Outpatient);
        assert_eq!(roster[1].phone_numbers, "");
    }

    #[test]
    fn room_status_follows_allocation() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        let pid = create_patient(&mut conn, &jane_doe()).unwrap();
        create_room(&mut conn, &ward("R1", 100.0)).unwrap();
        create_room(&mut conn, &ward("R2", 90.0)).unwrap();

        create_admission(
            &mut conn,
            &NewAdmission {
                patient_id: pid,
                room_id: Some("R2".into()),
                ..Default::default()
            },
            day(1),
        )
        .unwrap();

        let statuses: Vec<(String, RoomStatus)> = room_roster(&mut conn)
            .unwrap()
            .into_iter()
            .map(|r| (r.room.room_id, r.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("R1".to_string(), RoomStatus::Available),
                ("R2".to_string(), RoomStatus::Occupied),
            ]
        );
    }

    #[test]
    fn staff_rosters_join_specialisations() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        create_employee(&mut conn, &doctor_with_fee("Dr. Grey", 50.0)).unwrap();
        create_employee(&mut conn, &NewEmployee::new(EmployeeType::Nurse, "Nurse Joy")).unwrap();
        create_employee(&mut conn, &NewEmployee::new(EmployeeType::Other, "Porter")).unwrap();

        let doctors = doctor_roster(&mut conn).unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].employee.name, "Dr. Grey");
        assert_eq!(doctors[0].doctor.visit_fee, 50.0);

        let nurses = nurse_roster(&mut conn).unwrap();
        assert_eq!(nurses.len(), 1);
        assert_eq!(nurses[0].nurse.nurse_id, nurses[0].employee.eid);
    }

    #[test]
    fn patient_detail_collects_history_and_is_stable() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        let pid = create_patient(&mut conn, &jane_doe()).unwrap();
        let doc = create_employee(&mut conn, &doctor_with_fee("Dr. Grey", 50.0)).unwrap();
        let nurse = create_employee(&mut conn, &NewEmployee::new(EmployeeType::Nurse, "Nurse Joy"))
            .unwrap();
        let cbc = create_lab_test(&mut conn, &NewLabTest { test_name: "CBC".into(), test_cost: 20.0 })
            .unwrap();
        let para = create_medicine(
            &mut conn,
            &NewMedicine { medicine_name: "Paracetamol".into(), medicine_cost: 5.0 },
        )
        .unwrap();
        create_room(&mut conn, &ward("R1", 100.0)).unwrap();

        create_visit(
            &mut conn,
            &NewVisit {
                patient_id: pid,
                doctor_id: Some(doc),
                description: Some("Fever".into()),
                test_ids: vec![cbc],
                medicine_ids: vec![para],
                other_charges: Some(10.0),
                ..Default::default()
            },
            day(3),
        )
        .unwrap();
        create_admission(
            &mut conn,
            &NewAdmission {
                patient_id: pid,
                doctor_id: Some(doc),
                nurse_id: Some(nurse),
                room_id: Some("R1".into()),
                days_count: Some(2),
                admission_fee: Some(100.0),
            },
            day(4),
        )
        .unwrap();

        let detail = patient_detail(&mut conn, pid).unwrap();
        assert_eq!(detail.phone_numbers, vec!["555-0100", "555-0101"]);

        assert_eq!(detail.treatments.len(), 1);
        let visit = &detail.treatments[0];
        assert_eq!(visit.doctor_name.as_deref(), Some("Dr. Grey"));
        assert_eq!(visit.tests[0].test_name, "CBC");
        assert_eq!(visit.medicines[0].medicine_name, "Paracetamol");

        assert_eq!(detail.admissions.len(), 1);
        let stay = &detail.admissions[0];
        assert_eq!(stay.room.as_ref().map(|r| r.room_id.as_str()), Some("R1"));
        assert_eq!(stay.days_count, Some(2));
        assert_eq!(stay.nurse_name.as_deref(), Some("Nurse Joy"));

        assert_eq!(detail.bills.len(), 1);
        assert_eq!(detail.bills[0].total, 65.0);

        let again = patient_detail(&mut conn, pid).unwrap();
        assert_eq!(detail, again);
        assert_eq!(
            serde_json::to_string(&detail).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }

    #[test]
    fn unknown_patient_detail_is_not_found() {
        let (_dir, store) = temp_store();
        let mut conn = store.conn().unwrap();
        assert!(matches!(patient_detail(&mut conn, 5), Err(HospitalError::NotFound(_))));
    }
}
