//! Next-identifier allocation for the integer-keyed tables.
//!
//! `next_id` reads `max(key) + 1`. It is only race-free inside an IMMEDIATE transaction, which
//! takes SQLite's write lock at BEGIN so no other writer can insert between the read and the
//! caller's insert. Every creation path in this crate calls it that way.

use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::{HospitalError, HospitalResult};
use crate::schema::{admission, bill, employee, lab_test, medicine, patient, treatment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSequence {
    Patient,
    Employee,
    Admission,
    Treatment,
    Bill,
    LabTest,
    Medicine,
}

impl IdSequence {
    pub fn table_name(self) -> &'static str {
        match self {
            IdSequence::Patient => "patient",
            IdSequence::Employee => "employee",
            IdSequence::Admission => "admission",
            IdSequence::Treatment => "treatment",
            IdSequence::Bill => "bill",
            IdSequence::LabTest => "lab_test",
            IdSequence::Medicine => "medicine",
        }
    }

    fn current_max(self, conn: &mut SqliteConnection) -> QueryResult<Option<i32>> {
        match self {
            IdSequence::Patient => patient::table.select(max(patient::pid)).get_result(conn),
            IdSequence::Employee => employee::table.select(max(employee::eid)).get_result(conn),
            IdSequence::Admission => admission::table
                .select(max(admission::admission_id))
                .get_result(conn),
            IdSequence::Treatment => treatment::table.select(max(treatment::tid)).get_result(conn),
            IdSequence::Bill => bill::table.select(max(bill::bill_id)).get_result(conn),
            IdSequence::LabTest => lab_test::table.select(max(lab_test::test_id)).get_result(conn),
            IdSequence::Medicine => medicine::table
                .select(max(medicine::medicine_id))
                .get_result(conn),
        }
    }
}

/// Return the next free identifier for `seq`, starting at 1 on an empty table.
pub fn next_id(conn: &mut SqliteConnection, seq: IdSequence) -> HospitalResult<i32> {
    let next = match seq.current_max(conn)? {
        Some(current) => current.checked_add(1).ok_or_else(|| {
            HospitalError::Conflict(format!("{} identifiers exhausted", seq.table_name()))
        })?,
        None => 1,
    };
    tracing::debug!(table = seq.table_name(), id = next, "allocated identifier");
    Ok(next)
}
