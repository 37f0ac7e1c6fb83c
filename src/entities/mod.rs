//! Single-entity maintenance: patients, employees, rooms and the test/medicine catalogs.

pub mod catalog;
pub mod employees;
pub mod patients;
pub mod rooms;
