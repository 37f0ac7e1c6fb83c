//! Hospital administration service: patients, staff, rooms, visits and admissions over a pooled
//! SQLite store, exposed as a JSON API.

pub mod config;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod models;
pub mod queries;
pub mod schema;
pub mod store;
pub mod workflows;

pub use config::AppConfig;
pub use error::{ApiError, HospitalError, HospitalResult};
pub use store::HospitalStore;
