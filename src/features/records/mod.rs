//! Clinical records.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | POST | /api/records | Psychologist treating the patient |
//! | GET | /api/records | Authenticated, role-scoped |
//! | GET | /api/records/{id} | Patient, author or administrator |
//! | PATCH | /api/records/{id} | Author or administrator |
//!
//! Patients can always read what is written about them but never
//! write; authorship requires a non-cancelled appointment between the
//! psychologist and the patient.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
