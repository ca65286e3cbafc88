//! Patient reviews of completed sessions.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | POST | /api/reviews | Patient, own completed appointment |
//! | GET | /api/psychologists/{id}/reviews | Public |
//! | DELETE | /api/reviews/{id} | Administrator |
//!
//! Each appointment is reviewed at most once. The profile's
//! `rating_avg`/`rating_count` are recomputed on every change.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
