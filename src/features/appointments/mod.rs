//! Appointment booking and lifecycle.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | POST | /api/appointments | Patient |
//! | GET | /api/appointments | Authenticated, role-scoped |
//! | GET | /api/appointments/{id} | Participant or administrator |
//! | PATCH | /api/appointments/{id}/status | Participant, authority per transition |
//!
//! Bookings start `pending` and move through the lifecycle in
//! [`models::AppointmentStatus`]. A background worker emails patients
//! ahead of confirmed sessions.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;
