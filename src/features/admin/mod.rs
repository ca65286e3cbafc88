//! Marketplace moderation and platform statistics.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | GET | /api/admin/users | Administrator |
//! | PATCH | /api/admin/users/{id}/status | Administrator |
//! | GET | /api/admin/psychologists | Administrator |
//! | POST | /api/admin/psychologists/{id}/verify | Administrator |
//! | GET | /api/admin/overview | Administrator |
//!
//! Also home of the [`workers::ReportWorker`] that mails a daily
//! activity summary to the administrator address.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod workers;
