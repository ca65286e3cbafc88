//! Psychologist practice profiles and the public directory.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | GET | /api/psychologists | Public, verified profiles only |
//! | GET | /api/psychologists/{id} | Public, verified profiles only |
//! | POST | /api/psychologists | Psychologist |
//! | GET | /api/psychologists/me | Psychologist |
//! | PATCH | /api/psychologists/{id} | Owner or administrator |
//!
//! Directory search supports specialty and proximity filters; the
//! proximity predicate runs in SQL so the page and its total count
//! never disagree. Addresses are geocoded through Nominatim on create
//! and whenever the address changes.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
