//! Payments and the gateway webhook.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | POST | /api/payments | Patient, own appointment |
//! | GET | /api/payments | Authenticated, role-scoped |
//! | GET | /api/payments/{id} | Participant or administrator |
//! | POST | /api/payments/webhook | Gateway, HMAC-signed |
//!
//! A settled payment confirms its pending appointment automatically
//! and mails the patient a receipt.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
