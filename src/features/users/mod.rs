//! Account profile management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Access |
//! |--------|----------|--------|
//! | GET | `/api/users` | administrator |
//! | GET | `/api/users/{id}` | owner or administrator |
//! | PATCH | `/api/users/{id}` | owner or administrator |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;
