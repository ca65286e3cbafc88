//! Profile image uploads.
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | POST | /api/files/upload | Authenticated |
//! | DELETE | /api/files/{id} | Uploader or administrator |
//!
//! Images land in object storage under a world-readable prefix; the
//! returned URL can be set as a user's `avatar_url`.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::FileService;
