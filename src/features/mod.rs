pub mod admin;
pub mod appointments;
pub mod auth;
pub mod files;
pub mod notifications;
pub mod payments;
pub mod psychologists;
pub mod records;
pub mod reviews;
pub mod users;
