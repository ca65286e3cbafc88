pub mod appointment_dto;

pub use appointment_dto::*;
