pub mod record_dto;

pub use record_dto::*;
