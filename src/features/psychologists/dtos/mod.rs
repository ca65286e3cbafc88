pub mod psychologist_dto;

pub use psychologist_dto::*;
