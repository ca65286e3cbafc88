pub mod geocoding_service;
pub mod psychologist_service;

pub use geocoding_service::GeocodingService;
pub use psychologist_service::PsychologistService;
