/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// PROXIMITY SEARCH
// =============================================================================

/// Default search radius when a proximity filter omits `radius_km`
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;

/// Upper bound for `radius_km`; larger values are clamped
pub const MAX_SEARCH_RADIUS_KM: f64 = 500.0;

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum accepted upload size for profile images (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted by the image upload endpoint
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

// =============================================================================
// APPOINTMENTS
// =============================================================================

/// Session length used when a booking does not specify one
pub const DEFAULT_SESSION_MINUTES: i32 = 60;

/// Appointment reminders go out when the session starts within this window
pub const REMINDER_WINDOW_HOURS: i32 = 24;
