use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for a psychologist's practice profile.
///
/// One row per psychologist account (`user_id` is unique). Coordinates
/// are nullable: they stay `NULL` when geocoding the practice address
/// fails, and such profiles simply never match proximity searches.
#[derive(Debug, Clone, FromRow)]
pub struct PsychologistProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: String,
    pub specialties: Vec<String>,
    pub license_number: String,
    pub price_per_session: Decimal,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub rating_avg: Decimal,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile row joined with the owning user account, as returned by the
/// public search query. `distance_meters` is only present when the
/// search carried a proximity filter.
#[derive(Debug, Clone, FromRow)]
pub struct PsychologistListing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub specialties: Vec<String>,
    pub license_number: String,
    pub price_per_session: Decimal,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub rating_avg: Decimal,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub distance_meters: Option<f64>,
}

/// Bounding box half-widths (degrees) for a radius in meters, used to
/// prefilter rows before the exact Haversine check. The longitude delta
/// widens with latitude; the denominator is floored so the box stays
/// finite near the poles.
pub fn bounding_box_deltas(latitude: f64, radius_meters: f64) -> (f64, f64) {
    let lat_delta = (radius_meters / 111_000.0) * 2.0;
    let lon_delta = lat_delta / latitude.to_radians().cos().abs().max(0.01);
    (lat_delta, lon_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_contains_radius() {
        let (lat_delta, lon_delta) = bounding_box_deltas(-6.2, 10_000.0);
        // 10 km is about 0.09 degrees of latitude; the box doubles it.
        assert!(lat_delta > 0.09 && lat_delta < 0.25);
        assert!(lon_delta >= lat_delta);
    }

    #[test]
    fn test_bounding_box_near_poles_stays_finite() {
        let (_, lon_delta) = bounding_box_deltas(89.9, 10_000.0);
        assert!(lon_delta.is_finite());
    }
}
