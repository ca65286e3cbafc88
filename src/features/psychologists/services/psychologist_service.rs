use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::authorize_ownership;
use crate::features::auth::models::Principal;
use crate::features::psychologists::dtos::{
    CreateProfileDto, PsychologistProfileDto, SearchPsychologistsQuery, UpdateProfileDto,
};
use crate::features::psychologists::models::{
    bounding_box_deltas, PsychologistListing, PsychologistProfile,
};
use crate::features::psychologists::services::geocoding_service::GeocodingService;
use crate::shared::constants::{DEFAULT_SEARCH_RADIUS_KM, MAX_SEARCH_RADIUS_KM};

/// Shared filter for the public directory. Both the COUNT and the page
/// query embed this same predicate so `meta.total` always agrees with
/// the rows being paged. Params: $1 specialty, $2 lat, $3 lng,
/// $4 radius in meters, $5/$6 bounding-box deltas in degrees.
const SEARCH_FILTER: &str = r#"
    p.is_verified = TRUE
    AND u.is_active = TRUE
    AND ($1::text IS NULL OR $1 = ANY(p.specialties))
    AND ($2::float8 IS NULL OR (
        p.latitude IS NOT NULL AND p.longitude IS NOT NULL
        AND p.latitude BETWEEN $2 - $5 AND $2 + $5
        AND p.longitude BETWEEN $3 - $6 AND $3 + $6
        AND 2.0 * 6371000.0 * asin(sqrt(
            pow(sin(radians(p.latitude - $2) / 2.0), 2)
            + cos(radians($2)) * cos(radians(p.latitude))
              * pow(sin(radians(p.longitude - $3) / 2.0), 2))) <= $4
    ))"#;

/// Proximity filter resolved from query params, in SQL bind order
struct ProximityFilter {
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    lat_delta: f64,
    lon_delta: f64,
}

pub struct PsychologistService {
    pool: PgPool,
    geocoding: Arc<GeocodingService>,
}

impl PsychologistService {
    pub fn new(pool: PgPool, geocoding: Arc<GeocodingService>) -> Self {
        Self { pool, geocoding }
    }

    /// Create the practice profile for a psychologist account. Each
    /// account gets at most one profile; new profiles start unverified
    /// and stay out of the public directory until an administrator
    /// verifies the license.
    pub async fn create_profile(
        &self,
        user_id: Uuid,
        dto: CreateProfileDto,
    ) -> Result<PsychologistProfileDto> {
        let specialties = normalize_specialties(dto.specialties)?;
        if dto.price_per_session <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Price per session must be positive".to_string(),
            ));
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM psychologist_profiles WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check existing profile: {:?}", e);
            AppError::Database(e)
        })?;

        if exists {
            return Err(AppError::Conflict(
                "A profile already exists for this account".to_string(),
            ));
        }

        let coordinates = self.geocode_best_effort(&dto.address).await;

        let profile = sqlx::query_as::<_, PsychologistProfile>(
            r#"
            INSERT INTO psychologist_profiles
                (user_id, bio, specialties, license_number, price_per_session,
                 address, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&dto.bio)
        .bind(&specialties)
        .bind(&dto.license_number)
        .bind(dto.price_per_session)
        .bind(&dto.address)
        .bind(coordinates.map(|c| c.0))
        .bind(coordinates.map(|c| c.1))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create psychologist profile: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Psychologist profile {} created for user {}",
            profile.id,
            user_id
        );

        self.attach_owner(profile).await
    }

    /// Update a profile. Only the owning psychologist or an
    /// administrator may do this; a changed address is re-geocoded and
    /// stale coordinates are dropped when geocoding finds no match.
    pub async fn update_profile(
        &self,
        profile_id: Uuid,
        principal: &Principal,
        dto: UpdateProfileDto,
    ) -> Result<PsychologistProfileDto> {
        let current = self.load_profile(profile_id).await?;
        authorize_ownership(Some(principal), current.user_id)?;

        if let Some(price) = dto.price_per_session {
            if price <= Decimal::ZERO {
                return Err(AppError::Validation(
                    "Price per session must be positive".to_string(),
                ));
            }
        }

        let specialties = match dto.specialties {
            Some(raw) => normalize_specialties(raw)?,
            None => current.specialties.clone(),
        };

        let address = dto.address.unwrap_or_else(|| current.address.clone());
        let (latitude, longitude) = if address != current.address {
            match self.geocode_best_effort(&address).await {
                Some((lat, lon)) => (Some(lat), Some(lon)),
                None => (None, None),
            }
        } else {
            (current.latitude, current.longitude)
        };

        let profile = sqlx::query_as::<_, PsychologistProfile>(
            r#"
            UPDATE psychologist_profiles
            SET bio = $2,
                specialties = $3,
                price_per_session = $4,
                address = $5,
                latitude = $6,
                longitude = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(profile_id)
        .bind(dto.bio.unwrap_or(current.bio))
        .bind(&specialties)
        .bind(dto.price_per_session.unwrap_or(current.price_per_session))
        .bind(&address)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update psychologist profile: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Psychologist profile {} updated", profile_id);

        self.attach_owner(profile).await
    }

    /// Public profile detail. Unverified or deactivated profiles are
    /// reported as not found.
    pub async fn get_profile(&self, id: Uuid) -> Result<PsychologistProfileDto> {
        let listing = sqlx::query_as::<_, PsychologistListing>(
            r#"
            SELECT p.id, p.user_id, u.full_name, u.avatar_url, p.bio, p.specialties,
                   p.license_number, p.price_per_session, p.address, p.latitude,
                   p.longitude, p.is_verified, p.rating_avg, p.rating_count,
                   p.created_at, NULL::float8 AS distance_meters
            FROM psychologist_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1 AND p.is_verified = TRUE AND u.is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch psychologist profile: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Psychologist profile not found".to_string()))?;

        Ok(listing.into())
    }

    /// The caller's own profile, verified or not
    pub async fn get_own_profile(&self, user_id: Uuid) -> Result<PsychologistProfileDto> {
        let listing = sqlx::query_as::<_, PsychologistListing>(
            r#"
            SELECT p.id, p.user_id, u.full_name, u.avatar_url, p.bio, p.specialties,
                   p.license_number, p.price_per_session, p.address, p.latitude,
                   p.longitude, p.is_verified, p.rating_avg, p.rating_count,
                   p.created_at, NULL::float8 AS distance_meters
            FROM psychologist_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch own psychologist profile: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Psychologist profile not found".to_string()))?;

        Ok(listing.into())
    }

    /// Search the public directory. Only verified profiles of active
    /// accounts are listed. Proximity search computes the Haversine
    /// distance in SQL, prefiltered by a bounding box, so the count
    /// and the page see exactly the same rows.
    pub async fn search(
        &self,
        query: &SearchPsychologistsQuery,
    ) -> Result<(Vec<PsychologistProfileDto>, i64)> {
        let proximity = resolve_proximity(query)?;
        let page = query.page_query();

        let specialty = query
            .specialty
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let count_sql = format!(
            "SELECT COUNT(*) FROM psychologist_profiles p \
             JOIN users u ON u.id = p.user_id WHERE {SEARCH_FILTER}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(&specialty)
            .bind(proximity.as_ref().map(|p| p.latitude))
            .bind(proximity.as_ref().map(|p| p.longitude))
            .bind(proximity.as_ref().map(|p| p.radius_meters))
            .bind(proximity.as_ref().map(|p| p.lat_delta))
            .bind(proximity.as_ref().map(|p| p.lon_delta))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count psychologist search: {:?}", e);
                AppError::Database(e)
            })?;

        let page_sql = format!(
            r#"
            SELECT p.id, p.user_id, u.full_name, u.avatar_url, p.bio, p.specialties,
                   p.license_number, p.price_per_session, p.address, p.latitude,
                   p.longitude, p.is_verified, p.rating_avg, p.rating_count,
                   p.created_at,
                   CASE WHEN $2::float8 IS NULL OR p.latitude IS NULL THEN NULL
                        ELSE 2.0 * 6371000.0 * asin(sqrt(
                            pow(sin(radians(p.latitude - $2) / 2.0), 2)
                            + cos(radians($2)) * cos(radians(p.latitude))
                              * pow(sin(radians(p.longitude - $3) / 2.0), 2)))
                   END AS distance_meters
            FROM psychologist_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE {SEARCH_FILTER}
            ORDER BY distance_meters ASC NULLS LAST, p.created_at DESC
            OFFSET $7 LIMIT $8
            "#
        );
        let rows = sqlx::query_as::<_, PsychologistListing>(&page_sql)
            .bind(&specialty)
            .bind(proximity.as_ref().map(|p| p.latitude))
            .bind(proximity.as_ref().map(|p| p.longitude))
            .bind(proximity.as_ref().map(|p| p.radius_meters))
            .bind(proximity.as_ref().map(|p| p.lat_delta))
            .bind(proximity.as_ref().map(|p| p.lon_delta))
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to search psychologists: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn load_profile(&self, id: Uuid) -> Result<PsychologistProfile> {
        sqlx::query_as::<_, PsychologistProfile>(
            "SELECT * FROM psychologist_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load psychologist profile: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Psychologist profile not found".to_string()))
    }

    /// Geocoding is best-effort: a profile with a failed lookup keeps
    /// NULL coordinates and is simply invisible to proximity search.
    async fn geocode_best_effort(&self, address: &str) -> Option<(f64, f64)> {
        match self.geocoding.geocode(address).await {
            Ok(Some(c)) => Some((c.latitude, c.longitude)),
            Ok(None) => {
                tracing::warn!("No geocoding match for address '{}'", address);
                None
            }
            Err(e) => {
                tracing::warn!("Geocoding failed for address '{}': {:?}", address, e);
                None
            }
        }
    }

    async fn attach_owner(&self, profile: PsychologistProfile) -> Result<PsychologistProfileDto> {
        let (full_name, avatar_url) = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT full_name, avatar_url FROM users WHERE id = $1",
        )
        .bind(profile.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load profile owner: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(PsychologistProfileDto::from_profile(profile, full_name, avatar_url))
    }
}

fn normalize_specialties(raw: Vec<String>) -> Result<Vec<String>> {
    let cleaned: Vec<String> = raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Err(AppError::Validation(
            "Provide at least one specialty".to_string(),
        ));
    }
    Ok(cleaned)
}

fn resolve_proximity(query: &SearchPsychologistsQuery) -> Result<Option<ProximityFilter>> {
    let (latitude, longitude) = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        (None, None) => return Ok(None),
        _ => {
            return Err(AppError::BadRequest(
                "lat and lng must be provided together".to_string(),
            ))
        }
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::BadRequest(
            "lat/lng out of range".to_string(),
        ));
    }

    let radius_km = query
        .radius_km
        .unwrap_or(DEFAULT_SEARCH_RADIUS_KM)
        .min(MAX_SEARCH_RADIUS_KM);
    if radius_km <= 0.0 {
        return Err(AppError::BadRequest(
            "radius_km must be positive".to_string(),
        ));
    }

    let radius_meters = radius_km * 1000.0;
    let (lat_delta, lon_delta) = bounding_box_deltas(latitude, radius_meters);

    Ok(Some(ProximityFilter {
        latitude,
        longitude,
        radius_meters,
        lat_delta,
        lon_delta,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_query(
        lat: Option<f64>,
        lng: Option<f64>,
        radius_km: Option<f64>,
    ) -> SearchPsychologistsQuery {
        SearchPsychologistsQuery {
            page: 1,
            limit: 10,
            specialty: None,
            lat,
            lng,
            radius_km,
        }
    }

    #[test]
    fn test_proximity_absent_when_no_coordinates() {
        let resolved = resolve_proximity(&search_query(None, None, Some(25.0))).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_proximity_requires_both_coordinates() {
        assert!(resolve_proximity(&search_query(Some(-6.2), None, None)).is_err());
        assert!(resolve_proximity(&search_query(None, Some(106.8), None)).is_err());
    }

    #[test]
    fn test_proximity_defaults_radius() {
        let filter = resolve_proximity(&search_query(Some(-6.2), Some(106.8), None))
            .unwrap()
            .unwrap();
        assert_eq!(filter.radius_meters, DEFAULT_SEARCH_RADIUS_KM * 1000.0);
    }

    #[test]
    fn test_proximity_caps_radius() {
        let filter = resolve_proximity(&search_query(Some(-6.2), Some(106.8), Some(9_999.0)))
            .unwrap()
            .unwrap();
        assert_eq!(filter.radius_meters, MAX_SEARCH_RADIUS_KM * 1000.0);
    }

    #[test]
    fn test_proximity_rejects_out_of_range() {
        assert!(resolve_proximity(&search_query(Some(91.0), Some(106.8), None)).is_err());
        assert!(resolve_proximity(&search_query(Some(-6.2), Some(181.0), None)).is_err());
        assert!(resolve_proximity(&search_query(Some(-6.2), Some(106.8), Some(0.0))).is_err());
    }

    #[test]
    fn test_normalize_specialties_trims_and_drops_empties() {
        let cleaned =
            normalize_specialties(vec![" anxiety ".to_string(), "".to_string(), "cbt".to_string()])
                .unwrap();
        assert_eq!(cleaned, vec!["anxiety".to_string(), "cbt".to_string()]);
    }

    #[test]
    fn test_normalize_specialties_rejects_all_blank() {
        assert!(normalize_specialties(vec!["  ".to_string()]).is_err());
    }
}
