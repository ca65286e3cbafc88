use serde::Deserialize;

use crate::core::config::GeocodingConfig;
use crate::core::error::{AppError, Result};

/// Nominatim API response structure (only the fields we read)
#[derive(Debug, Deserialize)]
pub struct NominatimResponse {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// A successfully geocoded practice address
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Service for geocoding practice addresses using Nominatim
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
    // Nominatim's usage policy requires an identifying User-Agent.
    user_agent: String,
}

impl GeocodingService {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Geocode a free-form address. `Ok(None)` means Nominatim answered
    /// but had no match; callers treat both that and errors as "no
    /// coordinates" since geocoding is best-effort.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(address)
        );

        tracing::debug!("Geocoding address: {} -> {}", address, url);

        let Some(hit) = self.execute_request(&url).await? else {
            return Ok(None);
        };

        let (Ok(latitude), Ok(longitude)) = (hit.lat.parse::<f64>(), hit.lon.parse::<f64>())
        else {
            tracing::warn!("Nominatim returned unparseable coordinates for {}", address);
            return Ok(None);
        };

        tracing::debug!(
            "Geocoded '{}' to ({}, {}) [{}]",
            address,
            latitude,
            longitude,
            hit.display_name
        );

        Ok(Some(Coordinates {
            latitude,
            longitude,
        }))
    }

    /// Execute HTTP request to Nominatim and parse response
    async fn execute_request(&self, url: &str) -> Result<Option<NominatimResponse>> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Nominatim request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Nominatim request failed: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return Ok(None);
        }

        let results: Vec<NominatimResponse> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Nominatim response: {:?}", e);
            AppError::ExternalServiceError(format!("Failed to parse Nominatim response: {}", e))
        })?;

        Ok(results.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_coordinates_parse() {
        let raw = r#"[{"lat":"-6.2087634","lon":"106.845599","display_name":"Jakarta"}]"#;
        let results: Vec<NominatimResponse> = serde_json::from_str(raw).unwrap();
        let hit = &results[0];
        assert_eq!(hit.lat.parse::<f64>().unwrap(), -6.2087634);
        assert_eq!(hit.lon.parse::<f64>().unwrap(), 106.845599);
    }
}
