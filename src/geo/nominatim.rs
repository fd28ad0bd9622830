use super::{GeoPoint, Geocoder};
use crate::error::GeoError;
use crate::models::lenient::number_from;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Geocoder backed by a Nominatim instance
pub struct NominatimGeocoder {
    client: Client,
    base: String,
}

// Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: Value,
    lon: Value,
    #[serde(default)]
    display_name: String,
}

impl Place {
    fn point(self) -> Option<GeoPoint> {
        Some(GeoPoint {
            latitude: number_from(&self.lat)?,
            longitude: number_from(&self.lon)?,
            display_address: self.display_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Reverse {
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, GeoError> {
        // Nominatim's usage policy requires an identifying user agent.
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("inmo-market/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Response, GeoError> {
        let url = format!("{}/{}", self.base, path);
        debug!("Geocoding {} {:?}", path, params);
        let response = self.client.get(&url).query(params).send().await?;
        if !response.status().is_success() {
            warn!("Geocoder returned {}", response.status());
            return Err(GeoError::Status(response.status().as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn forward(&self, query: &str) -> Result<Vec<GeoPoint>, GeoError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("limit", "5".to_string()),
        ];
        let places: Vec<Place> = self.get("search", &params).await?.json().await?;
        Ok(places.into_iter().filter_map(Place::point).collect())
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeoError> {
        let params = [
            ("format", "json".to_string()),
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
        ];
        let place: Reverse = self.get("reverse", &params).await?.json().await?;
        Ok(place.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn places_with_string_coordinates_become_points() {
        let places: Vec<Place> = serde_json::from_value(json!([
            { "lat": "-12.1211", "lon": "-77.0297", "display_name": "Miraflores, Lima" },
            { "lat": "n/a", "lon": "-77.0", "display_name": "broken" }
        ]))
        .unwrap();
        let points: Vec<GeoPoint> = places.into_iter().filter_map(Place::point).collect();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].display_address, "Miraflores, Lima");
        assert!((points[0].latitude + 12.1211).abs() < 1e-9);
    }
}
