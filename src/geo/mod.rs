pub mod nominatim;

pub use nominatim::NominatimGeocoder;

use crate::error::GeoError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A geocoding hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub display_address: String,
}

/// Address lookup for the location picker. The search pipeline never uses it.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Free text to candidate points, best match first
    async fn forward(&self, query: &str) -> Result<Vec<GeoPoint>, GeoError>;

    /// Coordinates to a display address
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeoError>;
}
