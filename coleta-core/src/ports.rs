//! Traits describing provider capabilities and shared helper types.

use std::collections::BTreeMap;
use std::io::Error as IoError;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;

use crate::model::GeographicPoint;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to external collaborators.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Reading a local resource failed.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
    /// Provider payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] JsonError),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq)]
/// Structured street search sent to the geocode provider.
pub struct StreetQuery {
    /// Street term, with the house number already prefixed when known.
    pub street: String,
    /// Municipality restricting the search.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country name.
    pub country: String,
    /// Bounding box as `[lon1, lat1, lon2, lat2]`.
    pub viewbox: [f64; 4],
    /// Maximum number of places the provider should return.
    pub limit: usize,
}

impl StreetQuery {
    /// Check if the search term is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.street.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw place as returned by the geocode provider, before filtering.
pub struct ProviderPlace {
    /// Provider-unique identifier.
    pub provider_id: String,
    /// Free-text display name.
    pub display_name: String,
    /// Latitude as a decimal string.
    pub lat: String,
    /// Longitude as a decimal string.
    pub lon: String,
    /// Address breakdown (`road`, `house_number`, `suburb`, `city`, ...).
    pub address: BTreeMap<String, String>,
}

#[async_trait]
/// Trait for address search backends.
pub trait GeocodePort: Send + Sync {
    /// Search for places matching a structured street query.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails or the response is malformed.
    async fn search(&self, query: &StreetQuery) -> Result<Vec<ProviderPlace>, PortError>;

    /// Resolve a point into the closest known place.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails or the response is malformed.
    async fn reverse(&self, point: GeographicPoint) -> Result<Option<ProviderPlace>, PortError>;
}

#[async_trait]
/// Trait for backends supplying the raw zone `GeoJSON` document.
pub trait ZoneSource: Send + Sync {
    /// Human-readable location of the source, used in logs.
    fn describe(&self) -> String;

    /// Fetch the complete document text.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the source cannot be read.
    async fn fetch(&self) -> Result<String, PortError>;
}

/// Zone source reading a `GeoJSON` file from disk.
pub struct FileZoneSource {
    path: PathBuf,
}

impl FileZoneSource {
    /// Create a source for the given file path.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ZoneSource for FileZoneSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, PortError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}
