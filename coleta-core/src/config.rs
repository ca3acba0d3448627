//! Runtime configuration.
//!
//! Every field has a default matching the Curitiba deployment, so an empty
//! or partial TOML file is valid.

use std::fs;
use std::io::Error as IoError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::reproject::{ProjectionError, UtmProjection};

/// Operation-type token marking selective (recyclable) collection.
pub const SELECTIVE_COLLECTION_MARKER: &str = "LIXO QUE NÃO É LIXO";

#[derive(thiserror::Error, Debug)]
/// Errors raised while loading configuration.
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying error.
        source: IoError,
    },
    /// The file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
/// Top-level configuration.
pub struct CollectionConfig {
    /// Address search settings.
    pub geocoder: GeocoderConfig,
    /// Zone dataset location and grid.
    pub dataset: DatasetConfig,
    /// Schedule classification.
    pub schedule: ScheduleConfig,
    /// Interactive search behaviour.
    pub search: SearchConfig,
}

impl CollectionConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid for this schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read or parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Geocode provider and filtering settings.
pub struct GeocoderConfig {
    /// Provider base URL.
    pub base_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Municipality suggestions must belong to.
    pub municipality: String,
    /// State passed to the provider.
    pub state: String,
    /// Country passed to the provider.
    pub country: String,
    /// Search bounding box as `[lon1, lat1, lon2, lat2]`.
    pub viewbox: [f64; 4],
    /// Places requested per provider query.
    pub provider_limit: usize,
    /// Suggestions shown to the user; also stops further candidate queries.
    pub max_suggestions: usize,
    /// Queries shorter than this are not sent.
    pub min_query_chars: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_owned(),
            user_agent: "coleta/0.1".to_owned(),
            municipality: "Curitiba".to_owned(),
            state: "Paraná".to_owned(),
            country: "Brasil".to_owned(),
            viewbox: [-49.45, -25.25, -49.10, -25.65],
            provider_limit: 10,
            max_suggestions: 5,
            min_query_chars: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Zone dataset settings.
pub struct DatasetConfig {
    /// File path or `http(s)://` URL of the projected `GeoJSON`.
    pub source: String,
    /// UTM zone of the source coordinates.
    pub utm_zone: u8,
    /// Whether the source uses the southern-hemisphere false northing.
    pub southern_hemisphere: bool,
}

impl DatasetConfig {
    /// Whether the source should be fetched over HTTP.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    /// Projection of the source coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidZone`] for zones outside `1..=60`.
    pub fn projection(&self) -> Result<UtmProjection, ProjectionError> {
        UtmProjection::new(self.utm_zone, self.southern_hemisphere)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: "data/coleta_seletiva.geojson".to_owned(),
            utm_zone: 22,
            southern_hemisphere: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Schedule classification settings.
pub struct ScheduleConfig {
    /// Substring of the operation type identifying selective collection.
    pub selective_marker: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            selective_marker: SELECTIVE_COLLECTION_MARKER.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Interactive search settings.
pub struct SearchConfig {
    /// Quiet period after the last keystroke before searching.
    pub debounce_ms: u64,
}

impl SearchConfig {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 400 }
    }
}
