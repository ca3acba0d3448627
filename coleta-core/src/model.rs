//! Domain data structures for points, zone attributes, and lookup results.

use std::collections::BTreeMap;
use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Placeholder used for any zone attribute the dataset does not provide.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// WGS84 position in decimal degrees.
///
/// Latitude is always within `[-90, 90]` and longitude within `[-180, 180]`.
pub struct GeographicPoint {
    latitude: f64,
    longitude: f64,
}

impl GeographicPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a `"lat, lon"` pair as typed by a user or reported by a device.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let (lat_text, lon_text) = input.split_once(',')?;
        let latitude = lat_text.trim().parse::<f64>().ok()?;
        let longitude = lon_text.trim().parse::<f64>().ok()?;
        Self::new(latitude, longitude)
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Five-decimal label used when no street address is known.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

impl fmt::Display for GeographicPoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {})", self.latitude, self.longitude)
    }
}

impl From<GeographicPoint> for Coord<f64> {
    fn from(point: GeographicPoint) -> Self {
        Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Position in the zone dataset's native projected system, in metres.
pub struct ProjectedPoint {
    /// Distance east of the projection origin.
    pub easting: f64,
    /// Distance north of the projection origin.
    pub northing: f64,
}

impl ProjectedPoint {
    /// Construct a projected point.
    #[must_use]
    pub fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Schedule attributes attached to a collection zone.
///
/// Every field is populated; absent source values hold [`NOT_AVAILABLE`].
pub struct ZoneAttributes {
    /// Neighborhood (bairro) name.
    pub neighborhood: String,
    /// Collection sector code.
    pub sector: String,
    /// Collection frequency, e.g. "3x/week".
    pub frequency: String,
    /// Shift code such as `DIURNO` or `NOTURNO`.
    pub shift: String,
    /// Time window of the collection.
    pub time_window: String,
    /// Operation type separating selective from household collection.
    pub operation_type: String,
}

impl Default for ZoneAttributes {
    fn default() -> Self {
        Self {
            neighborhood: NOT_AVAILABLE.to_owned(),
            sector: NOT_AVAILABLE.to_owned(),
            frequency: NOT_AVAILABLE.to_owned(),
            shift: NOT_AVAILABLE.to_owned(),
            time_window: NOT_AVAILABLE.to_owned(),
            operation_type: NOT_AVAILABLE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Schedule of one zone containing the queried point.
pub struct ScheduleResult {
    /// Neighborhood (bairro) name.
    pub neighborhood: String,
    /// Collection sector code.
    pub sector: String,
    /// Collection frequency.
    pub frequency: String,
    /// Raw shift code.
    pub shift: String,
    /// Time window of the collection.
    pub time_window: String,
    /// Operation type of the zone.
    pub operation_type: String,
}

impl From<&ZoneAttributes> for ScheduleResult {
    fn from(attributes: &ZoneAttributes) -> Self {
        Self {
            neighborhood: attributes.neighborhood.clone(),
            sector: attributes.sector.clone(),
            frequency: attributes.frequency.clone(),
            shift: attributes.shift.clone(),
            time_window: attributes.time_window.clone(),
            operation_type: attributes.operation_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Address suggestion returned from the geocode matcher.
pub struct AddressCandidate {
    /// Provider identifier used for deduplication.
    pub provider_id: String,
    /// Formatted `street, number - neighborhood - city` label.
    pub display_label: String,
    /// Location of the address.
    pub point: GeographicPoint,
    /// Structured address breakdown as reported by the provider.
    pub raw_address_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Response handed to callers after a point lookup.
///
/// An empty `results` list with `result_count == 0` means no zone covers the point.
pub struct LookupResponse {
    /// Number of matched zones.
    pub result_count: usize,
    /// One entry per matched zone, in dataset order.
    pub results: Vec<ScheduleResult>,
    /// Address label shown to the user.
    pub resolved_address: String,
    /// Point that was looked up.
    pub point: GeographicPoint,
}

impl LookupResponse {
    /// Wrap containment results for a point.
    #[must_use]
    pub fn new(point: GeographicPoint, resolved_address: String, results: Vec<ScheduleResult>) -> Self {
        Self {
            result_count: results.len(),
            results,
            resolved_address,
            point,
        }
    }

    /// Whether no zone contains the point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_points() {
        assert!(GeographicPoint::new(-91.0, 0.0).is_none());
        assert!(GeographicPoint::new(0.0, 180.5).is_none());
        assert!(GeographicPoint::new(f64::NAN, 0.0).is_none());
        assert!(GeographicPoint::new(-25.4284, -49.2733).is_some());
    }

    #[test]
    fn parses_coordinate_pairs() {
        let point = GeographicPoint::parse(" -25.4284 , -49.2733 ").unwrap();
        assert!((point.latitude() - -25.4284).abs() < 1e-9);
        assert!((point.longitude() - -49.2733).abs() < 1e-9);
        assert!(GeographicPoint::parse("Rua XV de Novembro, 100").is_none());
        assert!(GeographicPoint::parse("-25.4").is_none());
    }

    #[test]
    fn labels_with_five_decimals() {
        let point = GeographicPoint::new(-25.428_412_3, -49.273_3).unwrap();
        assert_eq!(point.label(), "-25.42841, -49.27330");
    }

    #[test]
    fn default_attributes_use_placeholder() {
        let attributes = ZoneAttributes::default();
        assert_eq!(attributes.neighborhood, NOT_AVAILABLE);
        assert_eq!(attributes.operation_type, NOT_AVAILABLE);
    }

    #[test]
    fn response_counts_results() {
        let point = GeographicPoint::new(0.0, 0.0).unwrap();
        let empty = LookupResponse::new(point, "somewhere".to_owned(), Vec::new());
        assert_eq!(empty.result_count, 0);
        assert!(empty.is_empty());
    }
}
