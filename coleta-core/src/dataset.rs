//! Zone features and the immutable dataset built from a projected `GeoJSON` source.

use std::slice;

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use geojson::{Feature, JsonObject, JsonValue, Value};
use tracing::{debug, info, warn};

use crate::model::{NOT_AVAILABLE, ProjectedPoint, ZoneAttributes};
use crate::ports::PortError;
use crate::reproject::{ProjectionError, UtmProjection};

/// Property key holding the neighborhood name.
pub const NEIGHBORHOOD_KEY: &str = "BAIRRO";
/// Property key holding the collection sector.
pub const SECTOR_KEY: &str = "Setor_2018";
/// Property key holding the collection frequency.
pub const FREQUENCY_KEY: &str = "FREQUENCIA";
/// Property key holding the shift code.
pub const SHIFT_KEY: &str = "TURNO";
/// Property key holding the collection time window.
pub const TIME_WINDOW_KEY: &str = "Horario";
/// Property key holding the operation type.
pub const OPERATION_TYPE_KEY: &str = "OPERAÇÃO";

/// Smallest closed ring: three distinct vertices plus the closing vertex.
pub const MIN_RING_COORDS: usize = 4;

#[derive(thiserror::Error, Debug)]
/// Failures that make the whole dataset unusable.
pub enum DatasetError {
    /// The raw source could not be read.
    #[error("Zone source unavailable: {0}")]
    Source(#[from] PortError),
    /// The document is not valid JSON.
    #[error("Invalid zone document: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document is `GeoJSON` but not a feature collection.
    #[error("Zone source is not a FeatureCollection")]
    NotFeatureCollection,
    /// Every feature in a non-empty source was rejected.
    #[error("None of the {0} zone features could be used")]
    NoUsableFeatures(usize),
}

#[derive(thiserror::Error, Debug)]
/// Reasons a single feature is excluded from the dataset.
pub enum GeometryError {
    /// Feature is not valid `GeoJSON`.
    #[error(transparent)]
    Invalid(#[from] geojson::Error),
    /// Feature has no geometry.
    #[error("feature has no geometry")]
    MissingGeometry,
    /// Geometry is not a polygon or multi-polygon.
    #[error("unsupported geometry type {0}")]
    Unsupported(&'static str),
    /// A position has fewer than two ordinates.
    #[error("position with {0} ordinates")]
    MalformedPosition(usize),
    /// A ring has too few vertices to enclose an area.
    #[error("ring with {0} coordinates")]
    DegenerateRing(usize),
    /// A polygon has no rings at all.
    #[error("polygon without rings")]
    EmptyPolygon,
    /// A vertex could not be reprojected.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

#[derive(Debug, Clone, PartialEq)]
/// Geographic geometry of a zone.
///
/// Within each polygon the exterior ring comes first and holes follow.
pub enum ZoneGeometry {
    /// Single polygon, possibly with holes.
    Polygon(Polygon<f64>),
    /// Several polygons belonging to the same zone.
    MultiPolygon(MultiPolygon<f64>),
}

impl ZoneGeometry {
    /// Constituent polygons in source order.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            ZoneGeometry::Polygon(polygon) => slice::from_ref(polygon),
            ZoneGeometry::MultiPolygon(multi) => &multi.0,
        }
    }

    /// Axis-aligned bounds of all polygons.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            ZoneGeometry::Polygon(polygon) => polygon.bounding_rect(),
            ZoneGeometry::MultiPolygon(multi) => multi.bounding_rect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A collection zone: geographic outline plus schedule attributes.
pub struct ZoneFeature {
    geometry: ZoneGeometry,
    attributes: ZoneAttributes,
    bounds: Option<Rect<f64>>,
}

impl ZoneFeature {
    /// Build a feature from already geographic geometry.
    #[must_use]
    pub fn new(geometry: ZoneGeometry, attributes: ZoneAttributes) -> Self {
        let bounds = geometry.bounds();
        Self {
            geometry,
            attributes,
            bounds,
        }
    }

    /// Geographic geometry.
    #[must_use]
    pub fn geometry(&self) -> &ZoneGeometry {
        &self.geometry
    }

    /// Schedule attributes.
    #[must_use]
    pub fn attributes(&self) -> &ZoneAttributes {
        &self.attributes
    }

    /// Cached bounding box, `None` for empty geometry.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Ordered, read-only set of zones.
pub struct ZoneDataset {
    features: Vec<ZoneFeature>,
    dropped: usize,
}

impl ZoneDataset {
    /// Wrap features that are already in geographic coordinates.
    #[must_use]
    pub fn from_features(features: Vec<ZoneFeature>) -> Self {
        Self {
            features,
            dropped: 0,
        }
    }

    /// Parse a projected `GeoJSON` feature collection and reproject every vertex.
    ///
    /// Features with malformed or unprojectable geometry are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] when the document cannot be parsed, is not a
    /// feature collection, or contains features none of which are usable.
    pub fn from_geojson(text: &str, projection: &UtmProjection) -> Result<Self, DatasetError> {
        let JsonValue::Object(mut document) = serde_json::from_str::<JsonValue>(text)? else {
            return Err(DatasetError::NotFeatureCollection);
        };
        if document.get("type").and_then(JsonValue::as_str) != Some("FeatureCollection") {
            return Err(DatasetError::NotFeatureCollection);
        }
        let Some(JsonValue::Array(raw_features)) = document.remove("features") else {
            return Err(DatasetError::NotFeatureCollection);
        };

        let total = raw_features.len();
        let mut features = Vec::with_capacity(total);
        let mut dropped = 0;

        for (index, raw) in raw_features.into_iter().enumerate() {
            let built = Feature::try_from(raw)
                .map_err(GeometryError::from)
                .and_then(|feature| build_feature(&feature, projection));
            match built {
                Ok(zone) => features.push(zone),
                Err(err) => {
                    dropped += 1;
                    warn!(feature = index, error = %err, "dropping malformed zone feature");
                }
            }
        }

        if total > 0 && features.is_empty() {
            return Err(DatasetError::NoUsableFeatures(total));
        }

        info!(
            zones = features.len(),
            dropped, "zone dataset built in geographic coordinates"
        );

        Ok(Self { features, dropped })
    }

    /// Zones in source order.
    #[must_use]
    pub fn features(&self) -> &[ZoneFeature] {
        &self.features
    }

    /// Number of usable zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the dataset has no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of source features rejected while building.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl ZoneAttributes {
    /// Read the fixed attribute keys, substituting [`NOT_AVAILABLE`] for missing values.
    #[must_use]
    pub fn from_properties(properties: Option<&JsonObject>) -> Self {
        let read = |key: &str| property_text(properties.and_then(|props| props.get(key)));
        Self {
            neighborhood: read(NEIGHBORHOOD_KEY),
            sector: read(SECTOR_KEY),
            frequency: read(FREQUENCY_KEY),
            shift: read(SHIFT_KEY),
            time_window: read(TIME_WINDOW_KEY),
            operation_type: read(OPERATION_TYPE_KEY),
        }
    }
}

fn property_text(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(JsonValue::Number(number)) => number.to_string(),
        Some(JsonValue::Bool(flag)) => flag.to_string(),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

fn build_feature(feature: &Feature, projection: &UtmProjection) -> Result<ZoneFeature, GeometryError> {
    let geometry = feature.geometry.as_ref().ok_or(GeometryError::MissingGeometry)?;

    let zone_geometry = match &geometry.value {
        Value::Polygon(rings) => ZoneGeometry::Polygon(reproject_polygon(rings, projection)?),
        Value::MultiPolygon(polygons) => ZoneGeometry::MultiPolygon(MultiPolygon::new(
            polygons
                .iter()
                .map(|rings| reproject_polygon(rings, projection))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        other => return Err(GeometryError::Unsupported(geometry_kind(other))),
    };

    let attributes = ZoneAttributes::from_properties(feature.properties.as_ref());
    debug!(neighborhood = %attributes.neighborhood, "zone feature reprojected");

    Ok(ZoneFeature::new(zone_geometry, attributes))
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn reproject_polygon(
    rings: &[Vec<Vec<f64>>],
    projection: &UtmProjection,
) -> Result<Polygon<f64>, GeometryError> {
    let mut reprojected = rings
        .iter()
        .map(|ring| reproject_ring(ring, projection))
        .collect::<Result<Vec<_>, _>>()?;

    if reprojected.is_empty() {
        return Err(GeometryError::EmptyPolygon);
    }
    let exterior = reprojected.remove(0);
    Ok(Polygon::new(exterior, reprojected))
}

fn reproject_ring(
    ring: &[Vec<f64>],
    projection: &UtmProjection,
) -> Result<LineString<f64>, GeometryError> {
    let mut vertices = ring
        .iter()
        .map(|position| match position.as_slice() {
            [easting, northing, ..] => Ok(ProjectedPoint::new(*easting, *northing)),
            short => Err(GeometryError::MalformedPosition(short.len())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let (Some(first), Some(last)) = (vertices.first().copied(), vertices.last())
        && first != *last
    {
        vertices.push(first);
    }

    if vertices.len() < MIN_RING_COORDS {
        return Err(GeometryError::DegenerateRing(vertices.len()));
    }

    let coords = vertices
        .into_iter()
        .map(|vertex| {
            projection.reproject(vertex).map(|point| Coord {
                x: point.longitude(),
                y: point.latitude(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn square(min_e: f64, min_n: f64, size: f64) -> serde_json::Value {
        json!([
            [min_e, min_n],
            [min_e + size, min_n],
            [min_e + size, min_n + size],
            [min_e, min_n + size],
            [min_e, min_n]
        ])
    }

    fn collection(features: Vec<serde_json::Value>) -> String {
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    #[test]
    fn reprojects_polygon_features_in_order() {
        let text = collection(vec![
            json!({
                "type": "Feature",
                "properties": { "BAIRRO": "CENTRO", "Setor_2018": 12, "FREQUENCIA": "SEG-QUA-SEX" },
                "geometry": { "type": "Polygon", "coordinates": [square(673_000.0, 7_185_800.0, 1_300.0)] }
            }),
            json!({
                "type": "Feature",
                "properties": { "BAIRRO": "BATEL" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[square(670_000.0, 7_184_000.0, 500.0)], [square(671_000.0, 7_184_000.0, 500.0)]]
                }
            }),
        ]);

        let dataset = ZoneDataset::from_geojson(&text, &UtmProjection::sirgas_2000_zone_22s()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dropped(), 0);

        let first = &dataset.features()[0];
        assert_eq!(first.attributes().neighborhood, "CENTRO");
        assert_eq!(first.attributes().sector, "12");
        assert_eq!(first.attributes().shift, NOT_AVAILABLE);
        let bounds = first.bounds().unwrap();
        assert!(bounds.min().x < -49.2733 && bounds.max().x > -49.2733);
        assert!(bounds.min().y < -25.4284 && bounds.max().y > -25.4284);

        let second = &dataset.features()[1];
        assert_eq!(second.geometry().polygons().len(), 2);
    }

    #[test]
    fn closes_open_rings() {
        let open_ring = json!([
            [673_000.0, 7_185_800.0],
            [674_000.0, 7_185_800.0],
            [674_000.0, 7_186_800.0],
            [673_000.0, 7_186_800.0]
        ]);
        let text = collection(vec![json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Polygon", "coordinates": [open_ring] }
        })]);

        let dataset = ZoneDataset::from_geojson(&text, &UtmProjection::default()).unwrap();
        let polygon = &dataset.features()[0].geometry().polygons()[0];
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
    }

    #[test]
    fn drops_bad_features_but_keeps_the_rest() {
        let text = collection(vec![
            json!({ "type": "Feature", "properties": {}, "geometry": null }),
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": [[[673_000.0, 7_185_800.0], [674_000.0, 7_185_800.0]]] }
            }),
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Polygon", "coordinates": [square(f64::MAX / 2.0, 7_185_800.0, 10.0)] }
            }),
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [673_000.0, 7_185_800.0] }
            }),
            json!({
                "type": "Feature",
                "properties": { "BAIRRO": "CENTRO" },
                "geometry": { "type": "Polygon", "coordinates": [square(673_000.0, 7_185_800.0, 1_300.0)] }
            }),
        ]);

        let dataset = ZoneDataset::from_geojson(&text, &UtmProjection::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.dropped(), 4);
        assert_eq!(dataset.features()[0].attributes().neighborhood, "CENTRO");
    }

    #[test]
    fn unparseable_coordinate_drops_only_its_feature() {
        let text = collection(vec![
            json!({
                "type": "Feature",
                "properties": { "BAIRRO": "BROKEN" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[["x", 1.0], [674_000.0, 7_185_800.0], [674_000.0, 7_186_800.0], ["x", 1.0]]]
                }
            }),
            json!({
                "type": "Feature",
                "properties": { "BAIRRO": "CENTRO" },
                "geometry": { "type": "Polygon", "coordinates": [square(673_000.0, 7_185_800.0, 1_300.0)] }
            }),
        ]);

        let dataset = ZoneDataset::from_geojson(&text, &UtmProjection::default()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.dropped(), 1);
        assert_eq!(dataset.features()[0].attributes().neighborhood, "CENTRO");
    }

    #[test]
    fn rejects_unusable_documents() {
        let projection = UtmProjection::default();
        assert!(matches!(
            ZoneDataset::from_geojson("not json", &projection),
            Err(DatasetError::Parse(_))
        ));
        let point = json!({ "type": "Point", "coordinates": [0.0, 0.0] }).to_string();
        assert!(matches!(
            ZoneDataset::from_geojson(&point, &projection),
            Err(DatasetError::NotFeatureCollection)
        ));
        let only_bad = collection(vec![json!({ "type": "Feature", "properties": {}, "geometry": null })]);
        assert!(matches!(
            ZoneDataset::from_geojson(&only_bad, &projection),
            Err(DatasetError::NoUsableFeatures(1))
        ));
    }

    #[test]
    fn blank_and_null_properties_become_placeholder() {
        let properties = json!({
            "BAIRRO": "  ",
            "TURNO": null,
            "OPERAÇÃO": "LIXO QUE NÃO É LIXO"
        });
        let attributes = ZoneAttributes::from_properties(properties.as_object());
        assert_eq!(attributes.neighborhood, NOT_AVAILABLE);
        assert_eq!(attributes.shift, NOT_AVAILABLE);
        assert_eq!(attributes.operation_type, "LIXO QUE NÃO É LIXO");
        assert_eq!(ZoneAttributes::from_properties(None), ZoneAttributes::default());
    }
}
