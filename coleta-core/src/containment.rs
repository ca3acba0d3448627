//! Point-in-zone lookup over the dataset.
//!
//! Every query is a linear scan: the dataset holds a few hundred zones, and
//! each zone carries a cached bounding box that rejects most of them before
//! any ring is walked.
//!
//! Points lying on a ring edge count as contained, including points on the
//! edge of a hole.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, Intersects, LineString, Polygon};
use tracing::debug;

use crate::dataset::{MIN_RING_COORDS, ZoneDataset, ZoneFeature};
use crate::model::{GeographicPoint, ScheduleResult};

/// Every zone whose geometry contains `point`, in dataset order.
///
/// Zones with malformed rings are skipped for this query.
#[must_use]
pub fn find_containing(point: GeographicPoint, dataset: &ZoneDataset) -> Vec<ScheduleResult> {
    let coord = Coord::from(point);

    dataset
        .features()
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| match feature_contains(feature, coord) {
            Some(true) => Some(ScheduleResult::from(feature.attributes())),
            Some(false) => None,
            None => {
                debug!(feature = index, "skipping zone with malformed ring");
                None
            }
        })
        .collect()
}

/// Whether any polygon of the feature contains the point.
///
/// Returns `None` if a polygon examined before a match is degenerate.
#[must_use]
pub fn feature_contains(feature: &ZoneFeature, point: Coord<f64>) -> Option<bool> {
    if let Some(bounds) = feature.bounds()
        && !bounds.intersects(&point)
    {
        return Some(false);
    }

    for polygon in feature.geometry().polygons() {
        if polygon_contains(polygon, point)? {
            return Some(true);
        }
    }
    Some(false)
}

/// Whether a polygon contains the point, honoring holes.
///
/// Returns `None` if the exterior or a hole has fewer than three distinct vertices.
#[must_use]
pub fn polygon_contains(polygon: &Polygon<f64>, point: Coord<f64>) -> Option<bool> {
    if is_degenerate(polygon.exterior()) || polygon.interiors().iter().any(is_degenerate) {
        return None;
    }

    match polygon.coordinate_position(&point) {
        CoordPos::Inside | CoordPos::OnBoundary => Some(true),
        CoordPos::Outside => Some(false),
    }
}

fn is_degenerate(ring: &LineString<f64>) -> bool {
    ring.0.len() < MIN_RING_COORDS
}
