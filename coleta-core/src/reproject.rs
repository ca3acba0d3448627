//! Conversion between UTM grid coordinates and WGS84-compatible geographic coordinates.
//!
//! Zone polygons are published in SIRGAS 2000 / UTM, which uses the GRS80
//! ellipsoid. SIRGAS 2000 and WGS84 agree to well below the precision of the
//! zone boundaries, so no datum shift is applied.

use serde::{Deserialize, Serialize};

use crate::model::{GeographicPoint, ProjectedPoint};

/// GRS80 semi-major axis in metres.
pub const GRS80_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// GRS80 inverse flattening.
pub const GRS80_INVERSE_FLATTENING: f64 = 298.257_222_101;

const UTM_SCALE_FACTOR: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const UTM_MAX_EASTING: f64 = 1_000_000.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Errors raised while converting a single coordinate.
pub enum ProjectionError {
    /// UTM zones are numbered 1 to 60.
    #[error("Invalid UTM zone: {0}")]
    InvalidZone(u8),
    /// Coordinate contained NaN or infinity.
    #[error("Non-finite coordinate ({easting}, {northing})")]
    NonFinite {
        /// Offending easting.
        easting: f64,
        /// Offending northing.
        northing: f64,
    },
    /// Coordinate lies outside the area the projection covers.
    #[error("Coordinate ({easting}, {northing}) outside projection domain")]
    OutOfDomain {
        /// Offending easting.
        easting: f64,
        /// Offending northing.
        northing: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Transverse Mercator definition for one UTM zone on the GRS80 ellipsoid.
pub struct UtmProjection {
    zone: u8,
    south: bool,
}

impl UtmProjection {
    /// Define a projection for a zone and hemisphere.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidZone`] when `zone` is not in `1..=60`.
    pub fn new(zone: u8, south: bool) -> Result<Self, ProjectionError> {
        if (1..=60).contains(&zone) {
            Ok(Self { zone, south })
        } else {
            Err(ProjectionError::InvalidZone(zone))
        }
    }

    /// SIRGAS 2000 / UTM zone 22S, the grid used by the Curitiba zone dataset.
    #[must_use]
    pub const fn sirgas_2000_zone_22s() -> Self {
        Self {
            zone: 22,
            south: true,
        }
    }

    /// UTM zone number.
    #[must_use]
    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// Longitude of the zone's central meridian, in degrees.
    #[must_use]
    pub fn central_meridian(&self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    fn false_northing(&self) -> f64 {
        if self.south {
            UTM_FALSE_NORTHING_SOUTH
        } else {
            0.0
        }
    }

    /// Convert a grid coordinate to latitude/longitude.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] when the coordinate is not finite or falls outside the zone.
    pub fn reproject(&self, point: ProjectedPoint) -> Result<GeographicPoint, ProjectionError> {
        let ProjectedPoint { easting, northing } = point;
        if !easting.is_finite() || !northing.is_finite() {
            return Err(ProjectionError::NonFinite { easting, northing });
        }
        let out_of_domain = ProjectionError::OutOfDomain { easting, northing };
        if easting <= 0.0 || easting >= UTM_MAX_EASTING || !(0.0..=UTM_FALSE_NORTHING_SOUTH).contains(&northing) {
            return Err(out_of_domain);
        }

        let ellipsoid = Ellipsoid::grs80();
        let ecc2 = ellipsoid.eccentricity_squared;
        let second_ecc2 = ellipsoid.second_eccentricity_squared();

        let easting_offset = easting - UTM_FALSE_EASTING;
        let meridian_arc = (northing - self.false_northing()) / UTM_SCALE_FACTOR;

        let mu = meridian_arc
            / (ellipsoid.semi_major_axis
                * (1.0 - ecc2 / 4.0 - 3.0 * ecc2.powi(2) / 64.0 - 5.0 * ecc2.powi(3) / 256.0));
        let root = (1.0 - ecc2).sqrt();
        let ecc1 = (1.0 - root) / (1.0 + root);

        let footprint = mu
            + (3.0 * ecc1 / 2.0 - 27.0 * ecc1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * ecc1.powi(2) / 16.0 - 55.0 * ecc1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * ecc1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * ecc1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_fp = footprint.sin();
        let cos_fp = footprint.cos();
        let tan_fp = footprint.tan();
        let curvature_c = second_ecc2 * cos_fp.powi(2);
        let tan2 = tan_fp.powi(2);
        let denominator = 1.0 - ecc2 * sin_fp.powi(2);
        let prime_vertical = ellipsoid.semi_major_axis / denominator.sqrt();
        let meridional = ellipsoid.semi_major_axis * (1.0 - ecc2) / denominator.powf(1.5);
        let ratio = easting_offset / (prime_vertical * UTM_SCALE_FACTOR);

        let latitude = footprint
            - (prime_vertical * tan_fp / meridional)
                * (ratio.powi(2) / 2.0
                    - (5.0 + 3.0 * tan2 + 10.0 * curvature_c
                        - 4.0 * curvature_c.powi(2)
                        - 9.0 * second_ecc2)
                        * ratio.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * tan2 + 298.0 * curvature_c + 45.0 * tan2.powi(2)
                        - 252.0 * second_ecc2
                        - 3.0 * curvature_c.powi(2))
                        * ratio.powi(6)
                        / 720.0);

        let longitude_offset = (ratio - (1.0 + 2.0 * tan2 + curvature_c) * ratio.powi(3) / 6.0
            + (5.0 - 2.0 * curvature_c + 28.0 * tan2 - 3.0 * curvature_c.powi(2)
                + 8.0 * second_ecc2
                + 24.0 * tan2.powi(2))
                * ratio.powi(5)
                / 120.0)
            / cos_fp;

        GeographicPoint::new(
            latitude.to_degrees(),
            self.central_meridian() + longitude_offset.to_degrees(),
        )
        .ok_or(out_of_domain)
    }

    /// Convert latitude/longitude to a grid coordinate in this zone.
    #[must_use]
    pub fn project(&self, point: GeographicPoint) -> ProjectedPoint {
        let ellipsoid = Ellipsoid::grs80();
        let ecc2 = ellipsoid.eccentricity_squared;
        let second_ecc2 = ellipsoid.second_eccentricity_squared();

        let phi = point.latitude().to_radians();
        let delta_lambda = (point.longitude() - self.central_meridian()).to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let prime_vertical =
            ellipsoid.semi_major_axis / (1.0 - ecc2 * sin_phi.powi(2)).sqrt();
        let tan2 = phi.tan().powi(2);
        let curvature_c = second_ecc2 * cos_phi.powi(2);
        let arc = delta_lambda * cos_phi;

        let easting = UTM_SCALE_FACTOR
            * prime_vertical
            * (arc
                + (1.0 - tan2 + curvature_c) * arc.powi(3) / 6.0
                + (5.0 - 18.0 * tan2 + tan2.powi(2) + 72.0 * curvature_c - 58.0 * second_ecc2)
                    * arc.powi(5)
                    / 120.0);

        let northing = UTM_SCALE_FACTOR
            * (ellipsoid.meridian_arc(phi)
                + prime_vertical
                    * phi.tan()
                    * (arc.powi(2) / 2.0
                        + (5.0 - tan2 + 9.0 * curvature_c + 4.0 * curvature_c.powi(2))
                            * arc.powi(4)
                            / 24.0
                        + (61.0 - 58.0 * tan2 + tan2.powi(2) + 600.0 * curvature_c
                            - 330.0 * second_ecc2)
                            * arc.powi(6)
                            / 720.0));

        ProjectedPoint::new(
            easting + UTM_FALSE_EASTING,
            northing + self.false_northing(),
        )
    }
}

impl Default for UtmProjection {
    fn default() -> Self {
        Self::sirgas_2000_zone_22s()
    }
}

struct Ellipsoid {
    semi_major_axis: f64,
    eccentricity_squared: f64,
}

impl Ellipsoid {
    fn grs80() -> Self {
        let flattening = 1.0 / GRS80_INVERSE_FLATTENING;
        Self {
            semi_major_axis: GRS80_SEMI_MAJOR_AXIS,
            eccentricity_squared: flattening * (2.0 - flattening),
        }
    }

    fn second_eccentricity_squared(&self) -> f64 {
        self.eccentricity_squared / (1.0 - self.eccentricity_squared)
    }

    /// Distance along the central meridian from the equator to `phi`.
    fn meridian_arc(&self, phi: f64) -> f64 {
        let ecc2 = self.eccentricity_squared;
        self.semi_major_axis
            * ((1.0 - ecc2 / 4.0 - 3.0 * ecc2.powi(2) / 64.0 - 5.0 * ecc2.powi(3) / 256.0) * phi
                - (3.0 * ecc2 / 8.0 + 3.0 * ecc2.powi(2) / 32.0 + 45.0 * ecc2.powi(3) / 1024.0)
                    * (2.0 * phi).sin()
                + (15.0 * ecc2.powi(2) / 256.0 + 45.0 * ecc2.powi(3) / 1024.0) * (4.0 * phi).sin()
                - (35.0 * ecc2.powi(3) / 3072.0) * (6.0 * phi).sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON_DEGREES: f64 = 1e-4;

    #[test]
    fn reprojects_curitiba_center() {
        let projection = UtmProjection::sirgas_2000_zone_22s();
        let point = projection
            .reproject(ProjectedPoint::new(673_648.491, 7_186_491.014))
            .unwrap();
        assert!((point.latitude() - -25.4284).abs() < EPSILON_DEGREES);
        assert!((point.longitude() - -49.2733).abs() < EPSILON_DEGREES);
    }

    #[test]
    fn false_origin_maps_to_equator_on_central_meridian() {
        let projection = UtmProjection::sirgas_2000_zone_22s();
        let point = projection
            .reproject(ProjectedPoint::new(500_000.0, 10_000_000.0))
            .unwrap();
        assert!(point.latitude().abs() < 1e-9);
        assert!((point.longitude() - -51.0).abs() < 1e-9);
    }

    #[test]
    fn forward_then_inverse_recovers_point() {
        let projection = UtmProjection::sirgas_2000_zone_22s();
        let original = GeographicPoint::new(-25.46, -49.24).unwrap();
        let projected = projection.project(original);
        assert!((projected.easting - 676_951.816).abs() < 0.01);
        assert!((projected.northing - 7_182_946.957).abs() < 0.01);

        let back = projection.reproject(projected).unwrap();
        assert!((back.latitude() - original.latitude()).abs() < 1e-7);
        assert!((back.longitude() - original.longitude()).abs() < 1e-7);
    }

    #[test]
    fn rejects_bad_coordinates() {
        let projection = UtmProjection::sirgas_2000_zone_22s();
        assert!(matches!(
            projection.reproject(ProjectedPoint::new(f64::NAN, 7_186_491.0)),
            Err(ProjectionError::NonFinite { .. })
        ));
        assert!(matches!(
            projection.reproject(ProjectedPoint::new(-49.27, -25.42)),
            Err(ProjectionError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn validates_zone_numbers() {
        assert_eq!(UtmProjection::new(0, true), Err(ProjectionError::InvalidZone(0)));
        assert_eq!(UtmProjection::new(61, false), Err(ProjectionError::InvalidZone(61)));
        let zone = UtmProjection::new(23, true).unwrap();
        assert!((zone.central_meridian() - -45.0).abs() < 1e-12);
    }
}
