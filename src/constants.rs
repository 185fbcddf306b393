use std::f64::consts::PI;

// Semi-major axis a
pub(crate) const WGS84_A: f64 = 6_378_137.;
// Flattening
#[allow(clippy::unreadable_literal)]
pub(crate) const WGS84_F: f64 = 1.0 / 298.257223563;
pub(crate) const WGS84_CODE: &str = "WE";

// UTM central scale factor
pub(crate) const UTM_K0: f64 = 9996.0 / 10_000.;
// UPS central scale factor
pub(crate) const UPS_K0: f64 = 994.0 / 1000.;

/// Roughly 1e-5 degrees (about a metre) in radians.
pub(crate) const EPSILON_RADIANS: f64 = 1.75e-7;

pub(crate) const UTM_FALSE_EASTING: f64 = 500_000.0;
pub(crate) const UTM_SOUTH_FALSE_NORTHING: f64 = 10_000_000.0;
pub(crate) const UTM_MIN_LAT: f64 = (-80.5 * PI) / 180.0;
pub(crate) const UTM_MAX_LAT: f64 = (84.5 * PI) / 180.0;
pub(crate) const UTM_MIN_EASTING: f64 = 100_000.0;
pub(crate) const UTM_MAX_EASTING: f64 = 900_000.0;
pub(crate) const UTM_MIN_NORTHING: f64 = 0.0;
pub(crate) const UTM_MAX_NORTHING: f64 = 10_000_000.0;

pub(crate) const UPS_FALSE_EASTING: f64 = 2_000_000.0;
pub(crate) const UPS_FALSE_NORTHING: f64 = 2_000_000.0;
pub(crate) const UPS_MIN_NORTH_LAT: f64 = 83.5 * (PI / 180.0);
pub(crate) const UPS_MAX_SOUTH_LAT: f64 = -79.5 * (PI / 180.0);
pub(crate) const UPS_MIN_EAST_NORTH: f64 = 0.0;
pub(crate) const UPS_MAX_EAST_NORTH: f64 = 4_000_000.0;

// Accepted inverse flattening for the UTM/UPS/MGRS converters
pub(crate) const MIN_INV_FLATTENING: f64 = 250.0;
pub(crate) const MAX_INV_FLATTENING: f64 = 350.0;
