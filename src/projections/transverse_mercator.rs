use std::f64::consts::PI;

use log::debug;

use crate::{
    coords::{latlon::LatLon, map::MapCoord},
    ellipsoid::{Ellipsoid, SeriesCoefficients},
    utility::{atanh, hyperbolic_series, rad_to_deg, trig_series, GeoMath},
    Error,
};

// Series terms actually summed; the coefficient arrays hold eight.
const N_TERMS: usize = 6;

const MIN_INV_FLATTENING: f64 = 150.0;
const MIN_SCALE_FACTOR: f64 = 0.1;
const MAX_SCALE_FACTOR: f64 = 10.0;

// Beyond this angular distance from the central meridian the series stops
// converging usefully.
const MAX_DELTA_LONG: f64 = (PI * 70.0) / 180.0;

// Envelope around the false origin accepted by the inverse
const DELTA_EASTING: f64 = 20_000_000.0;
const DELTA_NORTHING: f64 = 10_000_000.0;

// Conformal to geodetic latitude inversion
const LAT_MAX_ITERATIONS: usize = 30;
const LAT_TOLERANCE: f64 = 1.0e-12;

/// Transverse Mercator projection about one central meridian.
#[derive(Clone, Debug)]
pub struct TransverseMercator {
    es: f64,
    k0r4: f64,
    k0r4_inv: f64,
    coeffs: SeriesCoefficients,
    origin_lat: f64,
    origin_lon: f64,
    false_easting: f64,
    false_northing: f64,
    scale_factor: f64,
    // Projected position of the origin, removed from every result
    origin_easting: f64,
    origin_northing: f64,
}

impl TransverseMercator {
    /// Builds a projection. Angles are in radians.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEllipsoid`] for a non-positive semi-major axis,
    /// an inverse flattening below 150 or an empty ellipsoid code, and
    /// [`Error::InvalidParameter`] when the origin latitude, central meridian
    /// or scale factor is out of range.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Ellipsoid, LatLon, TransverseMercator};
    ///
    /// let tm = TransverseMercator::new(&Ellipsoid::wgs84(), 3_f64.to_radians(), 0.0, 500_000.0, 0.0, 0.9996).unwrap();
    /// let xy = tm.convert_from_geodetic(&LatLon::from_degrees(0.0, 3.0)).unwrap();
    /// assert!((xy.easting() - 500_000.0).abs() < 1e-6);
    /// assert!(xy.northing().abs() < 1e-6);
    /// ```
    pub fn new(
        ellipsoid: &Ellipsoid,
        central_meridian: f64,
        origin_latitude: f64,
        false_easting: f64,
        false_northing: f64,
        scale_factor: f64,
    ) -> Result<TransverseMercator, Error> {
        if ellipsoid.code().is_empty() {
            return Err(Error::InvalidEllipsoid("missing ellipsoid code".to_string()));
        }
        ellipsoid.validate(MIN_INV_FLATTENING, f64::INFINITY)?;

        if !(-PI / 2.0..=PI / 2.0).contains(&origin_latitude) {
            return Err(Error::InvalidParameter(format!(
                "origin latitude {origin_latitude} not in [-PI/2, PI/2]"
            )));
        }
        if !(-PI..=2.0 * PI).contains(&central_meridian) {
            return Err(Error::InvalidParameter(format!(
                "central meridian {central_meridian} not in [-PI, 2PI]"
            )));
        }
        if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&scale_factor) {
            return Err(Error::InvalidParameter(format!(
                "scale factor {scale_factor} not in [{MIN_SCALE_FACTOR}, {MAX_SCALE_FACTOR}]"
            )));
        }

        if !ellipsoid.in_tested_range() {
            debug!(
                "transverse mercator built for inverse flattening {} outside the tested range",
                ellipsoid.inverse_flattening()
            );
        }

        let origin_lon = if central_meridian > PI { central_meridian - 2.0 * PI } else { central_meridian };
        let coeffs = SeriesCoefficients::generate(ellipsoid.inverse_flattening(), ellipsoid.code());
        let k0r4 = coeffs.r4oa * scale_factor * ellipsoid.semi_major_axis();

        let mut tm = Self {
            es: ellipsoid.eccentricity(),
            k0r4,
            k0r4_inv: 1.0 / k0r4,
            coeffs,
            origin_lat: origin_latitude,
            origin_lon,
            false_easting,
            false_northing,
            scale_factor,
            origin_easting: 0.0,
            origin_northing: 0.0,
        };

        let origin = tm.project(origin_latitude, origin_lon)?;
        tm.origin_easting = origin.easting;
        tm.origin_northing = origin.northing;

        Ok(tm)
    }

    #[inline]
    pub fn central_meridian(&self) -> f64 {
        self.origin_lon
    }

    #[inline]
    pub fn origin_latitude(&self) -> f64 {
        self.origin_lat
    }

    #[inline]
    pub fn false_easting(&self) -> f64 {
        self.false_easting
    }

    #[inline]
    pub fn false_northing(&self) -> f64 {
        self.false_northing
    }

    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Projects a geodetic point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLongitude`] when the point is more than 70°
    /// from the central meridian (and not near a pole).
    pub fn convert_from_geodetic(&self, coord: &LatLon) -> Result<MapCoord, Error> {
        let longitude = coord.longitude.wrap_pi();

        let projected = self.project(coord.latitude, longitude)?;

        Ok(MapCoord::new(
            projected.easting + self.false_easting - self.origin_easting,
            projected.northing + self.false_northing - self.origin_northing,
        ))
    }

    /// Recovers the geodetic point of a projected coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEasting`]/[`Error::InvalidNorthing`] when the
    /// coordinate is outside the envelope the inverse series supports.
    pub fn convert_to_geodetic(&self, coord: &MapCoord) -> Result<LatLon, Error> {
        let easting = coord.easting;
        let northing = coord.northing;

        if easting < self.false_easting - DELTA_EASTING || easting > self.false_easting + DELTA_EASTING {
            return Err(Error::InvalidEasting(format!(
                "{easting} m is more than {DELTA_EASTING} m from the false easting"
            )));
        }
        if northing < self.false_northing - DELTA_NORTHING || northing > self.false_northing + DELTA_NORTHING {
            return Err(Error::InvalidNorthing(format!(
                "{northing} m is more than {DELTA_NORTHING} m from the false northing"
            )));
        }

        let easting = easting - (self.false_easting - self.origin_easting);
        let northing = northing - (self.false_northing - self.origin_northing);

        let (latitude, longitude) = self.unproject(northing, easting);

        let mut longitude = longitude;
        if longitude > PI {
            longitude -= 2.0 * PI;
        }
        if longitude <= -PI {
            longitude += 2.0 * PI;
        }

        if latitude.abs() > PI / 2.0 {
            return Err(Error::InvalidNorthing(format!(
                "{} m resolves to latitude {}",
                coord.northing,
                rad_to_deg(latitude)
            )));
        }
        if longitude.abs() > PI {
            return Err(Error::InvalidEasting(format!(
                "{} m resolves to longitude {}",
                coord.easting,
                rad_to_deg(longitude)
            )));
        }

        Ok(LatLon::new(latitude, longitude))
    }

    /// Rejects points too far from the central meridian, measured as the
    /// smallest of the distances to the meridian, its antimeridian and the
    /// poles.
    fn check_lat_lon(latitude: f64, delta_lon: f64) -> Result<(), Error> {
        let delta_lon = delta_lon.wrap_pi();

        let test_angle = [
            delta_lon.abs(),
            (delta_lon - PI).abs(),
            (delta_lon + PI).abs(),
            PI / 2.0 - latitude,
            PI / 2.0 + latitude,
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min);

        if test_angle > MAX_DELTA_LONG {
            return Err(Error::InvalidLongitude(format!(
                "{} degrees from the central meridian exceeds 70",
                rad_to_deg(delta_lon)
            )));
        }
        Ok(())
    }

    /// Ellipsoid to plane without offsets or false origin.
    fn project(&self, latitude: f64, longitude: f64) -> Result<MapCoord, Error> {
        let lambda = (longitude - self.origin_lon).wrap_pi();
        Self::check_lat_lon(latitude, lambda)?;

        let (sin_lam, cos_lam) = lambda.sin_cos();
        let (sin_phi, cos_phi) = latitude.sin_cos();

        // Geodetic to conformal latitude, only its sine and cosine are needed
        let p = (self.es * atanh(self.es * sin_phi)).exp();
        let part1 = (1.0 + sin_phi) / p;
        let part2 = (1.0 - sin_phi) * p;
        let denom = part1 + part2;
        let cos_chi = 2.0 * cos_phi / denom;
        let sin_chi = (part1 - part2) / denom;

        // Spherical transverse mercator
        let u = atanh(cos_chi * sin_lam);
        let v = sin_chi.atan2(cos_chi * cos_lam);

        let (c2ku, s2ku) = hyperbolic_series(2.0 * u);
        let (c2kv, s2kv) = trig_series(2.0 * v);

        let mut x_star = 0.0;
        let mut y_star = 0.0;
        for k in (0..N_TERMS).rev() {
            x_star += self.coeffs.alpha[k] * s2ku[k] * c2kv[k];
            y_star += self.coeffs.alpha[k] * c2ku[k] * s2kv[k];
        }
        x_star += u;
        y_star += v;

        Ok(MapCoord::new(self.k0r4 * x_star, self.k0r4 * y_star))
    }

    /// Plane to ellipsoid, the inverse of [`Self::project`].
    fn unproject(&self, northing: f64, easting: f64) -> (f64, f64) {
        let x_star = self.k0r4_inv * easting;
        let y_star = self.k0r4_inv * northing;

        let (c2kx, s2kx) = hyperbolic_series(2.0 * x_star);
        let (c2ky, s2ky) = trig_series(2.0 * y_star);

        let mut u = 0.0;
        let mut v = 0.0;
        for k in (0..N_TERMS).rev() {
            u += self.coeffs.beta[k] * s2kx[k] * c2ky[k];
            v += self.coeffs.beta[k] * c2kx[k] * s2ky[k];
        }
        u += x_star;
        v += y_star;

        let cosh_u = u.cosh();
        let sinh_u = u.sinh();
        let (sin_v, cos_v) = v.sin_cos();

        let lambda = sinh_u.atan2(cos_v);
        let sin_chi = sin_v / cosh_u;

        (geodetic_lat(sin_chi, self.es), self.origin_lon + lambda)
    }
}

/// Inverts the conformal latitude relation by fixed-point iteration on its
/// sine.
fn geodetic_lat(sin_chi: f64, e: f64) -> f64 {
    let one_plus = 1.0 + sin_chi;
    let one_minus = 1.0 - sin_chi;

    let mut s_old = 1.0e99;
    let mut s = sin_chi;
    for _ in 0..LAT_MAX_ITERATIONS {
        let p = (e * atanh(e * s)).exp();
        let p_sq = p * p;
        s = (one_plus * p_sq - one_minus) / (one_plus * p_sq + one_minus);

        if (s - s_old).abs() < LAT_TOLERANCE {
            break;
        }
        s_old = s;
    }
    s.asin()
}
