use std::f64::consts::PI;

use log::debug;

use crate::{
    constants::{MAX_INV_FLATTENING, MIN_INV_FLATTENING},
    coords::{
        latlon::LatLon,
        map::{Hemisphere, MapCoord},
    },
    ellipsoid::Ellipsoid,
    utility::{rad_to_deg, GeoMath},
    Error, ThisOrThat,
};

const MIN_SCALE_FACTOR: f64 = 0.1;
const MAX_SCALE_FACTOR: f64 = 3.0;

// Standard parallel from scale factor
const SCALE_MAX_ITERATIONS: usize = 30;
const SCALE_TOLERANCE: f64 = 1.0e-15;

// Latitude recovery in the inverse
const LAT_MAX_ITERATIONS: usize = 30;
const LAT_TOLERANCE: f64 = 1.0e-10;

// Closer than this to a pole counts as the pole itself
const POLE_TOLERANCE: f64 = 1.0e-10;

// Growth applied to the origin radius to get the inverse search envelope
const DELTA_MARGIN: f64 = 1.01;

/// Polar stereographic projection for one polar aspect.
///
/// Southern aspects are handled by mirroring: the stored standard parallel
/// is always positive and the stored central meridian is negated.
#[derive(Clone, Debug)]
pub struct PolarStereographic {
    es: f64,
    es_over_two: f64,
    southern: bool,
    // Exactly polar standard parallel: mc/tc are not used
    polar_exact: bool,
    tc: f64,
    k90: f64,
    a_mc: f64,
    two_a: f64,
    standard_parallel: f64,
    central_meridian: f64,
    false_easting: f64,
    false_northing: f64,
    scale_factor: f64,
    // Maximum variance for easting and northing around the false origin
    delta_easting: f64,
    delta_northing: f64,
}

fn k90(es: f64) -> f64 {
    let one_plus_es = 1.0 + es;
    let one_minus_es = 1.0 - es;
    (one_plus_es.powf(one_plus_es) * one_minus_es.powf(one_minus_es)).sqrt()
}

fn check_central_meridian(central_meridian: f64) -> Result<(), Error> {
    if (-PI..=2.0 * PI).contains(&central_meridian) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "central meridian {central_meridian} not in [-PI, 2PI]"
        )))
    }
}

impl PolarStereographic {
    /// Builds the projection from a standard parallel, whose sign picks the
    /// aspect. Angles are in radians.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEllipsoid`] for a bad ellipsoid and
    /// [`Error::InvalidParameter`] when the standard parallel or central
    /// meridian is out of range.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Ellipsoid, LatLon, PolarStereographic};
    ///
    /// let ps = PolarStereographic::with_standard_parallel(
    ///     &Ellipsoid::wgs84(), 0.0, 90_f64.to_radians(), 0.0, 0.0,
    /// ).unwrap();
    /// assert!((ps.scale_factor() - 1.0).abs() < 1e-12);
    ///
    /// let pole = ps.convert_from_geodetic(&LatLon::from_degrees(90.0, 0.0)).unwrap();
    /// assert_eq!((pole.easting(), pole.northing()), (0.0, 0.0));
    /// ```
    pub fn with_standard_parallel(
        ellipsoid: &Ellipsoid,
        central_meridian: f64,
        standard_parallel: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<PolarStereographic, Error> {
        ellipsoid.validate(MIN_INV_FLATTENING, MAX_INV_FLATTENING)?;
        if !(-PI / 2.0..=PI / 2.0).contains(&standard_parallel) {
            return Err(Error::InvalidParameter(format!(
                "standard parallel {standard_parallel} not in [-PI/2, PI/2]"
            )));
        }
        check_central_meridian(central_meridian)?;

        // Scale factor at the pole implied by the standard parallel
        let es = ellipsoid.eccentricity();
        let one_plus_es = 1.0 + es;
        let one_minus_es = 1.0 - es;
        let slat = standard_parallel.abs().sin();
        let one_plus_es_sin = 1.0 + es * slat;
        let one_minus_es_sin = 1.0 - es * slat;
        let scale_factor = ((1.0 + slat) / 2.0)
            * (k90(es)
                / (one_plus_es_sin.powf(one_plus_es) * one_minus_es_sin.powf(one_minus_es)).sqrt());

        Self::assemble(
            ellipsoid,
            central_meridian,
            standard_parallel,
            false_easting,
            false_northing,
            scale_factor,
        )
    }

    /// Builds the projection from the scale factor at the pole, solving for
    /// the standard parallel it implies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEllipsoid`] for a bad ellipsoid,
    /// [`Error::InvalidParameter`] when the scale factor or central meridian
    /// is out of range and [`Error::NoConvergence`] when the standard parallel
    /// cannot be solved for.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Ellipsoid, Hemisphere, PolarStereographic};
    ///
    /// let ups_north = PolarStereographic::with_scale_factor(
    ///     &Ellipsoid::wgs84(), 0.0, 0.994, Hemisphere::North, 2_000_000.0, 2_000_000.0,
    /// ).unwrap();
    /// assert!((ups_north.standard_parallel().to_degrees() - 81.114528).abs() < 1e-5);
    /// ```
    pub fn with_scale_factor(
        ellipsoid: &Ellipsoid,
        central_meridian: f64,
        scale_factor: f64,
        hemisphere: Hemisphere,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<PolarStereographic, Error> {
        ellipsoid.validate(MIN_INV_FLATTENING, MAX_INV_FLATTENING)?;
        if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&scale_factor) {
            return Err(Error::InvalidParameter(format!(
                "scale factor {scale_factor} not in [{MIN_SCALE_FACTOR}, {MAX_SCALE_FACTOR}]"
            )));
        }
        check_central_meridian(central_meridian)?;

        let es = ellipsoid.eccentricity();
        let one_plus_es = 1.0 + es;
        let one_minus_es = 1.0 - es;
        let k90 = k90(es);

        // Fixed-point solve for the sine of the standard parallel
        let mut count = SCALE_MAX_ITERATIONS;
        let mut sk = 0.0;
        let mut sk_plus_1 = -1.0 + 2.0 * scale_factor;
        while (sk_plus_1 - sk).abs() > SCALE_TOLERANCE && count != 0 {
            sk = sk_plus_1;
            let one_plus_es_sk = 1.0 + es * sk;
            let one_minus_es_sk = 1.0 - es * sk;
            sk_plus_1 = ((2.0 * scale_factor
                * (one_plus_es_sk.powf(one_plus_es) * one_minus_es_sk.powf(one_minus_es)).sqrt())
                / k90)
                - 1.0;
            count -= 1;
        }

        if count == 0 {
            return Err(Error::NoConvergence(format!(
                "standard parallel for scale factor {scale_factor} after {SCALE_MAX_ITERATIONS} iterations"
            )));
        }
        if !(-1.0..=1.0).contains(&sk_plus_1) {
            return Err(Error::NoConvergence(format!(
                "scale factor {scale_factor} gives sine of standard parallel {sk_plus_1}"
            )));
        }

        let standard_parallel = sk_plus_1.asin() * hemisphere.is_north().ternary(1.0, -1.0);

        Self::assemble(
            ellipsoid,
            central_meridian,
            standard_parallel,
            false_easting,
            false_northing,
            scale_factor,
        )
    }

    fn assemble(
        ellipsoid: &Ellipsoid,
        central_meridian: f64,
        standard_parallel: f64,
        false_easting: f64,
        false_northing: f64,
        scale_factor: f64,
    ) -> Result<PolarStereographic, Error> {
        let central_meridian = (central_meridian > PI).ternary(central_meridian - 2.0 * PI, central_meridian);
        let southern = standard_parallel < 0.0;

        let a = ellipsoid.semi_major_axis();
        let es = ellipsoid.eccentricity();
        let stored_parallel = standard_parallel.abs();

        let mut ps = Self {
            es,
            es_over_two: es / 2.0,
            southern,
            polar_exact: true,
            tc: 1.0,
            k90: k90(es),
            a_mc: a,
            two_a: 2.0 * a,
            standard_parallel: stored_parallel,
            central_meridian: southern.ternary(-central_meridian, central_meridian),
            false_easting,
            false_northing,
            scale_factor,
            delta_easting: 0.0,
            delta_northing: 0.0,
        };

        if (stored_parallel - PI / 2.0).abs() > POLE_TOLERANCE {
            let (sinolat, cosolat) = stored_parallel.sin_cos();
            let essin = es * sinolat;
            let pow_es = ps.polar_pow(essin);
            let mc = cosolat / (1.0 - essin * essin).sqrt();
            ps.polar_exact = false;
            ps.a_mc = a * mc;
            ps.tc = (PI / 4.0 - stored_parallel / 2.0).tan() / pow_es;
        }

        // Radius of the equator on the central meridian bounds every point
        // the inverse will accept.
        let edge = ps.convert_from_geodetic(&LatLon::new(0.0, central_meridian))?;
        let mut delta = edge.northing;
        if !false_northing.is_zero() {
            delta -= false_northing;
        }
        delta = delta.abs() * DELTA_MARGIN;
        ps.delta_easting = delta;
        ps.delta_northing = delta;

        debug!(
            "polar stereographic {} aspect, standard parallel {}, scale factor {}",
            ps.hemisphere(),
            rad_to_deg(standard_parallel),
            scale_factor
        );

        Ok(ps)
    }

    /// Signed standard parallel in radians.
    pub fn standard_parallel(&self) -> f64 {
        self.southern.ternary(-self.standard_parallel, self.standard_parallel)
    }

    /// Central meridian in radians.
    pub fn central_meridian(&self) -> f64 {
        self.southern.ternary(-self.central_meridian, self.central_meridian)
    }

    /// Scale factor at the pole.
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    #[inline]
    pub fn hemisphere(&self) -> Hemisphere {
        self.southern.ternary(Hemisphere::South, Hemisphere::North)
    }

    #[inline]
    pub fn false_easting(&self) -> f64 {
        self.false_easting
    }

    #[inline]
    pub fn false_northing(&self) -> f64 {
        self.false_northing
    }

    fn polar_pow(&self, es_sin: f64) -> f64 {
        ((1.0 - es_sin) / (1.0 + es_sin)).powf(self.es_over_two)
    }

    /// Projects a geodetic point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLatitude`]/[`Error::InvalidLongitude`] for
    /// out of range input and [`Error::OutsideProjection`] for a latitude in
    /// the other hemisphere.
    pub fn convert_from_geodetic(&self, coord: &LatLon) -> Result<MapCoord, Error> {
        let mut latitude = coord.latitude;
        let mut longitude = coord.longitude;

        if !(-PI / 2.0..=PI / 2.0).contains(&latitude) {
            return Err(Error::InvalidLatitude(format!(
                "{} outside of valid range [-90, 90]",
                rad_to_deg(latitude)
            )));
        }
        if (latitude < 0.0 && !self.southern) || (latitude > 0.0 && self.southern) {
            return Err(Error::OutsideProjection(format!(
                "latitude {} is in the other hemisphere from the {} aspect",
                rad_to_deg(latitude),
                self.hemisphere()
            )));
        }
        if !longitude.in_lon_range(0.0) {
            return Err(Error::InvalidLongitude(format!(
                "{} outside of valid range [-180, 360]",
                rad_to_deg(longitude)
            )));
        }

        if (latitude.abs() - PI / 2.0).abs() < POLE_TOLERANCE {
            return Ok(MapCoord::new(self.false_easting, self.false_northing));
        }

        if self.southern {
            longitude *= -1.0;
            latitude *= -1.0;
        }
        let dlam = (longitude - self.central_meridian).wrap_pi();

        let essin = self.es * latitude.sin();
        let t = (PI / 4.0 - latitude / 2.0).tan() / self.polar_pow(essin);

        let rho = if self.polar_exact {
            self.two_a * t / self.k90
        } else {
            self.a_mc * t / self.tc
        };

        let (sin_dlam, cos_dlam) = dlam.sin_cos();
        let (easting, northing) = if self.southern {
            (-(rho * sin_dlam - self.false_easting), rho * cos_dlam + self.false_northing)
        } else {
            (rho * sin_dlam + self.false_easting, -rho * cos_dlam + self.false_northing)
        };

        Ok(MapCoord::new(easting, northing))
    }

    /// Recovers the geodetic point of a projected coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEasting`]/[`Error::InvalidNorthing`] outside
    /// the envelope around the false origin and
    /// [`Error::OutsideProjection`] when the radius exceeds it.
    pub fn convert_to_geodetic(&self, coord: &MapCoord) -> Result<LatLon, Error> {
        let easting = coord.easting;
        let northing = coord.northing;

        let min_easting = self.false_easting - self.delta_easting;
        let max_easting = self.false_easting + self.delta_easting;
        let min_northing = self.false_northing - self.delta_northing;
        let max_northing = self.false_northing + self.delta_northing;

        if !(min_easting..=max_easting).contains(&easting) {
            return Err(Error::InvalidEasting(format!(
                "{easting} m not in [{min_easting:.3}, {max_easting:.3}]"
            )));
        }
        if !(min_northing..=max_northing).contains(&northing) {
            return Err(Error::InvalidNorthing(format!(
                "{northing} m not in [{min_northing:.3}, {max_northing:.3}]"
            )));
        }

        let mut dy = northing - self.false_northing;
        let mut dx = easting - self.false_easting;

        let rho = (dx * dx + dy * dy).sqrt();
        let delta_radius = (self.delta_easting * self.delta_easting
            + self.delta_northing * self.delta_northing)
            .sqrt();
        if rho > delta_radius {
            return Err(Error::OutsideProjection(format!(
                "radius {rho:.3} m exceeds {delta_radius:.3} m"
            )));
        }

        let (mut latitude, mut longitude) = if dy == 0.0 && dx == 0.0 {
            (PI / 2.0, self.central_meridian)
        } else {
            if self.southern {
                dy *= -1.0;
                dx *= -1.0;
            }

            let t = if self.polar_exact {
                rho * self.k90 / self.two_a
            } else {
                rho * self.tc / self.a_mc
            };

            let mut phi = PI / 2.0 - 2.0 * t.atan();
            let mut temp_phi = 0.0;
            let mut iterations = 0;
            while (phi - temp_phi).abs() > LAT_TOLERANCE && iterations < LAT_MAX_ITERATIONS {
                temp_phi = phi;
                let essin = self.es * phi.sin();
                phi = PI / 2.0 - 2.0 * (t * self.polar_pow(essin)).atan();
                iterations += 1;
            }

            // Distorted values are forced back onto the sphere
            let latitude = phi.clamp(-PI / 2.0, PI / 2.0);
            let longitude = (self.central_meridian + dx.atan2(-dy)).wrap_pi().clamp(-PI, PI);
            (latitude, longitude)
        };

        if self.southern {
            latitude *= -1.0;
            longitude *= -1.0;
        }

        Ok(LatLon::new(latitude, longitude))
    }
}
