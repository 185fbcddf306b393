use std::fmt::Display;

use crate::{
    utility::{deg_to_rad, rad_to_deg},
    Error,
};

/// Mean radius of Earth in meters
///
/// <https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius>
const EARTH_MEAN_RADIUS_M: f64 = 6371.0088 * 1000.0;

/// A geodetic latitude/longitude point on the converter's ellipsoid.
///
/// Stored in radians, which is what every converter consumes. Converters
/// accept longitudes in `[-180, 360]` degrees and normalise them.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLon {
    #[cfg_attr(feature = "serde", serde(alias = "lat"))]
    pub(crate) latitude: f64,
    #[cfg_attr(feature = "serde", serde(alias = "lon"))]
    pub(crate) longitude: f64,
}

impl LatLon {
    /// Creates a point from radians without checking the range; the
    /// converters do their own validation.
    pub fn new(lat: f64, lon: f64) -> LatLon {
        Self {
            latitude: lat,
            longitude: lon,
        }
    }

    /// Creates a point from degrees without checking the range.
    ///
    /// ```
    /// use gridref::LatLon;
    ///
    /// let coord = LatLon::from_degrees(90.0, -180.0);
    /// assert!((coord.lat_radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
    /// assert!((coord.lon_radians() + std::f64::consts::PI).abs() < 1e-15);
    /// ```
    pub fn from_degrees(lat: f64, lon: f64) -> LatLon {
        Self::new(deg_to_rad(lat), deg_to_rad(lon))
    }

    /// Tries to create a latitude/longitude point from a pair in degrees.
    /// First checks if the values are valid:
    /// * Latitude must be in range [-90,90]
    /// * Longitude must be in range [-180,180]
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLatitude`] or [`Error::InvalidLongitude`].
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::LatLon;
    ///
    /// let coord = LatLon::create(40.748333, -73.985278);
    /// assert!(coord.is_ok());
    ///
    /// let coord = coord.unwrap();
    /// assert!((coord.latitude() - 40.748333).abs() < 1e-12);
    /// assert!((coord.longitude() + 73.985278).abs() < 1e-12);
    ///
    /// let invalid_coord_lat = LatLon::create(100.0, 0.0);
    /// assert!(invalid_coord_lat.is_err());
    ///
    /// let invalid_coord_lon = LatLon::create(0.0, -200.0);
    /// assert!(invalid_coord_lon.is_err());
    /// ```
    pub fn create(lat: f64, lon: f64) -> Result<LatLon, Error> {
        if !(-90_f64..=90_f64).contains(&lat) {
            Err(Error::InvalidLatitude(format!("{lat} outside of valid range [-90, 90]")))
        } else if !(-180_f64..=180_f64).contains(&lon) {
            Err(Error::InvalidLongitude(format!("{lon} outside of valid range [-180, 180]")))
        } else {
            Ok(LatLon::from_degrees(lat, lon))
        }
    }

    /// Returns the latitude in degrees.
    #[inline]
    pub fn latitude(&self) -> f64 {
        rad_to_deg(self.latitude)
    }

    /// Returns the longitude in degrees.
    #[inline]
    pub fn longitude(&self) -> f64 {
        rad_to_deg(self.longitude)
    }

    #[inline]
    pub fn lat_radians(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn lon_radians(&self) -> f64 {
        self.longitude
    }

    /// Returns whether the current point is in the northern hemisphere.
    ///
    /// ```
    /// use gridref::LatLon;
    ///
    /// assert!(LatLon::from_degrees(40.7, -73.9).is_north());
    /// assert!(!LatLon::from_degrees(-40.7, -73.9).is_north());
    /// ```
    pub fn is_north(&self) -> bool {
        self.latitude.is_sign_positive()
    }

    /// Returns the distance in meters between two [`LatLon`] points
    /// using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
    /// Uses the [mean radius of the Earth](https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius)
    /// in the calculation: `6371.0088`
    ///
    /// ```
    /// use gridref::LatLon;
    ///
    /// let a = LatLon::from_degrees(0.0, 0.0);
    /// let b = LatLon::from_degrees(0.0, 1.0);
    /// assert!((a.haversine(&b) - 111_195.08).abs() < 0.01);
    /// ```
    pub fn haversine(&self, other: &LatLon) -> f64 {
        2.0 * EARTH_MEAN_RADIUS_M * (
            ((other.latitude - self.latitude) / 2.0).sin().powi(2) +
            self.latitude.cos() * other.latitude.cos() *
            ((other.longitude - self.longitude) / 2.0).sin().powi(2)
        ).sqrt().asin()
    }
}

impl Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = ryu::Buffer::new();
        let lat = buf.format(self.latitude());
        let mut buf = ryu::Buffer::new();
        let lon = buf.format(self.longitude());
        write!(
            f,
            "{lat} {lon}",
        )
    }
}
