use std::f64::consts::PI;

use crate::{
    constants::{
        EPSILON_RADIANS, MAX_INV_FLATTENING, MIN_INV_FLATTENING, UPS_FALSE_EASTING,
        UPS_FALSE_NORTHING, UPS_K0, UPS_MAX_EAST_NORTH, UPS_MAX_SOUTH_LAT, UPS_MIN_EAST_NORTH,
        UPS_MIN_NORTH_LAT,
    },
    coords::{
        latlon::LatLon,
        map::{Hemisphere, MapCoord},
    },
    ellipsoid::Ellipsoid,
    projections::polar_stereographic::PolarStereographic,
    utility::{rad_to_deg, GeoMath},
    Error,
};

/// A UPS coordinate: polar aspect and metres from the false origin.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpsCoord {
    #[cfg_attr(feature = "serde", serde(alias = "hemi"))]
    pub(crate) hemisphere: Hemisphere,
    pub(crate) easting: f64,
    pub(crate) northing: f64,
}

impl UpsCoord {
    pub fn new(hemisphere: Hemisphere, easting: f64, northing: f64) -> UpsCoord {
        Self {
            hemisphere,
            easting,
            northing,
        }
    }

    /// Tries to create a UPS coordinate from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEasting`]/[`Error::InvalidNorthing`] when
    /// either value is not in `[0, 4000000]`.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, UpsCoord};
    ///
    /// let coord = UpsCoord::create(Hemisphere::South, 2_000_000.0, 2_000_000.0).unwrap();
    /// assert_eq!(coord.hemisphere(), Hemisphere::South);
    /// assert_eq!(coord.to_string(), "S 2000000.000 2000000.000");
    ///
    /// assert!(UpsCoord::create(Hemisphere::North, -1.0, 2_000_000.0).is_err());
    /// assert!(UpsCoord::create(Hemisphere::North, 2_000_000.0, 4_000_001.0).is_err());
    /// ```
    pub fn create(hemisphere: Hemisphere, easting: f64, northing: f64) -> Result<UpsCoord, Error> {
        let coord = UpsCoord::new(hemisphere, easting, northing);
        coord.validate()?;
        Ok(coord)
    }

    fn validate(&self) -> Result<(), Error> {
        if !(UPS_MIN_EAST_NORTH..=UPS_MAX_EAST_NORTH).contains(&self.easting) {
            return Err(Error::InvalidEasting(format!(
                "{} m not in UPS range [{UPS_MIN_EAST_NORTH}, {UPS_MAX_EAST_NORTH}]",
                self.easting
            )));
        }
        if !(UPS_MIN_EAST_NORTH..=UPS_MAX_EAST_NORTH).contains(&self.northing) {
            return Err(Error::InvalidNorthing(format!(
                "{} m not in UPS range [{UPS_MIN_EAST_NORTH}, {UPS_MAX_EAST_NORTH}]",
                self.northing
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    #[inline]
    pub fn easting(&self) -> f64 {
        self.easting
    }

    #[inline]
    pub fn northing(&self) -> f64 {
        self.northing
    }
}

impl std::fmt::Display for UpsCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.3} {:.3}", self.hemisphere, self.easting, self.northing)
    }
}

/// Both polar caps must stay clear of the UTM latitudes, less a small
/// overlap.
fn check_polar_latitude(latitude: f64) -> Result<(), Error> {
    let inside = if latitude < 0.0 {
        latitude < UPS_MAX_SOUTH_LAT + EPSILON_RADIANS
    } else {
        latitude >= UPS_MIN_NORTH_LAT - EPSILON_RADIANS
    };

    if inside {
        Ok(())
    } else {
        Err(Error::InvalidLatitude(format!(
            "{} outside of UPS ranges [-90, -79.5] and [83.5, 90]",
            rad_to_deg(latitude)
        )))
    }
}

/// Converts between geodetic coordinates and UPS. The aspect used by a call
/// is picked from its own input; the converter holds no per-call state.
#[derive(Clone, Debug)]
pub struct UpsConverter {
    ellipsoid: Ellipsoid,
    north: PolarStereographic,
    south: PolarStereographic,
}

impl UpsConverter {
    /// Builds the north and south aspects for an ellipsoid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEllipsoid`] when the semi-major axis is not
    /// positive or the inverse flattening is not in `[250, 350]`.
    pub fn new(ellipsoid: &Ellipsoid) -> Result<UpsConverter, Error> {
        ellipsoid.validate(MIN_INV_FLATTENING, MAX_INV_FLATTENING)?;

        let aspect = |hemisphere| {
            PolarStereographic::with_scale_factor(
                ellipsoid,
                0.0,
                UPS_K0,
                hemisphere,
                UPS_FALSE_EASTING,
                UPS_FALSE_NORTHING,
            )
        };

        Ok(Self {
            ellipsoid: ellipsoid.clone(),
            north: aspect(Hemisphere::North)?,
            south: aspect(Hemisphere::South)?,
        })
    }

    /// A converter on the WGS84 ellipsoid.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in ellipsoid; the `Result` mirrors
    /// [`UpsConverter::new`].
    pub fn wgs84() -> Result<UpsConverter, Error> {
        Self::new(&Ellipsoid::wgs84())
    }

    #[inline]
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn aspect(&self, hemisphere: Hemisphere) -> &PolarStereographic {
        match hemisphere {
            Hemisphere::North => &self.north,
            Hemisphere::South => &self.south,
        }
    }

    /// Converts a geodetic point in one of the polar caps to UPS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLatitude`] outside `[-90, -79.5]` and
    /// `[83.5, 90]` degrees (each widened by about a metre) and
    /// [`Error::InvalidLongitude`] outside `[-180, 360]` degrees.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, LatLon, UpsConverter};
    ///
    /// let ups = UpsConverter::wgs84().unwrap();
    ///
    /// let pole = ups.convert_from_geodetic(&LatLon::from_degrees(-90.0, 0.0)).unwrap();
    /// assert_eq!(pole.hemisphere(), Hemisphere::South);
    /// assert_eq!((pole.easting(), pole.northing()), (2_000_000.0, 2_000_000.0));
    ///
    /// assert!(ups.convert_from_geodetic(&LatLon::from_degrees(45.0, 0.0)).is_err());
    /// ```
    pub fn convert_from_geodetic(&self, coord: &LatLon) -> Result<UpsCoord, Error> {
        let latitude = coord.latitude;
        let longitude = coord.longitude;

        if !(-PI / 2.0..=PI / 2.0).contains(&latitude) {
            return Err(Error::InvalidLatitude(format!(
                "{} outside of valid range [-90, 90]",
                rad_to_deg(latitude)
            )));
        }
        check_polar_latitude(latitude)?;
        if !longitude.in_lon_range(0.0) {
            return Err(Error::InvalidLongitude(format!(
                "{} outside of valid range [-180, 360]",
                rad_to_deg(longitude)
            )));
        }

        let hemisphere = Hemisphere::from_latitude(latitude);
        let projected = self.aspect(hemisphere).convert_from_geodetic(coord)?;

        Ok(UpsCoord {
            hemisphere,
            easting: projected.easting,
            northing: projected.northing,
        })
    }

    /// Converts a UPS coordinate back to geodetic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEasting`]/[`Error::InvalidNorthing`] when
    /// either value is not in `[0, 4000000]`, and [`Error::InvalidLatitude`]
    /// when the result falls outside the polar cap.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, UpsConverter, UpsCoord};
    ///
    /// let ups = UpsConverter::wgs84().unwrap();
    ///
    /// let coord = UpsCoord::create(Hemisphere::North, 2_000_000.0, 2_000_000.0).unwrap();
    /// let pole = ups.convert_to_geodetic(&coord).unwrap();
    /// assert!((pole.latitude() - 90.0).abs() < 1e-12);
    ///
    /// // Near the equator on the false origin grid
    /// let coord = UpsCoord::create(Hemisphere::North, 0.0, 0.0).unwrap();
    /// assert!(ups.convert_to_geodetic(&coord).is_err());
    /// ```
    pub fn convert_to_geodetic(&self, coord: &UpsCoord) -> Result<LatLon, Error> {
        coord.validate()?;

        let geodetic = self
            .aspect(coord.hemisphere)
            .convert_to_geodetic(&MapCoord::new(coord.easting, coord.northing))?;

        check_polar_latitude(geodetic.latitude)?;

        Ok(geodetic)
    }
}
