use std::f64::consts::PI;

use crate::{
    constants::{
        EPSILON_RADIANS, MAX_INV_FLATTENING, MIN_INV_FLATTENING, UTM_FALSE_EASTING, UTM_K0,
        UTM_MAX_EASTING, UTM_MAX_LAT, UTM_MAX_NORTHING, UTM_MIN_EASTING, UTM_MIN_LAT,
        UTM_MIN_NORTHING, UTM_SOUTH_FALSE_NORTHING,
    },
    coords::{
        latlon::LatLon,
        map::{Hemisphere, MapCoord},
    },
    ellipsoid::Ellipsoid,
    projections::transverse_mercator::TransverseMercator,
    utility::{rad_to_deg, GeoMath},
    Error, ThisOrThat,
};

pub(crate) const MIN_ZONE: i32 = 1;
pub(crate) const MAX_ZONE: i32 = 60;

// Latitudes this close below the equator are treated as on it
const EQUATOR_SNAP: f64 = 1.0e-9;
// Keeps a longitude sitting exactly on a zone edge in the eastern zone
const ZONE_EDGE_BIAS: f64 = 1.0e-10;

/// One fixed exception to the 6° zone grid. The latitude and longitude are
/// whole degrees truncated toward zero, with longitude in `[0, 360)`.
struct ZoneException {
    min_lat: i32,
    max_lat: i32,
    min_lon: i32,
    max_lon: i32,
    zone: i32,
}

impl ZoneException {
    const fn new(min_lat: i32, max_lat: i32, min_lon: i32, max_lon: i32, zone: i32) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon, zone }
    }

    fn matches(&self, lat_degrees: i32, lon_degrees: i32) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat_degrees)
            && (self.min_lon..=self.max_lon).contains(&lon_degrees)
    }
}

/// Southern Norway then Svalbard, checked in order. The first match wins.
const ZONE_EXCEPTIONS: [ZoneException; 6] = [
    ZoneException::new(56, 63, 0, 2, 31),
    ZoneException::new(56, 63, 3, 11, 32),
    ZoneException::new(72, i32::MAX, 0, 8, 31),
    ZoneException::new(72, i32::MAX, 9, 20, 33),
    ZoneException::new(72, i32::MAX, 21, 32, 35),
    ZoneException::new(72, i32::MAX, 33, 41, 37),
];

/// Central meridian of a UTM zone in radians. Zones 1 to 30 are expressed
/// past PI rather than as negative angles.
pub(crate) fn zone_central_meridian(zone: i32) -> f64 {
    let degrees = (zone >= 31).ternary(6 * zone - 183, 6 * zone + 177);
    f64::from(degrees) * PI / 180.0
}

/// Whether an override zone may replace the computed zone: it must be the
/// same zone or a neighbour, with 1 and 60 adjacent.
pub(crate) fn override_allowed(zone: i32, zone_override: i32) -> bool {
    (zone == 1 && zone_override == 60)
        || (zone == 60 && zone_override == 1)
        || (zone - 1..=zone + 1).contains(&zone_override)
}

/// A UTM coordinate: zone, hemisphere and metres within the zone.
///
/// ```
/// use gridref::{Hemisphere, UtmCoord};
///
/// let coord = UtmCoord::new(31, Hemisphere::North, 166021.4431, 0.0);
/// assert_eq!(coord.to_string(), "31N 166021.443 0.000");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtmCoord {
    pub(crate) zone: i32,
    #[cfg_attr(feature = "serde", serde(alias = "hemi"))]
    pub(crate) hemisphere: Hemisphere,
    pub(crate) easting: f64,
    pub(crate) northing: f64,
}

impl UtmCoord {
    /// Creates a coordinate without checking it; the converter validates
    /// before use.
    pub fn new(zone: i32, hemisphere: Hemisphere, easting: f64, northing: f64) -> UtmCoord {
        Self {
            zone,
            hemisphere,
            easting,
            northing,
        }
    }

    /// Tries to create a UTM coordinate from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidZone`] when the zone is not in `[1, 60]`, and
    /// [`Error::InvalidEasting`]/[`Error::InvalidNorthing`] when the easting
    /// is not in `[100000, 900000]` or the northing not in `[0, 10000000]`.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, UtmCoord};
    ///
    /// let coord = UtmCoord::create(18, Hemisphere::North, 585664.121, 4511315.422);
    /// assert!(coord.is_ok());
    ///
    /// let coord = coord.unwrap();
    /// assert_eq!(coord.zone(), 18);
    /// assert_eq!(coord.hemisphere(), Hemisphere::North);
    /// assert!((coord.easting() - 585664.121).abs() < 1e-3);
    /// assert!((coord.northing() - 4511315.422).abs() < 1e-3);
    ///
    /// assert!(UtmCoord::create(0, Hemisphere::North, 585664.121, 4511315.422).is_err());
    /// assert!(UtmCoord::create(61, Hemisphere::North, 585664.121, 4511315.422).is_err());
    /// assert!(UtmCoord::create(18, Hemisphere::North, 50_000.0, 4511315.422).is_err());
    /// ```
    pub fn create(zone: i32, hemisphere: Hemisphere, easting: f64, northing: f64) -> Result<UtmCoord, Error> {
        let coord = UtmCoord::new(zone, hemisphere, easting, northing);
        coord.validate()?;
        Ok(coord)
    }

    fn validate(&self) -> Result<(), Error> {
        if !(MIN_ZONE..=MAX_ZONE).contains(&self.zone) {
            return Err(Error::InvalidZone {
                zone: self.zone,
                msg: format!("not in [{MIN_ZONE}, {MAX_ZONE}]"),
            });
        }
        check_easting_northing(self.easting, self.northing)
    }

    /// Returns the UTM zone.
    #[inline]
    pub fn zone(&self) -> i32 {
        self.zone
    }

    #[inline]
    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    #[inline]
    pub fn easting(&self) -> f64 {
        self.easting
    }

    /// Returns the northing, including the southern false northing.
    #[inline]
    pub fn northing(&self) -> f64 {
        self.northing
    }
}

impl std::fmt::Display for UtmCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} {:.3} {:.3}",
            self.zone, self.hemisphere, self.easting, self.northing
        )
    }
}

fn check_easting_northing(easting: f64, northing: f64) -> Result<(), Error> {
    if !(UTM_MIN_EASTING..=UTM_MAX_EASTING).contains(&easting) {
        return Err(Error::InvalidEasting(format!(
            "{easting} m not in UTM range [{UTM_MIN_EASTING}, {UTM_MAX_EASTING}]"
        )));
    }
    if !(UTM_MIN_NORTHING..=UTM_MAX_NORTHING).contains(&northing) {
        return Err(Error::InvalidNorthing(format!(
            "{northing} m not in UTM range [{UTM_MIN_NORTHING}, {UTM_MAX_NORTHING}]"
        )));
    }
    Ok(())
}

fn check_latitude(latitude: f64) -> Result<(), Error> {
    if (UTM_MIN_LAT - EPSILON_RADIANS..UTM_MAX_LAT + EPSILON_RADIANS).contains(&latitude) {
        Ok(())
    } else {
        Err(Error::InvalidLatitude(format!(
            "{} outside of UTM range [-80.5, 84.5)",
            rad_to_deg(latitude)
        )))
    }
}

/// Converts between geodetic coordinates and UTM using one Transverse
/// Mercator projection per zone.
#[derive(Clone, Debug)]
pub struct UtmConverter {
    ellipsoid: Ellipsoid,
    zone_override: i32,
    // Index 0 is zone 1
    projections: Vec<TransverseMercator>,
}

impl UtmConverter {
    /// Builds a converter with no zone override.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEllipsoid`] when the semi-major axis is not
    /// positive or the inverse flattening is not in `[250, 350]`.
    pub fn new(ellipsoid: &Ellipsoid) -> Result<UtmConverter, Error> {
        Self::with_override(ellipsoid, 0)
    }

    /// Builds a converter that places every point in `zone_override`, which
    /// must be the computed zone or one of its neighbours. `0` means no
    /// override.
    ///
    /// # Errors
    ///
    /// As [`UtmConverter::new`], plus [`Error::InvalidZone`] when the
    /// override is not in `[0, 60]`.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Ellipsoid, LatLon, UtmConverter};
    ///
    /// let utm = UtmConverter::with_override(&Ellipsoid::wgs84(), 32).unwrap();
    /// assert_eq!(utm.zone_override(), 32);
    ///
    /// let coord = utm.convert_from_geodetic(&LatLon::from_degrees(50.0, 5.0), 0).unwrap();
    /// assert_eq!(coord.zone(), 32);
    ///
    /// assert!(UtmConverter::with_override(&Ellipsoid::wgs84(), 61).is_err());
    /// ```
    pub fn with_override(ellipsoid: &Ellipsoid, zone_override: i32) -> Result<UtmConverter, Error> {
        ellipsoid.validate(MIN_INV_FLATTENING, MAX_INV_FLATTENING)?;
        if !(0..=MAX_ZONE).contains(&zone_override) {
            return Err(Error::InvalidZone {
                zone: zone_override,
                msg: format!("override not in [0, {MAX_ZONE}]"),
            });
        }

        let projections = (MIN_ZONE..=MAX_ZONE)
            .map(|zone| {
                TransverseMercator::new(
                    ellipsoid,
                    zone_central_meridian(zone),
                    0.0,
                    UTM_FALSE_EASTING,
                    0.0,
                    UTM_K0,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ellipsoid: ellipsoid.clone(),
            zone_override,
            projections,
        })
    }

    /// A converter on the WGS84 ellipsoid.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in ellipsoid; the `Result` mirrors
    /// [`UtmConverter::new`].
    pub fn wgs84() -> Result<UtmConverter, Error> {
        Self::new(&Ellipsoid::wgs84())
    }

    #[inline]
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Instance level zone override, `0` for none.
    #[inline]
    pub fn zone_override(&self) -> i32 {
        self.zone_override
    }

    /// The Transverse Mercator projection behind a zone, if the zone is in
    /// `[1, 60]`.
    pub fn projection(&self, zone: i32) -> Option<&TransverseMercator> {
        usize::try_from(zone - MIN_ZONE)
            .ok()
            .and_then(|index| self.projections.get(index))
    }

    fn zone_projection(&self, zone: i32) -> Result<&TransverseMercator, Error> {
        self.projection(zone).ok_or_else(|| Error::InvalidZone {
            zone,
            msg: format!("not in [{MIN_ZONE}, {MAX_ZONE}]"),
        })
    }

    /// Converts a geodetic point to UTM. A non-zero `zone_override` takes
    /// precedence over the instance override; with neither set the Norway
    /// and Svalbard exceptions apply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLatitude`] outside `[-80.5, 84.5)` degrees,
    /// [`Error::InvalidLongitude`] outside `[-180, 360]` degrees,
    /// [`Error::InvalidZone`] when the override is not a neighbour of the
    /// computed zone and [`Error::InvalidEasting`]/[`Error::InvalidNorthing`]
    /// when the projected point leaves the UTM ranges.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, LatLon, UtmConverter};
    ///
    /// let utm = UtmConverter::wgs84().unwrap();
    ///
    /// let coord = utm.convert_from_geodetic(&LatLon::from_degrees(40.748333, -73.985278), 0).unwrap();
    /// assert_eq!(coord.zone(), 18);
    /// assert_eq!(coord.hemisphere(), Hemisphere::North);
    /// assert!((coord.easting() - 585664.121).abs() < 1e-2);
    /// assert!((coord.northing() - 4511315.422).abs() < 1e-2);
    ///
    /// // Southern Norway is in zone 32
    /// let bergen = utm.convert_from_geodetic(&LatLon::from_degrees(60.39, 5.32), 0).unwrap();
    /// assert_eq!(bergen.zone(), 32);
    /// ```
    pub fn convert_from_geodetic(&self, coord: &LatLon, zone_override: i32) -> Result<UtmCoord, Error> {
        let mut latitude = coord.latitude;
        let mut longitude = coord.longitude;

        check_latitude(latitude)?;
        if !longitude.in_lon_range(EPSILON_RADIANS) {
            return Err(Error::InvalidLongitude(format!(
                "{} outside of valid range [-180, 360]",
                rad_to_deg(longitude)
            )));
        }
        if !(0..=MAX_ZONE).contains(&zone_override) {
            return Err(Error::InvalidZone {
                zone: zone_override,
                msg: format!("override not in [0, {MAX_ZONE}]"),
            });
        }

        if latitude > -EQUATOR_SNAP && latitude < 0.0 {
            latitude = 0.0;
        }
        if longitude < 0.0 {
            longitude += 2.0 * PI;
        }

        let lat_degrees = (latitude * 180.0 / PI) as i32;
        let lon_degrees = (longitude * 180.0 / PI) as i32;

        let edge_degrees = (longitude + ZONE_EDGE_BIAS) * 180.0 / PI;
        let mut zone = if longitude < PI {
            (31.0 + edge_degrees / 6.0) as i32
        } else {
            (edge_degrees / 6.0 - 29.0) as i32
        };
        if zone > MAX_ZONE {
            zone = MIN_ZONE;
        } else if zone < 0 {
            return Err(Error::InvalidLongitude(format!(
                "{} does not fall in a UTM zone",
                rad_to_deg(coord.longitude)
            )));
        }

        let zone_override = (zone_override != 0).ternary(zone_override, self.zone_override);
        if zone_override != 0 {
            if !override_allowed(zone, zone_override) {
                return Err(Error::InvalidZone {
                    zone: zone_override,
                    msg: format!("override is not adjacent to computed zone {zone}"),
                });
            }
            zone = zone_override;
        } else if let Some(exception) = ZONE_EXCEPTIONS
            .iter()
            .find(|exception| exception.matches(lat_degrees, lon_degrees))
        {
            zone = exception.zone;
        }

        let hemisphere = Hemisphere::from_latitude(latitude);
        let false_northing = hemisphere.is_north().ternary(0.0, UTM_SOUTH_FALSE_NORTHING);

        let projected = self
            .zone_projection(zone)?
            .convert_from_geodetic(&LatLon::new(latitude, longitude))?;

        let easting = projected.easting;
        let northing = projected.northing + false_northing;
        check_easting_northing(easting, northing)?;

        Ok(UtmCoord {
            zone,
            hemisphere,
            easting,
            northing,
        })
    }

    /// Converts a UTM coordinate back to geodetic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidZone`], [`Error::InvalidEasting`] or
    /// [`Error::InvalidNorthing`] for out of range input, and
    /// [`Error::InvalidLatitude`] when the result leaves the UTM latitudes.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, UtmConverter, UtmCoord};
    ///
    /// let utm = UtmConverter::wgs84().unwrap();
    ///
    /// let coord = UtmCoord::create(18, Hemisphere::North, 585664.121, 4511315.422).unwrap();
    /// let point = utm.convert_to_geodetic(&coord).unwrap();
    /// assert!((point.latitude() - 40.748333).abs() < 1e-6);
    /// assert!((point.longitude() + 73.985278).abs() < 1e-6);
    /// ```
    pub fn convert_to_geodetic(&self, coord: &UtmCoord) -> Result<LatLon, Error> {
        coord.validate()?;

        let false_northing = coord.hemisphere.is_north().ternary(0.0, UTM_SOUTH_FALSE_NORTHING);
        let geodetic = self
            .zone_projection(coord.zone)?
            .convert_to_geodetic(&MapCoord::new(coord.easting, coord.northing - false_northing))?;

        check_latitude(geodetic.latitude)?;

        Ok(geodetic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exception_zone(lat_degrees: i32, lon_degrees: i32) -> Option<i32> {
        ZONE_EXCEPTIONS
            .iter()
            .find(|exception| exception.matches(lat_degrees, lon_degrees))
            .map(|exception| exception.zone)
    }

    #[test]
    fn norway_exceptions() {
        assert_eq!(exception_zone(56, 2), Some(31));
        assert_eq!(exception_zone(60, 3), Some(32));
        assert_eq!(exception_zone(63, 11), Some(32));
        assert_eq!(exception_zone(55, 5), None);
        assert_eq!(exception_zone(64, 5), None);
        assert_eq!(exception_zone(60, 12), None);
    }

    #[test]
    fn svalbard_exceptions() {
        assert_eq!(exception_zone(72, 0), Some(31));
        assert_eq!(exception_zone(78, 8), Some(31));
        assert_eq!(exception_zone(78, 9), Some(33));
        assert_eq!(exception_zone(80, 20), Some(33));
        assert_eq!(exception_zone(80, 21), Some(35));
        assert_eq!(exception_zone(84, 32), Some(35));
        assert_eq!(exception_zone(84, 33), Some(37));
        assert_eq!(exception_zone(84, 41), Some(37));
        assert_eq!(exception_zone(84, 42), None);
        assert_eq!(exception_zone(71, 10), None);
    }

    #[test]
    fn override_wraps_between_first_and_last_zone() {
        assert!(override_allowed(1, 60));
        assert!(override_allowed(60, 1));
        assert!(override_allowed(17, 16));
        assert!(override_allowed(17, 18));
        assert!(!override_allowed(17, 19));
        assert!(!override_allowed(2, 60));
    }

    #[test]
    fn central_meridians() {
        assert!((rad_to_deg(zone_central_meridian(31)) - 3.0).abs() < 1e-12);
        assert!((rad_to_deg(zone_central_meridian(60)) - 177.0).abs() < 1e-12);
        assert!((rad_to_deg(zone_central_meridian(1)) - 183.0).abs() < 1e-12);
        assert!((rad_to_deg(zone_central_meridian(18)) - 285.0).abs() < 1e-12);
    }
}
