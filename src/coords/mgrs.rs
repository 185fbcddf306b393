use std::{f64::consts::PI, fmt::Display, str::FromStr};

use log::debug;
use num::Integer;

use crate::{
    constants::{EPSILON_RADIANS, MAX_INV_FLATTENING, MIN_INV_FLATTENING, UPS_FALSE_EASTING},
    coords::{
        latlon::LatLon,
        map::Hemisphere,
        ups::{UpsConverter, UpsCoord},
        utm::{UtmConverter, UtmCoord, MAX_ZONE, MIN_ZONE},
    },
    ellipsoid::Ellipsoid,
    utility::{deg_to_rad, rad_to_deg, GeoMath},
    Error, ThisOrThat,
};

const DIGITS: &str = "0123456789";

pub const MAX_PRECISION: i32 = 5;

const SQUARE: f64 = 100_000.0;
const TWO_MILLION: f64 = 2_000_000.0;
const UTM_CENTRE_EASTING: f64 = 500_000.0;

// Bias applied before truncating a metre value to the requested precision
const TRUNCATION_EPSILON: f64 = 4.99e-4;
// Bias applied when printing an already truncated value
const PRINT_EPSILON: f64 = 4.99e-1;

const MIN_NON_POLAR_LAT: f64 = -80.0 * (PI / 180.0);
const MAX_NON_POLAR_LAT: f64 = 84.0 * (PI / 180.0);

// Ellipsoids whose 100 km squares follow the older lettering pattern
const NON_AA_PATTERN_CODES: [&str; 4] = ["CC", "CD", "BR", "BN"];

struct LatitudeBand {
    letter: u8,
    min_northing: f64,
    // Degrees
    north: f64,
    south: f64,
    northing_offset: f64,
}

const fn band(letter: u8, min_northing: f64, north: f64, south: f64, northing_offset: f64) -> LatitudeBand {
    LatitudeBand { letter, min_northing, north, south, northing_offset }
}

const LATITUDE_BANDS: [LatitudeBand; 20] = [
    band(b'C', 1_100_000.0, -72.0, -80.5, 0.0),
    band(b'D', 2_000_000.0, -64.0, -72.0, 2_000_000.0),
    band(b'E', 2_800_000.0, -56.0, -64.0, 2_000_000.0),
    band(b'F', 3_700_000.0, -48.0, -56.0, 2_000_000.0),
    band(b'G', 4_600_000.0, -40.0, -48.0, 4_000_000.0),
    band(b'H', 5_500_000.0, -32.0, -40.0, 4_000_000.0),
    band(b'J', 6_400_000.0, -24.0, -32.0, 6_000_000.0),
    band(b'K', 7_300_000.0, -16.0, -24.0, 6_000_000.0),
    band(b'L', 8_200_000.0, -8.0, -16.0, 8_000_000.0),
    band(b'M', 9_100_000.0, 0.0, -8.0, 8_000_000.0),
    band(b'N', 0.0, 8.0, 0.0, 0.0),
    band(b'P', 800_000.0, 16.0, 8.0, 0.0),
    band(b'Q', 1_700_000.0, 24.0, 16.0, 0.0),
    band(b'R', 2_600_000.0, 32.0, 24.0, 2_000_000.0),
    band(b'S', 3_500_000.0, 40.0, 32.0, 2_000_000.0),
    band(b'T', 4_400_000.0, 48.0, 40.0, 4_000_000.0),
    band(b'U', 5_300_000.0, 56.0, 48.0, 4_000_000.0),
    band(b'V', 6_200_000.0, 64.0, 56.0, 6_000_000.0),
    band(b'W', 7_000_000.0, 72.0, 64.0, 6_000_000.0),
    band(b'X', 7_900_000.0, 84.5, 72.0, 6_000_000.0),
];

fn latitude_band(letter: u8) -> Option<&'static LatitudeBand> {
    LATITUDE_BANDS.iter().find(|band| band.letter == letter)
}

impl LatitudeBand {
    fn contains(&self, latitude: f64, border: f64) -> bool {
        (deg_to_rad(self.south) - border..=deg_to_rad(self.north) + border).contains(&latitude)
    }
}

/// Lettering of the 100 km squares in one polar half cap.
struct UpsSquares {
    letter: u8,
    column_low: u8,
    column_high: u8,
    row_high: u8,
    false_easting: f64,
    false_northing: f64,
}

const UPS_SQUARES: [UpsSquares; 4] = [
    UpsSquares { letter: b'A', column_low: b'J', column_high: b'Z', row_high: b'Z', false_easting: 800_000.0, false_northing: 800_000.0 },
    UpsSquares { letter: b'B', column_low: b'A', column_high: b'R', row_high: b'Z', false_easting: 2_000_000.0, false_northing: 800_000.0 },
    UpsSquares { letter: b'Y', column_low: b'J', column_high: b'Z', row_high: b'P', false_easting: 800_000.0, false_northing: 1_300_000.0 },
    UpsSquares { letter: b'Z', column_low: b'A', column_high: b'J', row_high: b'P', false_easting: 2_000_000.0, false_northing: 1_300_000.0 },
];

// Columns never used by the polar squares
const UPS_SKIPPED_COLUMNS: &[u8] = b"DEMNVW";

fn ups_squares(letter: u8) -> Option<&'static UpsSquares> {
    UPS_SQUARES.iter().find(|squares| squares.letter == letter)
}

/// Moves a UTM point at the 100 km square level into a neighbouring zone,
/// around southern Norway (band V) and Svalbard (band X).
struct SquareOverride {
    band: u8,
    zone: i32,
    east_of_centre: bool,
    target: i32,
}

const SQUARE_OVERRIDES: [SquareOverride; 7] = [
    SquareOverride { band: b'V', zone: 31, east_of_centre: true, target: 32 },
    SquareOverride { band: b'X', zone: 32, east_of_centre: false, target: 31 },
    SquareOverride { band: b'X', zone: 32, east_of_centre: true, target: 33 },
    SquareOverride { band: b'X', zone: 34, east_of_centre: false, target: 33 },
    SquareOverride { band: b'X', zone: 34, east_of_centre: true, target: 35 },
    SquareOverride { band: b'X', zone: 36, east_of_centre: false, target: 35 },
    SquareOverride { band: b'X', zone: 36, east_of_centre: true, target: 37 },
];

fn square_override(band: u8, zone: i32, easting: f64) -> Option<i32> {
    SQUARE_OVERRIDES
        .iter()
        .find(|rule| {
            rule.band == band && rule.zone == zone && rule.east_of_centre == (easting >= UTM_CENTRE_EASTING)
        })
        .map(|rule| rule.target)
}

/// Position of a letter in the alphabet, `A` = 0.
fn ord(letter: u8) -> i32 {
    i32::from(letter) - i32::from(b'A')
}

fn to_letter(index: i32) -> Result<u8, Error> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| b'A' + i)
        .ok_or_else(|| Error::InvalidMgrs(format!("letter index {index} outside A-Z")))
}

/// Metres per unit of the last digit at a precision.
fn precision_scale(precision: i32) -> f64 {
    10_f64.powi(MAX_PRECISION - precision)
}

fn check_precision(precision: i32) -> Result<(), Error> {
    if (0..=MAX_PRECISION).contains(&precision) {
        Ok(())
    } else {
        Err(Error::InvalidPrecision(precision))
    }
}

fn truncate(value: f64, divisor: f64) -> f64 {
    ((value + TRUNCATION_EPSILON) / divisor).trunc() * divisor
}

fn in_non_polar_band(latitude: f64) -> bool {
    (MIN_NON_POLAR_LAT - EPSILON_RADIANS..MAX_NON_POLAR_LAT + EPSILON_RADIANS).contains(&latitude)
}

fn latitude_letter(latitude: f64) -> Result<u8, Error> {
    const LAT_8: f64 = 8.0 * (PI / 180.0);
    const LAT_72: f64 = 72.0 * (PI / 180.0);
    const LAT_80: f64 = 80.0 * (PI / 180.0);
    const LAT_80_5: f64 = 80.5 * (PI / 180.0);
    const LAT_84_5: f64 = 84.5 * (PI / 180.0);

    if (LAT_72..LAT_84_5).contains(&latitude) {
        Ok(b'X')
    } else if latitude > -LAT_80_5 && latitude < LAT_72 {
        let index = (((latitude + LAT_80) / LAT_8) + 1.0e-12) as usize;
        LATITUDE_BANDS
            .get(index)
            .map(|band| band.letter)
            .ok_or_else(|| Error::InvalidLatitude(format!("{} has no latitude band", rad_to_deg(latitude))))
    } else {
        Err(Error::InvalidLatitude(format!(
            "{} has no latitude band",
            rad_to_deg(latitude)
        )))
    }
}

/// A parsed MGRS grid reference.
///
/// Holds the zone (`0` for the polar caps), the three letters and the
/// position inside the 100 km square at the given precision. Parsing and
/// printing round trip to the canonical form, with a zero padded zone and
/// upper case letters.
///
/// ```
/// use gridref::Mgrs;
///
/// let mgrs: Mgrs = " 4qfj 1234 6789".parse().unwrap();
/// assert_eq!(mgrs.zone(), 4);
/// assert_eq!(mgrs.band(), 'Q');
/// assert_eq!(mgrs.letters(), ['Q', 'F', 'J']);
/// assert_eq!(mgrs.precision(), 4);
/// assert_eq!(mgrs.easting(), 12340.0);
/// assert_eq!(mgrs.northing(), 67890.0);
/// assert_eq!(mgrs.to_string(), "04QFJ12346789");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mgrs {
    pub(crate) zone: i32,
    pub(crate) letters: [u8; 3],
    pub(crate) easting: f64,
    pub(crate) northing: f64,
    pub(crate) precision: i32,
}

impl Mgrs {
    /// Parses a grid reference string. Same as [`str::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMgrs`] if the string is malformed and
    /// [`Error::InvalidZone`] if the zone is not in `[1, 60]`.
    pub fn parse_str(mgrs_str: &str) -> Result<Mgrs, Error> {
        Self::from_str(mgrs_str)
    }

    /// UTM zone, `0` for the polar caps.
    #[inline]
    pub fn zone(&self) -> i32 {
        self.zone
    }

    /// Returns whether the reference is in one of the UPS covered caps.
    #[inline]
    pub fn is_polar(&self) -> bool {
        self.zone == 0
    }

    pub fn letters(&self) -> [char; 3] {
        self.letters.map(char::from)
    }

    /// Latitude band letter, or `A`/`B`/`Y`/`Z` for the polar caps.
    pub fn band(&self) -> char {
        char::from(self.letters[0])
    }

    /// Easting inside the 100 km square, in metres.
    #[inline]
    pub fn easting(&self) -> f64 {
        self.easting
    }

    /// Northing inside the 100 km square, in metres.
    #[inline]
    pub fn northing(&self) -> f64 {
        self.northing
    }

    /// Digits per coordinate, `0..=5`.
    #[inline]
    pub fn precision(&self) -> i32 {
        self.precision
    }
}

impl FromStr for Mgrs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut value = Vec::with_capacity(s.len());
        for c in s.chars() {
            if c.is_whitespace() {
                continue;
            }
            if !c.is_ascii_alphanumeric() {
                return Err(Error::InvalidMgrs(format!("invalid character {c:?}")));
            }
            // ASCII checked above
            value.push(c.to_ascii_uppercase() as u8);
        }

        let len = value.len();
        let mut p = 0;

        let mut zone = 0i32;
        while p < len {
            if let Some(i) = DIGITS.find(char::from(value[p])) {
                if p >= 2 {
                    return Err(Error::InvalidMgrs("more than 2 digits at start".to_string()));
                }
                zone = 10 * zone + i as i32;
                p += 1;
            } else {
                break;
            }
        }
        if p > 0 && !(MIN_ZONE..=MAX_ZONE).contains(&zone) {
            return Err(Error::InvalidZone {
                zone,
                msg: format!("not in [{MIN_ZONE}, {MAX_ZONE}]"),
            });
        }

        let letters_start = p;
        while p < len && value[p].is_ascii_alphabetic() {
            p += 1;
        }
        let letters: [u8; 3] = value[letters_start..p]
            .try_into()
            .map_err(|_| Error::InvalidMgrs(format!("expected 3 letters, found {}", p - letters_start)))?;
        if let Some(letter) = letters.iter().find(|&&l| l == b'I' || l == b'O') {
            return Err(Error::InvalidMgrs(format!("letter {} is never used", char::from(*letter))));
        }

        let digits_start = p;
        while p < len && value[p].is_ascii_digit() {
            p += 1;
        }
        if p != len {
            return Err(Error::InvalidMgrs(format!(
                "unexpected {:?} after the digits",
                char::from(value[p])
            )));
        }
        let digits = &value[digits_start..];
        if digits.len() > 2 * MAX_PRECISION as usize || digits.len().is_odd() {
            return Err(Error::InvalidMgrs(format!(
                "{} digits, expected an even count up to {}",
                digits.len(),
                2 * MAX_PRECISION
            )));
        }

        let n = digits.len() / 2;
        // At most five digits each
        let precision = n as i32;
        let parse = |part: &[u8]| {
            part.iter()
                .fold(0.0, |acc, d| acc * 10.0 + f64::from(d - b'0'))
        };
        let multiplier = precision_scale(precision);

        Ok(Mgrs {
            zone,
            letters,
            easting: parse(&digits[..n]) * multiplier,
            northing: parse(&digits[n..]) * multiplier,
            precision,
        })
    }
}

impl Display for Mgrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.zone != 0 {
            write!(f, "{:02}", self.zone)?;
        }
        for letter in self.letters {
            write!(f, "{}", char::from(letter))?;
        }

        if self.precision > 0 {
            let divisor = precision_scale(self.precision);
            let width = self.precision as usize;
            for value in [self.easting, self.northing] {
                let mut value = value % SQUARE;
                if value >= 99_999.5 {
                    value = 99_999.0;
                }
                let digits = ((value + PRINT_EPSILON) / divisor) as i64;
                write!(f, "{digits:0width$}")?;
            }
        }

        Ok(())
    }
}

/// Result of decoding a grid reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MgrsDecoded {
    pub(crate) latlon: LatLon,
    pub(crate) straddles_band_boundary: bool,
}

impl MgrsDecoded {
    #[inline]
    pub fn latlon(&self) -> LatLon {
        self.latlon
    }

    /// The decoded point fell outside its own latitude band but inside a
    /// neighbouring one, as happens for 100 km squares cut by a band edge.
    #[inline]
    pub fn straddles_band_boundary(&self) -> bool {
        self.straddles_band_boundary
    }
}

/// Encodes and decodes MGRS grid references over a UTM and a UPS converter
/// sharing one ellipsoid.
#[derive(Clone, Debug)]
pub struct MgrsConverter {
    ellipsoid: Ellipsoid,
    aa_pattern: bool,
    utm: UtmConverter,
    ups: UpsConverter,
}

impl MgrsConverter {
    /// Builds a converter. The ellipsoid code selects the 100 km square
    /// lettering pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEllipsoid`] when the semi-major axis is not
    /// positive or the inverse flattening is not in `[250, 350]`.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Ellipsoid, LatLon, MgrsConverter};
    ///
    /// // Clarke 1866 uses the older lettering
    /// let clarke = Ellipsoid::new(6_378_206.4, 1.0 / 294.978_698_2, "CC");
    /// let mgrs = MgrsConverter::new(&clarke).unwrap();
    /// let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(0.0, 0.0), 0).unwrap();
    /// assert_eq!(grid, "31NAL");
    ///
    /// assert!(MgrsConverter::new(&Ellipsoid::new(6_378_137.0, 1.0 / 200.0, "XX")).is_err());
    /// ```
    pub fn new(ellipsoid: &Ellipsoid) -> Result<MgrsConverter, Error> {
        ellipsoid.validate(MIN_INV_FLATTENING, MAX_INV_FLATTENING)?;

        Ok(Self {
            ellipsoid: ellipsoid.clone(),
            aa_pattern: !NON_AA_PATTERN_CODES.contains(&ellipsoid.code()),
            utm: UtmConverter::new(ellipsoid)?,
            ups: UpsConverter::new(ellipsoid)?,
        })
    }

    /// A converter on the WGS84 ellipsoid.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in ellipsoid; the `Result` mirrors
    /// [`MgrsConverter::new`].
    pub fn wgs84() -> Result<MgrsConverter, Error> {
        Self::new(&Ellipsoid::wgs84())
    }

    #[inline]
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Letter range of the column letter and false northing of row `A` for
    /// a zone.
    fn grid_values(&self, zone: i32) -> (u8, u8, f64) {
        let set = match zone.mod_floor(&6) {
            0 => 6,
            set => set,
        };

        let (low, high) = match set {
            1 | 4 => (b'A', b'H'),
            2 | 5 => (b'J', b'R'),
            _ => (b'S', b'Z'),
        };

        let pattern_offset = match (self.aa_pattern, set.is_even()) {
            (true, true) => 500_000.0,
            (true, false) => 0.0,
            (false, true) => 1_500_000.0,
            (false, false) => 1_000_000.0,
        };

        (low, high, pattern_offset)
    }

    /// Encodes a geodetic point, through UTM between 80°S and 84°N and UPS
    /// elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLatitude`], [`Error::InvalidLongitude`] or
    /// [`Error::InvalidPrecision`] for out of range input, and any error of
    /// the underlying UTM or UPS conversion.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{ErrorKind, LatLon, MgrsConverter};
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let coord = LatLon::from_degrees(40.748333, -73.985278);
    /// assert_eq!(mgrs.convert_from_geodetic(&coord, 5).unwrap(), "18TWL8566411315");
    /// assert_eq!(mgrs.convert_from_geodetic(&coord, 2).unwrap(), "18TWL8511");
    ///
    /// let pole = LatLon::from_degrees(90.0, 0.0);
    /// assert_eq!(mgrs.convert_from_geodetic(&pole, 0).unwrap(), "ZAH");
    ///
    /// let err = mgrs.convert_from_geodetic(&LatLon::from_degrees(95.0, 0.0), 5).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Range);
    /// ```
    pub fn convert_from_geodetic(&self, coord: &LatLon, precision: i32) -> Result<String, Error> {
        let latitude = coord.latitude;
        let longitude = coord.longitude;

        if !(-PI / 2.0..=PI / 2.0).contains(&latitude) {
            return Err(Error::InvalidLatitude(format!(
                "{} outside of valid range [-90, 90]",
                rad_to_deg(latitude)
            )));
        }
        if !longitude.in_lon_range(EPSILON_RADIANS) {
            return Err(Error::InvalidLongitude(format!(
                "{} outside of valid range [-180, 360]",
                rad_to_deg(longitude)
            )));
        }
        check_precision(precision)?;

        let mgrs = in_non_polar_band(latitude).ternary_lazy(
            || {
                self.utm
                    .convert_from_geodetic(coord, 0)
                    .and_then(|utm| self.from_utm(&utm, longitude, latitude, precision))
            },
            || {
                self.ups
                    .convert_from_geodetic(coord)
                    .and_then(|ups| self.from_ups(&ups, precision))
            },
        )?;

        Ok(mgrs.to_string())
    }

    /// Encodes a UTM coordinate. Points beyond 84°N or 80°S are encoded
    /// through UPS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidZone`], [`Error::InvalidEasting`],
    /// [`Error::InvalidNorthing`] or [`Error::InvalidPrecision`] for out of
    /// range input, and any error of the underlying conversions.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, MgrsConverter, UtmCoord};
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let utm = UtmCoord::create(18, Hemisphere::North, 585664.15, 4511315.45).unwrap();
    /// assert_eq!(mgrs.convert_from_utm(&utm, 5).unwrap(), "18TWL8566411315");
    /// assert!(mgrs.convert_from_utm(&utm, 6).is_err());
    /// ```
    pub fn convert_from_utm(&self, coord: &UtmCoord, precision: i32) -> Result<String, Error> {
        check_precision(precision)?;
        let geodetic = self.utm.convert_to_geodetic(coord)?;

        let mgrs = if in_non_polar_band(geodetic.latitude) {
            self.from_utm(coord, geodetic.longitude, geodetic.latitude, precision)?
        } else {
            let ups = self.ups.convert_from_geodetic(&geodetic)?;
            self.from_ups(&ups, precision)?
        };

        Ok(mgrs.to_string())
    }

    /// Encodes a UPS coordinate. Points that fall between 80°S and 84°N are
    /// encoded through UTM.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEasting`], [`Error::InvalidNorthing`] or
    /// [`Error::InvalidPrecision`] for out of range input, and any error of
    /// the underlying conversions.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, MgrsConverter, UpsCoord};
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let pole = UpsCoord::create(Hemisphere::South, 2_000_000.0, 2_000_000.0).unwrap();
    /// assert_eq!(mgrs.convert_from_ups(&pole, 5).unwrap(), "BAN0000000000");
    /// ```
    pub fn convert_from_ups(&self, coord: &UpsCoord, precision: i32) -> Result<String, Error> {
        check_precision(precision)?;
        let geodetic = self.ups.convert_to_geodetic(coord)?;

        if in_non_polar_band(geodetic.latitude) {
            self.convert_from_geodetic(&geodetic, precision)
        } else {
            Ok(self.from_ups(coord, precision)?.to_string())
        }
    }

    fn from_utm(&self, coord: &UtmCoord, longitude: f64, latitude: f64, precision: i32) -> Result<Mgrs, Error> {
        const LAT_6: f64 = 6.0 * (PI / 180.0);

        let band = latitude_letter(latitude)?;
        let mut utm = *coord;

        // A point handed over in a neighbouring zone goes back to the zone
        // its longitude gives.
        let pad = TRUNCATION_EPSILON / 6_378_137.0;
        let mut natural_zone = if longitude < PI {
            (31.0 + (longitude + pad) / LAT_6) as i32
        } else {
            ((longitude + pad) / LAT_6 - 29.0) as i32
        };
        if natural_zone > MAX_ZONE {
            natural_zone = MIN_ZONE;
        }
        if utm.zone != natural_zone {
            utm = self.reproject(latitude, longitude, utm.zone, natural_zone)?;
        }

        if let Some(target) = square_override(band, utm.zone, utm.easting) {
            utm = self.reproject(latitude, longitude, utm.zone, target)?;
        }

        let zone = utm.zone;
        let easting = utm.easting;
        let northing = utm.northing;

        let divisor = precision_scale(precision);
        let easting = truncate(easting, divisor);
        let mut northing = truncate(northing, divisor);

        if latitude <= 0.0 && northing == 1.0e7 {
            northing = 0.0;
        }

        let (column_low, _, pattern_offset) = self.grid_values(zone);

        let mut grid_northing = northing;
        while grid_northing >= TWO_MILLION {
            grid_northing -= TWO_MILLION;
        }
        grid_northing += pattern_offset;
        if grid_northing >= TWO_MILLION {
            grid_northing -= TWO_MILLION;
        }

        let mut row = (grid_northing / SQUARE) as i32;
        if row > ord(b'H') {
            row += 1;
        }
        if row > ord(b'N') {
            row += 1;
        }

        let mut column = ord(column_low) + (easting / SQUARE) as i32 - 1;
        if column_low == b'J' && column > ord(b'N') {
            column += 1;
        }

        Ok(Mgrs {
            zone,
            letters: [band, to_letter(column)?, to_letter(row)?],
            easting: easting % SQUARE,
            northing: northing % SQUARE,
            precision,
        })
    }

    fn reproject(&self, latitude: f64, longitude: f64, from: i32, to: i32) -> Result<UtmCoord, Error> {
        debug!("MGRS reprojecting from zone {from} into zone {to}");
        self.utm.convert_from_geodetic(&LatLon::new(latitude, longitude), to)
    }

    fn from_ups(&self, coord: &UpsCoord, precision: i32) -> Result<Mgrs, Error> {
        let divisor = precision_scale(precision);
        let easting = truncate(coord.easting, divisor);
        let northing = truncate(coord.northing, divisor);

        let east_half = easting >= UPS_FALSE_EASTING;
        let cap = match coord.hemisphere {
            Hemisphere::North => east_half.ternary(b'Z', b'Y'),
            Hemisphere::South => east_half.ternary(b'B', b'A'),
        };
        let squares = ups_squares(cap)
            .ok_or_else(|| Error::InvalidMgrs(format!("no polar squares for {}", char::from(cap))))?;

        let mut row = ((northing - squares.false_northing) / SQUARE) as i32;
        if row > ord(b'H') {
            row += 1;
        }
        if row > ord(b'N') {
            row += 1;
        }

        let mut column = ord(squares.column_low) + ((easting - squares.false_easting) / SQUARE) as i32;
        if east_half {
            if column > ord(b'C') {
                column += 2;
            }
            if column > ord(b'H') {
                column += 1;
            }
            if column > ord(b'L') {
                column += 3;
            }
        } else {
            if column > ord(b'L') {
                column += 3;
            }
            if column > ord(b'U') {
                column += 2;
            }
        }

        Ok(Mgrs {
            zone: 0,
            letters: [cap, to_letter(column)?, to_letter(row)?],
            easting: easting % SQUARE,
            northing: northing % SQUARE,
            precision,
        })
    }

    /// Decodes a grid reference to a geodetic point, reporting whether the
    /// point had to be accepted through a neighbouring latitude band.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMgrs`] for a malformed string or letters that
    /// cannot occur in the zone, [`Error::BandMismatch`] when the point lies
    /// in neither its band nor a neighbouring one, and any error of the
    /// underlying UTM or UPS conversion.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::MgrsConverter;
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let decoded = mgrs.decode("31NAA6602100000").unwrap();
    /// assert!(decoded.latlon().latitude().abs() < 1e-6);
    /// assert!(decoded.latlon().longitude().abs() < 1e-5);
    /// assert!(!decoded.straddles_band_boundary());
    /// ```
    pub fn decode(&self, mgrs_str: &str) -> Result<MgrsDecoded, Error> {
        let mgrs = Mgrs::from_str(mgrs_str)?;

        if mgrs.is_polar() {
            let ups = self.to_ups(&mgrs)?;
            Ok(MgrsDecoded {
                latlon: self.ups.convert_to_geodetic(&ups)?,
                straddles_band_boundary: false,
            })
        } else {
            let (_, latlon, straddles_band_boundary) = self.to_utm(&mgrs)?;
            Ok(MgrsDecoded {
                latlon,
                straddles_band_boundary,
            })
        }
    }

    /// Decodes a grid reference to a geodetic point.
    ///
    /// # Errors
    ///
    /// As [`MgrsConverter::decode`].
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{ErrorKind, MgrsConverter};
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let point = mgrs.convert_to_geodetic("18TWL8566411315").unwrap();
    /// assert!((point.latitude() - 40.748333).abs() < 1e-4);
    /// assert!((point.longitude() + 73.985278).abs() < 1e-4);
    ///
    /// let err = mgrs.convert_to_geodetic("18TWL85664-11315").unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Format);
    /// ```
    pub fn convert_to_geodetic(&self, mgrs_str: &str) -> Result<LatLon, Error> {
        self.decode(mgrs_str).map(|decoded| decoded.latlon)
    }

    /// Decodes a non-polar grid reference to its UTM coordinate.
    ///
    /// # Errors
    ///
    /// As [`MgrsConverter::decode`], and [`Error::InvalidMgrs`] for a polar
    /// reference.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, MgrsConverter};
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let utm = mgrs.convert_to_utm("18TWL8566411315").unwrap();
    /// assert_eq!(utm.zone(), 18);
    /// assert_eq!(utm.hemisphere(), Hemisphere::North);
    /// assert_eq!((utm.easting(), utm.northing()), (585664.0, 4511315.0));
    ///
    /// assert!(mgrs.convert_to_utm("ZAH").is_err());
    /// ```
    pub fn convert_to_utm(&self, mgrs_str: &str) -> Result<UtmCoord, Error> {
        let mgrs = Mgrs::from_str(mgrs_str)?;
        if mgrs.is_polar() {
            return Err(Error::InvalidMgrs(format!("{mgrs} is a polar reference")));
        }
        self.to_utm(&mgrs).map(|(utm, _, _)| utm)
    }

    /// Decodes a polar grid reference to its UPS coordinate.
    ///
    /// # Errors
    ///
    /// As [`MgrsConverter::decode`], and [`Error::InvalidMgrs`] for a
    /// reference with a zone.
    ///
    /// # Usage
    ///
    /// ```
    /// use gridref::{Hemisphere, MgrsConverter};
    ///
    /// let mgrs = MgrsConverter::wgs84().unwrap();
    ///
    /// let ups = mgrs.convert_to_ups("ZAH0000000000").unwrap();
    /// assert_eq!(ups.hemisphere(), Hemisphere::North);
    /// assert_eq!((ups.easting(), ups.northing()), (2_000_000.0, 2_000_000.0));
    /// ```
    pub fn convert_to_ups(&self, mgrs_str: &str) -> Result<UpsCoord, Error> {
        let mgrs = Mgrs::from_str(mgrs_str)?;
        if !mgrs.is_polar() {
            return Err(Error::InvalidMgrs(format!("{mgrs} is not a polar reference")));
        }
        let ups = self.to_ups(&mgrs)?;
        // Checked the same way a full decode would be
        self.ups.convert_to_geodetic(&ups)?;
        Ok(ups)
    }

    fn to_utm(&self, mgrs: &Mgrs) -> Result<(UtmCoord, LatLon, bool), Error> {
        let [band_letter, column, row] = mgrs.letters;
        let zone = mgrs.zone;

        let invalid = || Error::InvalidMgrs(format!("letters {mgrs} cannot occur in zone {zone}"));

        if (band_letter == b'X' && matches!(zone, 32 | 34 | 36))
            || (band_letter == b'V' && zone == 31 && column > b'D')
        {
            return Err(invalid());
        }

        let band = latitude_band(band_letter).ok_or_else(invalid)?;
        let hemisphere = (band_letter < b'N').ternary(Hemisphere::South, Hemisphere::North);

        let (column_low, column_high, pattern_offset) = self.grid_values(zone);
        if !(column_low..=column_high).contains(&column) || row > b'V' {
            return Err(invalid());
        }

        let mut grid_easting = f64::from(ord(column) - ord(column_low) + 1) * SQUARE;
        if column_low == b'J' && column > b'O' {
            grid_easting -= SQUARE;
        }

        let mut row_northing = f64::from(ord(row)) * SQUARE;
        if row > b'O' {
            row_northing -= SQUARE;
        }
        if row > b'I' {
            row_northing -= SQUARE;
        }
        if row_northing >= TWO_MILLION {
            row_northing -= TWO_MILLION;
        }

        let mut grid_northing = row_northing - pattern_offset;
        if grid_northing < 0.0 {
            grid_northing += TWO_MILLION;
        }
        grid_northing += band.northing_offset;
        if grid_northing < band.min_northing {
            grid_northing += TWO_MILLION;
        }

        let utm = UtmCoord::new(
            zone,
            hemisphere,
            grid_easting + mgrs.easting,
            grid_northing + mgrs.northing,
        );

        let latlon = self.utm.convert_to_geodetic(&utm)?;
        let latitude = latlon.latitude;

        // One unit of the last digit, as an angle
        let border = (PI / 180.0) / (SQUARE / precision_scale(mgrs.precision));
        if band.contains(latitude, border) {
            return Ok((utm, latlon, false));
        }

        let mut previous = (band_letter == b'C').ternary(band_letter, band_letter - 1);
        let mut next = (band_letter == b'X').ternary(band_letter, band_letter + 1);
        if matches!(previous, b'I' | b'O') {
            previous -= 1;
        }
        if matches!(next, b'I' | b'O') {
            next += 1;
        }

        let adjacent = [previous, next]
            .into_iter()
            .filter_map(latitude_band)
            .any(|neighbour| neighbour.contains(latitude, border));

        if adjacent {
            debug!(
                "{mgrs} decodes to latitude {} across the edge of band {}",
                rad_to_deg(latitude),
                char::from(band_letter)
            );
            Ok((utm, latlon, true))
        } else {
            Err(Error::BandMismatch {
                band: char::from(band_letter),
                latitude: rad_to_deg(latitude),
            })
        }
    }

    fn to_ups(&self, mgrs: &Mgrs) -> Result<UpsCoord, Error> {
        let [cap, column, row] = mgrs.letters;

        let invalid = || Error::InvalidMgrs(format!("letters {mgrs} cannot occur in a polar cap"));

        let squares = ups_squares(cap).ok_or_else(invalid)?;
        let hemisphere = matches!(cap, b'Y' | b'Z').ternary(Hemisphere::North, Hemisphere::South);

        if !(squares.column_low..=squares.column_high).contains(&column)
            || UPS_SKIPPED_COLUMNS.contains(&column)
            || row > squares.row_high
        {
            return Err(invalid());
        }

        let mut grid_northing = f64::from(ord(row)) * SQUARE + squares.false_northing;
        if row > b'I' {
            grid_northing -= SQUARE;
        }
        if row > b'O' {
            grid_northing -= SQUARE;
        }

        let mut grid_easting = f64::from(ord(column) - ord(squares.column_low)) * SQUARE + squares.false_easting;
        if squares.column_low == b'A' {
            if column > b'C' {
                grid_easting -= 2.0 * SQUARE;
            }
            if column > b'I' {
                grid_easting -= SQUARE;
            }
            if column > b'L' {
                grid_easting -= 3.0 * SQUARE;
            }
        } else {
            if column > b'L' {
                grid_easting -= 3.0 * SQUARE;
            }
            if column > b'U' {
                grid_easting -= 2.0 * SQUARE;
            }
        }

        Ok(UpsCoord::new(
            hemisphere,
            grid_easting + mgrs.easting,
            grid_northing + mgrs.northing,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_letters_skip_i_and_o() {
        let letters: String = LATITUDE_BANDS.iter().map(|band| char::from(band.letter)).collect();
        assert_eq!(letters, "CDEFGHJKLMNPQRSTUVWX");
    }

    #[test]
    fn latitude_letters() {
        assert_eq!(latitude_letter(deg_to_rad(0.0)).unwrap(), b'N');
        assert_eq!(latitude_letter(deg_to_rad(-0.1)).unwrap(), b'M');
        assert_eq!(latitude_letter(deg_to_rad(-80.2)).unwrap(), b'C');
        assert_eq!(latitude_letter(deg_to_rad(71.9)).unwrap(), b'W');
        assert_eq!(latitude_letter(deg_to_rad(72.0)).unwrap(), b'X');
        assert_eq!(latitude_letter(deg_to_rad(84.0)).unwrap(), b'X');
        assert!(latitude_letter(deg_to_rad(84.5)).is_err());
        assert!(latitude_letter(deg_to_rad(-80.5)).is_err());
    }

    #[test]
    fn square_overrides() {
        assert_eq!(square_override(b'V', 31, 500_000.0), Some(32));
        assert_eq!(square_override(b'V', 31, 499_999.0), None);
        assert_eq!(square_override(b'W', 31, 600_000.0), None);
        assert_eq!(square_override(b'X', 32, 400_000.0), Some(31));
        assert_eq!(square_override(b'X', 32, 600_000.0), Some(33));
        assert_eq!(square_override(b'X', 34, 400_000.0), Some(33));
        assert_eq!(square_override(b'X', 34, 600_000.0), Some(35));
        assert_eq!(square_override(b'X', 36, 400_000.0), Some(35));
        assert_eq!(square_override(b'X', 36, 600_000.0), Some(37));
        assert_eq!(square_override(b'X', 33, 600_000.0), None);
    }

    #[test]
    fn letter_index_bounds() {
        assert_eq!(to_letter(0).unwrap(), b'A');
        assert_eq!(to_letter(25).unwrap(), b'Z');
        assert!(to_letter(26).is_err());
        assert!(to_letter(-1).is_err());
    }

    #[test]
    fn ups_square_lookup() {
        assert_eq!(ups_squares(b'A').map(|s| s.column_low), Some(b'J'));
        assert_eq!(ups_squares(b'Z').map(|s| s.row_high), Some(b'P'));
        assert!(ups_squares(b'C').is_none());
    }
}
