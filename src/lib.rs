//! Conversions between geodetic coordinates and the UTM, UPS and MGRS grid
//! systems on a chosen reference ellipsoid.
//!
//! ```
//! use gridref::{LatLon, MgrsConverter};
//!
//! let mgrs = MgrsConverter::wgs84().unwrap();
//!
//! let grid = mgrs.convert_from_geodetic(&LatLon::from_degrees(0.0, 0.0), 5).unwrap();
//! assert_eq!(grid, "31NAA6602100000");
//!
//! let point = mgrs.convert_to_geodetic("16SGC3855124838").unwrap();
//! assert!((point.latitude() - 33.6366624).abs() < 1e-6);
//! assert!((point.longitude() + 84.4280571).abs() < 1e-6);
//! ```
#![warn(clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation
)]

use thiserror::Error;

pub mod ellipsoid;

pub mod projections {
    pub mod polar_stereographic;
    pub mod transverse_mercator;
}

pub mod coords {
    pub mod latlon;
    pub mod map;
    pub mod mgrs;
    pub mod ups;
    pub mod utm;
}

pub(crate) mod constants;
pub(crate) mod utility;

pub use coords::latlon::LatLon;
pub use coords::map::{Hemisphere, MapCoord};
pub use coords::mgrs::{Mgrs, MgrsConverter, MgrsDecoded};
pub use coords::ups::{UpsConverter, UpsCoord};
pub use coords::utm::{UtmConverter, UtmCoord};
pub use ellipsoid::Ellipsoid;
pub use projections::polar_stereographic::PolarStereographic;
pub use projections::transverse_mercator::TransverseMercator;

/// Alias for a `Result<T, gridref::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("Ellipsoid parameters are not valid: {0}")]
    InvalidEllipsoid(String),
    #[error("Projection parameters are not valid: {0}")]
    InvalidParameter(String),
    #[error("Latitude out of range: {0}")]
    InvalidLatitude(String),
    #[error("Longitude out of range: {0}")]
    InvalidLongitude(String),
    #[error("Easting out of range: {0}")]
    InvalidEasting(String),
    #[error("Northing out of range: {0}")]
    InvalidNorthing(String),
    #[error("Zone {zone} is not valid: {msg}")]
    InvalidZone { zone: i32, msg: String },
    #[error("Precision {0} not in range [0, 5]")]
    InvalidPrecision(i32),
    #[error("Point is outside of the projection area: {0}")]
    OutsideProjection(String),
    #[error("Iteration did not converge: {0}")]
    NoConvergence(String),
    #[error("MGRS string is invalid: {0}")]
    InvalidMgrs(String),
    #[error("Latitude {latitude} is not inside band {band} or its neighbours")]
    BandMismatch { band: char, latitude: f64 },
}

/// Coarse category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A parameter or coordinate lies outside its documented domain.
    Range,
    /// An iterative solve failed to produce a usable value.
    Convergence,
    /// A grid reference string is malformed.
    Format,
    /// A decoded grid reference contradicts its own latitude band.
    Consistency,
}

impl Error {
    /// Returns the category of the error.
    ///
    /// ```
    /// use gridref::{ErrorKind, LatLon, UtmConverter};
    ///
    /// let utm = UtmConverter::wgs84().unwrap();
    /// let err = utm.convert_from_geodetic(&LatLon::from_degrees(95.0, 0.0), 0).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Range);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoConvergence(_) => ErrorKind::Convergence,
            Error::InvalidMgrs(_) => ErrorKind::Format,
            Error::BandMismatch { .. } => ErrorKind::Consistency,
            Error::InvalidEllipsoid(_)
            | Error::InvalidParameter(_)
            | Error::InvalidLatitude(_)
            | Error::InvalidLongitude(_)
            | Error::InvalidEasting(_)
            | Error::InvalidNorthing(_)
            | Error::InvalidZone { .. }
            | Error::InvalidPrecision(_)
            | Error::OutsideProjection(_) => ErrorKind::Range,
        }
    }
}

trait ThisOrThat {
    fn ternary<T>(&self, r#true: T, r#false: T) -> T;
    fn ternary_lazy<F, E, T>(&self, r#true: F, r#false: E) -> T
    where
        F: Fn() -> T,
        E: Fn() -> T;
}

impl ThisOrThat for bool {
    fn ternary<T>(&self, r#true: T, r#false: T) -> T {
        if *self { r#true } else { r#false }
    }

    fn ternary_lazy<F, E, T>(&self, r#true: F, r#false: E) -> T
    where
        F: Fn() -> T,
        E: Fn() -> T,
    {
        if *self { r#true() } else { r#false() }
    }
}
