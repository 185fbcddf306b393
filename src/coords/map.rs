use std::fmt::Display;

use crate::ThisOrThat;

/// Plane coordinate produced by a map projection, in metres. Carries no zone
/// or hemisphere of its own.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapCoord {
    pub(crate) easting: f64,
    pub(crate) northing: f64,
}

impl MapCoord {
    pub fn new(easting: f64, northing: f64) -> MapCoord {
        Self { easting, northing }
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

impl Display for MapCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} {:.3}", self.easting, self.northing)
    }
}

/// Northern or southern hemisphere, or polar aspect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// The hemisphere a latitude lies in; the equator counts as north.
    ///
    /// ```
    /// use gridref::Hemisphere;
    ///
    /// assert_eq!(Hemisphere::from_latitude(0.0), Hemisphere::North);
    /// assert_eq!(Hemisphere::from_latitude(-0.1), Hemisphere::South);
    /// ```
    pub fn from_latitude(lat: f64) -> Hemisphere {
        (lat < 0.0).ternary(Hemisphere::South, Hemisphere::North)
    }

    #[inline]
    pub fn is_north(self) -> bool {
        self == Hemisphere::North
    }
}

impl Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.is_north().ternary('N', 'S'))
    }
}
