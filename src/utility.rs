use std::f64::consts::PI;

/// Degrees to radians, matching `deg * (PI / 180)` bit for bit.
pub(crate) fn deg_to_rad(deg: f64) -> f64 {
    deg * (PI / 180.0)
}

pub(crate) fn rad_to_deg(rad: f64) -> f64 {
    rad * (180.0 / PI)
}

/// Inverse hyperbolic tangent in its logarithmic form.
pub(crate) fn atanh(x: f64) -> f64 {
    0.5 * ((1.0 + x) / (1.0 - x)).ln()
}

pub(crate) trait GeoMath {
    fn is_zero(&self) -> bool;
    /// Fold an angle in radians into `[-PI, PI]` with a single turn
    /// correction.
    fn wrap_pi(&self) -> Self;
    /// `[-PI, PI]` check with a tolerance on both ends.
    fn in_lon_range(&self, slop: f64) -> bool;
}

impl GeoMath for f64 {
    fn is_zero(&self) -> bool {
        self.abs() < f64::EPSILON
    }

    fn wrap_pi(&self) -> f64 {
        if *self > PI {
            *self - 2.0 * PI
        } else if *self < -PI {
            *self + 2.0 * PI
        } else {
            *self
        }
    }

    fn in_lon_range(&self, slop: f64) -> bool {
        *self >= -PI - slop && *self <= 2.0 * PI + slop
    }
}

/// `[cosh(2kx), sinh(2kx)]` for k = 1..=8 built from the double-angle
/// recurrence.
pub(crate) fn hyperbolic_series(two_x: f64) -> ([f64; 8], [f64; 8]) {
    let mut c = [0_f64; 8];
    let mut s = [0_f64; 8];

    c[0] = two_x.cosh();
    s[0] = two_x.sinh();
    c[1] = 2.0 * c[0] * c[0] - 1.0;
    s[1] = 2.0 * c[0] * s[0];
    c[2] = c[0] * c[1] + s[0] * s[1];
    s[2] = c[1] * s[0] + c[0] * s[1];
    c[3] = 2.0 * c[1] * c[1] - 1.0;
    s[3] = 2.0 * c[1] * s[1];
    c[4] = c[0] * c[3] + s[0] * s[3];
    s[4] = c[3] * s[0] + c[0] * s[3];
    c[5] = 2.0 * c[2] * c[2] - 1.0;
    s[5] = 2.0 * c[2] * s[2];
    c[6] = c[0] * c[5] + s[0] * s[5];
    s[6] = c[5] * s[0] + c[0] * s[5];
    c[7] = 2.0 * c[3] * c[3] - 1.0;
    s[7] = 2.0 * c[3] * s[3];

    (c, s)
}

/// `[cos(2ky), sin(2ky)]` for k = 1..=8 built from the double-angle
/// recurrence.
pub(crate) fn trig_series(two_y: f64) -> ([f64; 8], [f64; 8]) {
    let mut c = [0_f64; 8];
    let mut s = [0_f64; 8];

    c[0] = two_y.cos();
    s[0] = two_y.sin();
    c[1] = 2.0 * c[0] * c[0] - 1.0;
    s[1] = 2.0 * c[0] * s[0];
    c[2] = c[1] * c[0] - s[1] * s[0];
    s[2] = c[1] * s[0] + c[0] * s[1];
    c[3] = 2.0 * c[1] * c[1] - 1.0;
    s[3] = 2.0 * c[1] * s[1];
    c[4] = c[3] * c[0] - s[3] * s[0];
    s[4] = c[3] * s[0] + c[0] * s[3];
    c[5] = 2.0 * c[2] * c[2] - 1.0;
    s[5] = 2.0 * c[2] * s[2];
    c[6] = c[5] * c[0] - s[5] * s[0];
    s[6] = c[5] * s[0] + c[0] * s[5];
    c[7] = 2.0 * c[3] * c[3] - 1.0;
    s[7] = 2.0 * c[3] * s[3];

    (c, s)
}
