//! Reference ellipsoid parameters and the Transverse Mercator series
//! coefficients derived from them.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::constants::{WGS84_A, WGS84_CODE, WGS84_F};

/// A reference ellipsoid: semi-major axis `a` in metres, flattening `f` and a
/// two letter code.
///
/// The code only matters for well-known ellipsoids: it selects tabulated
/// series coefficients and, for MGRS, the historical lettering pattern.
/// Converters validate the ranges they need when they are built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipsoid {
    #[cfg_attr(feature = "serde", serde(alias = "a"))]
    semi_major_axis: f64,
    #[cfg_attr(feature = "serde", serde(alias = "f"))]
    flattening: f64,
    code: String,
}

impl Ellipsoid {
    /// Creates an ellipsoid from its semi-major axis, flattening and code.
    ///
    /// ```
    /// use gridref::Ellipsoid;
    ///
    /// let clarke = Ellipsoid::new(6_378_206.4, 1.0 / 294.978_698_2, "CC");
    /// assert_eq!(clarke.code(), "CC");
    /// assert!((clarke.inverse_flattening() - 294.978_698_2).abs() < 1e-9);
    /// ```
    pub fn new(semi_major_axis: f64, flattening: f64, code: &str) -> Ellipsoid {
        Self {
            semi_major_axis,
            flattening,
            code: code.to_string(),
        }
    }

    /// The WGS84 ellipsoid, code `WE`.
    ///
    /// ```
    /// use gridref::Ellipsoid;
    ///
    /// let wgs84 = Ellipsoid::wgs84();
    /// assert_eq!(wgs84.semi_major_axis(), 6_378_137.0);
    /// assert_eq!(wgs84.code(), "WE");
    /// ```
    pub fn wgs84() -> Ellipsoid {
        Self::new(WGS84_A, WGS84_F, WGS84_CODE)
    }

    #[inline]
    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    #[inline]
    pub fn flattening(&self) -> f64 {
        self.flattening
    }

    #[inline]
    pub fn inverse_flattening(&self) -> f64 {
        1.0 / self.flattening
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// First eccentricity `e = sqrt(2f - f^2)`.
    pub fn eccentricity(&self) -> f64 {
        (2.0 * self.flattening - self.flattening * self.flattening).sqrt()
    }

    /// Rejects a non-positive semi-major axis or an inverse flattening
    /// outside `[min_inv_f, max_inv_f]`.
    pub(crate) fn validate(&self, min_inv_f: f64, max_inv_f: f64) -> crate::Result<()> {
        if self.semi_major_axis <= 0.0 {
            return Err(crate::Error::InvalidEllipsoid(format!(
                "semi-major axis {} must be greater than zero",
                self.semi_major_axis
            )));
        }

        let inv_f = self.inverse_flattening();
        if !(min_inv_f..=max_inv_f).contains(&inv_f) {
            return Err(crate::Error::InvalidEllipsoid(format!(
                "inverse flattening {inv_f} not in range [{min_inv_f}, {max_inv_f}]"
            )));
        }

        Ok(())
    }

    /// Whether the series accuracy has been verified for this shape.
    pub(crate) fn in_tested_range(&self) -> bool {
        (290.0..=301.0).contains(&self.inverse_flattening())
    }
}

/// Coefficients of the Transverse Mercator trigonometric series.
///
/// `alpha` takes conformal latitude to rectifying latitude, `beta` goes
/// back. `r4oa` is the meridional isoperimetric radius over `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SeriesCoefficients {
    pub alpha: [f64; 8],
    pub beta: [f64; 8],
    pub r4oa: f64,
}

/// Tabulated coefficients for the well-known ellipsoids, one row per group
/// of codes sharing a shape.
#[allow(clippy::unreadable_literal, clippy::type_complexity)]
const TABULATED: [(&[&str], [f64; 6], [f64; 6]); 14] = [
    (
        &["AA", "AM"],
        [8.3474517669594013740e-04, 7.554352936725572895e-07, 1.18487391005135489e-09, 2.3946872955703565e-12, 5.610633978440270e-15, 1.44858956458553e-17],
        [-8.3474551646761162264e-04, -5.863630361809676570e-08, -1.65562038746920803e-10, -2.1340335537652749e-13, -3.720760760132477e-16, -7.08304328877781e-19],
    ),
    (
        &["EA", "EB", "EC", "ED", "EE"],
        [8.3064943111192510534e-04, 7.480375027595025021e-07, 1.16750772278215999e-09, 2.3479972304395461e-12, 5.474212231879573e-15, 1.40642257446745e-17],
        [-8.3064976590443772201e-04, -5.805953517555717859e-08, -1.63133251663416522e-10, -2.0923797199593389e-13, -3.630200927775259e-16, -6.87666654919219e-19],
    ),
    (
        &["BN", "BR"],
        [8.3522527226849818552e-04, 7.563048340614894422e-07, 1.18692075307408346e-09, 2.4002054791393298e-12, 5.626801597980756e-15, 1.45360057224474e-17],
        [-8.3522561262703079182e-04, -5.870409978661008580e-08, -1.65848307463131468e-10, -2.1389565927064571e-13, -3.731493368666479e-16, -7.10756898071999e-19],
    ),
    (
        &["KA", "HE", "FA"],
        [8.3761175713442343106e-04, 7.606346200814720197e-07, 1.19713032035541037e-09, 2.4277772986483520e-12, 5.707722772225013e-15, 1.47872454335773e-17],
        [-8.3761210042019176501e-04, -5.904169154078546237e-08, -1.67276212891429215e-10, -2.1635549847939549e-13, -3.785212121016612e-16, -7.23053625983667e-19],
    ),
    (
        &["WD"],
        [8.3772481044362217923e-04, 7.608400388863560936e-07, 1.19761541904924067e-09, 2.4290893081322466e-12, 5.711579173743133e-15, 1.47992364667635e-17],
        [-8.3772515386847544554e-04, -5.905770828762463028e-08, -1.67344058948464124e-10, -2.1647255130188214e-13, -3.787772179729998e-16, -7.23640523525528e-19],
    ),
    (
        &["WE"],
        [8.3773182062446983032e-04, 7.608527773572489156e-07, 1.19764550324249210e-09, 2.4291706803973131e-12, 5.711818369154105e-15, 1.47999802705262e-17],
        [-8.3773216405794867707e-04, -5.905870152220365181e-08, -1.67348266534382493e-10, -2.1647981104903862e-13, -3.787930968839601e-16, -7.23676928796690e-19],
    ),
    (
        &["RF"],
        [8.3773182472855134012e-04, 7.608527848149655006e-07, 1.19764552085530681e-09, 2.4291707280369697e-12, 5.711818509192422e-15, 1.47999807059922e-17],
        [-8.3773216816203523672e-04, -5.905870210369121594e-08, -1.67348268997717031e-10, -2.1647981529928124e-13, -3.787931061803592e-16, -7.23676950110361e-19],
    ),
    (
        &["SA", "AN"],
        [8.3775209887947194075e-04, 7.608896263599627157e-07, 1.19773253021831769e-09, 2.4294060763606098e-12, 5.712510331613028e-15, 1.48021320370432e-17],
        [-8.3775244233790270051e-04, -5.906157468586898015e-08, -1.67360438158764851e-10, -2.1650081225048788e-13, -3.788390325953455e-16, -7.23782246429908e-19],
    ),
    (
        &["ID"],
        [8.3776052087969078729e-04, 7.609049308144604484e-07, 1.19776867565343872e-09, 2.4295038464530901e-12, 5.712797738386076e-15, 1.48030257891140e-17],
        [-8.3776086434848497443e-04, -5.906276799395007586e-08, -1.67365493472742884e-10, -2.1650953495573773e-13, -3.788581120060625e-16, -7.23825990889693e-19],
    ),
    (
        &["IN", "HO"],
        [8.4127599100356448089e-04, 7.673066923431950296e-07, 1.21291995794281190e-09, 2.4705731165688123e-12, 5.833780550286833e-15, 1.51800420867708e-17],
        [-8.4127633881644851945e-04, -5.956193574768780571e-08, -1.69484573979154433e-10, -2.2017363465021880e-13, -3.868896221495780e-16, -7.42279219864412e-19],
    ),
    (
        &["WO"],
        [8.4411652150600103279e-04, 7.724989750172583427e-07, 1.22525529789972041e-09, 2.5041361775549209e-12, 5.933026083631383e-15, 1.54904908794521e-17],
        [-8.4411687285559594196e-04, -5.996681687064322548e-08, -1.71209836918814857e-10, -2.2316811233502163e-13, -3.934782433323038e-16, -7.57474665717687e-19],
    ),
    (
        &["CC"],
        [8.4703742793654652315e-04, 7.778564517658115212e-07, 1.23802665917879731e-09, 2.5390045684252928e-12, 6.036484469753319e-15, 1.58152259295850e-17],
        [-8.4703778294785813001e-04, -6.038459874600183555e-08, -1.72996106059227725e-10, -2.2627911073545072e-13, -4.003466873888566e-16, -7.73369749524777e-19],
    ),
    (
        &["CG"],
        [8.5140099460764136776e-04, 7.858945456038187774e-07, 1.25727085106103462e-09, 2.5917718627340128e-12, 6.193726879043722e-15, 1.63109098395549e-17],
        [-8.5140135513650084564e-04, -6.101145475063033499e-08, -1.75687742410879760e-10, -2.3098718484594067e-13, -4.107860472919190e-16, -7.97633133452512e-19],
    ),
    (
        &["CD"],
        [8.5140395445291970541e-04, 7.859000119464140978e-07, 1.25728397182445579e-09, 2.5918079321459932e-12, 6.193834639108787e-15, 1.63112504092335e-17],
        [-8.5140431498554106268e-04, -6.101188106187092184e-08, -1.75689577596504470e-10, -2.3099040312610703e-13, -4.107932016207395e-16, -7.97649804397335e-19],
    ),
];

// Closed-form coefficients as polynomials in Helmert's n. Each entry lists
// (numerator, denominator) pairs from n^8 down to the lowest power present;
// coefficient k starts at n^(k+1).
#[allow(clippy::unreadable_literal)]
const ALPHA_POLY: [&[(f64, f64)]; 8] = [
    &[
        (-18975107.0, 50803200.0), (72161.0, 387072.0), (7891.0, 37800.0), (-127.0, 288.0),
        (41.0, 180.0), (5.0, 16.0), (-2.0, 3.0), (1.0, 2.0),
    ],
    &[
        (148003883.0, 174182400.0), (13769.0, 28800.0), (-1983433.0, 1935360.0), (281.0, 630.0),
        (557.0, 1440.0), (-3.0, 5.0), (13.0, 48.0),
    ],
    &[
        (79682431.0, 79833600.0), (-67102379.0, 29030400.0), (167603.0, 181440.0),
        (15061.0, 26880.0), (-103.0, 140.0), (61.0, 240.0),
    ],
    &[
        (-40176129013.0, 7664025600.0), (97445.0, 49896.0), (6601661.0, 7257600.0),
        (-179.0, 168.0), (49561.0, 161280.0),
    ],
    &[
        (2605413599.0, 622702080.0), (14644087.0, 9123840.0), (-3418889.0, 1995840.0),
        (34729.0, 80640.0),
    ],
    &[
        (175214326799.0, 58118860800.0), (-30705481.0, 10378368.0), (212378941.0, 319334400.0),
    ],
    &[(-16759934899.0, 3113510400.0), (1522256789.0, 1383782400.0)],
    &[(1424729850961.0, 743921418240.0)],
];

#[allow(clippy::unreadable_literal)]
const BETA_POLY: [&[(f64, f64)]; 8] = [
    &[
        (-7944359.0, 67737600.0), (5406467.0, 38707200.0), (-96199.0, 604800.0), (81.0, 512.0),
        (1.0, 360.0), (-37.0, 96.0), (2.0, 3.0), (-1.0, 2.0),
    ],
    &[
        (-24749483.0, 348364800.0), (-51841.0, 1209600.0), (1118711.0, 3870720.0),
        (-46.0, 105.0), (437.0, 1440.0), (-1.0, 15.0), (-1.0, 48.0),
    ],
    &[
        (6457463.0, 17740800.0), (-9261899.0, 58060800.0), (-5569.0, 90720.0), (209.0, 4480.0),
        (37.0, 840.0), (-17.0, 480.0),
    ],
    &[
        (-324154477.0, 7664025600.0), (-466511.0, 2494800.0), (830251.0, 7257600.0),
        (11.0, 504.0), (-4397.0, 161280.0),
    ],
    &[
        (-22894433.0, 124540416.0), (8005831.0, 63866880.0), (108847.0, 3991680.0),
        (-4583.0, 161280.0),
    ],
    &[
        (2204645983.0, 12915302400.0), (16363163.0, 518918400.0), (-20648693.0, 638668800.0),
    ],
    &[(497323811.0, 12454041600.0), (-219941297.0, 5535129600.0)],
    &[(-191773887257.0, 3719607091200.0)],
];

lazy_static! {
    static ref TABULATED_BY_CODE: HashMap<&'static str, ([f64; 6], [f64; 6])> = TABULATED
        .iter()
        .flat_map(|(codes, alpha, beta)| codes.iter().map(move |code| (*code, (*alpha, *beta))))
        .collect();
}

/// Sums `num * n^p / den` from the highest power down.
fn eval_poly(terms: &[(f64, f64)], powers: &[f64; 11]) -> f64 {
    terms
        .iter()
        .enumerate()
        .fold(0_f64, |acc, (i, (num, den))| acc + num * powers[8 - i] / den)
}

impl SeriesCoefficients {
    /// Coefficients for the given inverse flattening, preferring the table
    /// entry for `code` when there is one.
    pub(crate) fn generate(inv_flattening: f64, code: &str) -> SeriesCoefficients {
        // Helmert's n = (a - b) / (a + b)
        let n1 = 1.0 / (2.0 * inv_flattening - 1.0);

        let mut powers = [0_f64; 11];
        powers[1] = n1;
        for p in 2..=10 {
            powers[p] = powers[p - 1] * n1;
        }

        let mut alpha = [0_f64; 8];
        let mut beta = [0_f64; 8];

        if let Some((a, b)) = TABULATED_BY_CODE.get(code) {
            alpha[..6].copy_from_slice(a);
            beta[..6].copy_from_slice(b);
        } else {
            for k in 0..8 {
                alpha[k] = eval_poly(ALPHA_POLY[k], &powers);
                beta[k] = eval_poly(BETA_POLY[k], &powers);
            }
        }

        let mut r4 = 0.0;
        r4 += 49.0 * powers[10] / 65536.0;
        r4 += 25.0 * powers[8] / 16384.0;
        r4 += powers[6] / 256.0;
        r4 += powers[4] / 64.0;
        r4 += powers[2] / 4.0;
        r4 += 1.0;

        Self {
            alpha,
            beta,
            r4oa: r4 / (1.0 + n1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_form_agrees_with_wgs84_table() {
        let inv_f = Ellipsoid::wgs84().inverse_flattening();
        let table = SeriesCoefficients::generate(inv_f, "WE");
        let computed = SeriesCoefficients::generate(inv_f, "??");

        for k in 0..6 {
            let scale = table.alpha[k].abs();
            assert!((table.alpha[k] - computed.alpha[k]).abs() <= scale * 1e-6, "alpha {k}");
            let scale = table.beta[k].abs();
            assert!((table.beta[k] - computed.beta[k]).abs() <= scale * 1e-6, "beta {k}");
        }
        assert_eq!(table.r4oa, computed.r4oa);
    }

    #[test]
    fn every_tabulated_code_is_reachable() {
        for (codes, alpha, _) in &TABULATED {
            for code in *codes {
                assert_eq!(TABULATED_BY_CODE.get(code).map(|(a, _)| a), Some(alpha));
            }
        }
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        assert!(Ellipsoid::new(0.0, WGS84_F, "WE").validate(250.0, 350.0).is_err());
        assert!(Ellipsoid::new(WGS84_A, 1.0 / 200.0, "XX").validate(250.0, 350.0).is_err());
        assert!(Ellipsoid::new(WGS84_A, 1.0 / 200.0, "XX").validate(150.0, f64::INFINITY).is_ok());
        assert!(Ellipsoid::wgs84().validate(250.0, 350.0).is_ok());
    }
}
