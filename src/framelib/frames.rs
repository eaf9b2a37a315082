use super::basis::{ChangeOfBasis, Result};
use crate::constants::{DEG2RAD, OBLIQUITY_J2000_DEG};
use crate::time::JulianDate;
use lazy_static::lazy_static;
use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Galactic axes expressed in J2000 equatorial coordinates (rows of the
/// equatorial to galactic rotation)
const GALACTIC_AXES: [[f64; 3]; 3] = [
    [-0.054_875_560_416_215_4, -0.873_437_090_234_885_0, -0.483_835_015_548_713_2],
    [0.494_109_427_875_583_7, -0.444_829_629_960_011_2, 0.746_982_244_497_218_9],
    [-0.867_666_149_019_004_7, -0.198_076_373_431_201_5, 0.455_983_776_175_066_9],
];

/// Reference frames a position or direction can be expressed in
///
/// Every frame is defined by its three axes in J2000 equatorial coordinates,
/// which acts as the hub for all conversions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// Mean ecliptic and equinox of J2000
    EclipticJ2000,
    /// Ecliptic tilted by the obliquity of the given date
    EclipticOfDate(JulianDate),
    /// Mean equator and equinox of J2000
    EquatorialJ2000,
    /// IAU 1958 galactic system
    Galactic,
    /// Host renderer working frame: y toward the north celestial pole,
    /// z toward the vernal equinox, x toward RA 90°
    Render,
    /// Body axes, the equatorial axes rotated by an attitude
    BodyFixed(UnitQuaternion<f64>),
    /// Arbitrary axes given in equatorial coordinates
    Custom([Vector3<f64>; 3]),
}

impl Frame {
    /// The frame's x, y and z axes in J2000 equatorial coordinates
    pub fn axes(&self) -> [Vector3<f64>; 3] {
        match self {
            Frame::EclipticJ2000 => ecliptic_axes(OBLIQUITY_J2000_DEG * DEG2RAD),
            Frame::EclipticOfDate(jd) => ecliptic_axes(obliquity(*jd) * DEG2RAD),
            Frame::EquatorialJ2000 => [Vector3::x(), Vector3::y(), Vector3::z()],
            Frame::Galactic => GALACTIC_AXES.map(Vector3::from),
            Frame::Render => [Vector3::y(), Vector3::z(), Vector3::x()],
            Frame::BodyFixed(q) => [q * Vector3::x(), q * Vector3::y(), q * Vector3::z()],
            Frame::Custom(axes) => *axes,
        }
    }

    /// Transform taking coordinates in this frame to equatorial coordinates
    pub fn to_equatorial(&self) -> Result<ChangeOfBasis> {
        let [x, y, z] = self.axes();
        ChangeOfBasis::new(x, y, z)
    }

    /// Transform taking equatorial coordinates to this frame
    pub fn from_equatorial(&self) -> Result<ChangeOfBasis> {
        self.to_equatorial()?.inverse()
    }

    /// Transform between two frames, composed through the equatorial hub
    ///
    /// Both frames are validated even when they are equal, so a degenerate
    /// frame is an error rather than an identity.
    pub fn transform(from: &Frame, to: &Frame) -> Result<ChangeOfBasis> {
        let to_eq = from.to_equatorial()?;
        if from == to {
            return Ok(ChangeOfBasis::identity());
        }
        Ok(to_eq.then(&to.from_equatorial()?))
    }

    /// Check that the frame's axes form an invertible basis
    pub fn validate(&self) -> Result<()> {
        self.from_equatorial().map(|_| ())
    }

    /// Short name of the frame
    pub fn name(&self) -> &'static str {
        match self {
            Frame::EclipticJ2000 => "ecliptic-j2000",
            Frame::EclipticOfDate(_) => "ecliptic-of-date",
            Frame::EquatorialJ2000 => "equatorial-j2000",
            Frame::Galactic => "galactic",
            Frame::Render => "render",
            Frame::BodyFixed(_) => "body-fixed",
            Frame::Custom(_) => "custom",
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::Render
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::EclipticOfDate(jd) => write!(f, "{} ({})", self.name(), jd),
            _ => write!(f, "{}", self.name()),
        }
    }
}

fn ecliptic_axes(epsilon: f64) -> [Vector3<f64>; 3] {
    let (sin_e, cos_e) = epsilon.sin_cos();
    [
        Vector3::x(),
        Vector3::new(0.0, cos_e, sin_e),
        Vector3::new(0.0, -sin_e, cos_e),
    ]
}

/// Obliquity of the ecliptic in degrees for a given date
///
/// Polynomial of the Astronomical Almanac for 2010 in Julian centuries from J2000.
pub fn obliquity(jd: JulianDate) -> f64 {
    let t = jd.centuries();
    23.0 + 26.0 / 60.0
        + (21.406
            - (46.836_769
                - (0.000_183_1 + (0.002_003_40 - (0.576e-6 - 4.34e-8 * t) * t) * t) * t)
                * t)
            / 3600.0
}

lazy_static! {
    /// Named fixed-frame transforms, keyed by lowercase name
    static ref NAMED_TRANSFORMS: HashMap<&'static str, (Frame, Frame)> = {
        let (ecl, eq, gal) = (Frame::EclipticJ2000, Frame::EquatorialJ2000, Frame::Galactic);

        let mut m = HashMap::new();
        for (short, long, from, to) in [
            ("eqtoecl", "equatorialtoecliptic", eq, ecl),
            ("ecltoeq", "ecliptictoequatorial", ecl, eq),
            ("galtoeq", "galactictoequatorial", gal, eq),
            ("eqtogal", "equatorialtogalactic", eq, gal),
            ("ecltogal", "ecliptictogalactic", ecl, gal),
            ("galtoecl", "galactictoecliptic", gal, ecl),
        ] {
            m.insert(short, (from, to));
            m.insert(long, (from, to));
        }
        m
    };
}

/// Source and target frames of a named transform, if the name is known
pub fn named_frames(name: &str) -> Option<(Frame, Frame)> {
    NAMED_TRANSFORMS.get(name.to_lowercase().as_str()).copied()
}

/// Look up a transform by name (case-insensitive)
///
/// Unknown names yield the identity transform.
pub fn named_transform(name: &str) -> Result<ChangeOfBasis> {
    match named_frames(name) {
        Some((from, to)) => Frame::transform(&from, &to),
        None => {
            debug!("Unknown transform name '{}', using identity", name);
            Ok(ChangeOfBasis::identity())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RAD2DEG;
    use crate::coordinates::Spherical;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const ALL_FRAMES: [Frame; 5] = [
        Frame::EclipticJ2000,
        Frame::EquatorialJ2000,
        Frame::Galactic,
        Frame::Render,
        Frame::EclipticOfDate(JulianDate::new(2_460_000.5)),
    ];

    #[test]
    fn test_obliquity_polynomial() {
        assert_relative_eq!(
            obliquity(JulianDate::J2000),
            23.0 + 26.0 / 60.0 + 21.406 / 3600.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(obliquity(JulianDate::J2000), OBLIQUITY_J2000_DEG, epsilon = 1e-5);

        // About 46.8 arcseconds per century
        let next_century = JulianDate::J2000 + 36_525.0;
        let drift = (obliquity(JulianDate::J2000) - obliquity(next_century)) * 3600.0;
        assert_relative_eq!(drift, 46.836769, epsilon = 0.01);
    }

    #[test]
    fn test_ecliptic_pole_in_equatorial() {
        let eps = OBLIQUITY_J2000_DEG * DEG2RAD;
        let pole = Frame::EclipticJ2000
            .to_equatorial()
            .unwrap()
            .apply_vector(&Vector3::z());
        assert_relative_eq!(pole, Vector3::new(0.0, -eps.sin(), eps.cos()), epsilon = 1e-15);

        let s = Spherical::from_cartesian(&pole);
        assert_relative_eq!(s.lon * RAD2DEG, 270.0, epsilon = 1e-9);
        assert_relative_eq!(s.lat * RAD2DEG, 90.0 - OBLIQUITY_J2000_DEG, epsilon = 1e-9);
    }

    #[test]
    fn test_galactic_pole_in_equatorial() {
        let pole = Frame::Galactic
            .to_equatorial()
            .unwrap()
            .apply_vector(&Vector3::z());
        let s = Spherical::from_cartesian(&pole);
        assert_relative_eq!(s.lon * RAD2DEG, 192.8595, epsilon = 1e-3);
        assert_relative_eq!(s.lat * RAD2DEG, 27.1283, epsilon = 1e-3);
    }

    #[test]
    fn test_render_frame_is_y_up() {
        let eq_to_render = Frame::Render.from_equatorial().unwrap();
        assert_relative_eq!(
            eq_to_render.apply_vector(&Vector3::z()),
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            eq_to_render.apply_vector(&Vector3::x()),
            Vector3::new(0.0, 0.0, 1.0),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            eq_to_render.apply_vector(&Vector3::y()),
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_body_fixed_axes_follow_attitude() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let to_eq = Frame::BodyFixed(q).to_equatorial().unwrap();
        assert_relative_eq!(to_eq.apply_vector(&Vector3::x()), Vector3::y(), epsilon = 1e-15);
    }

    #[test]
    fn test_degenerate_custom_frame() {
        let frame = Frame::Custom([Vector3::x(), Vector3::x(), Vector3::z()]);
        assert!(frame.to_equatorial().is_err());
        assert!(Frame::transform(&frame, &Frame::Render).is_err());
        assert!(Frame::transform(&frame, &frame).is_err());
        assert!(frame.validate().is_err());
        assert!(Frame::Render.validate().is_ok());
    }

    #[test]
    fn test_same_frame_is_identity() {
        let t = Frame::transform(&Frame::Galactic, &Frame::Galactic).unwrap();
        assert_eq!(t, ChangeOfBasis::identity());
    }

    #[rstest]
    #[case(0, 1)]
    #[case(0, 2)]
    #[case(1, 3)]
    #[case(2, 3)]
    #[case(2, 4)]
    #[case(3, 4)]
    fn test_frame_roundtrip(#[case] a: usize, #[case] b: usize) {
        let (from, to) = (ALL_FRAMES[a], ALL_FRAMES[b]);
        let there = Frame::transform(&from, &to).unwrap();
        let back = Frame::transform(&to, &from).unwrap();

        let v = Vector3::new(0.3, -1.7, 2.2);
        assert_relative_eq!(back.apply(&there.apply(&v)), v, epsilon = 1e-12);
        assert_relative_eq!(there.apply(&v).norm(), v.norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_multi_hop_matches_direct() {
        let hop = Frame::transform(&Frame::EclipticJ2000, &Frame::EquatorialJ2000)
            .unwrap()
            .then(&Frame::transform(&Frame::EquatorialJ2000, &Frame::Galactic).unwrap());
        let direct = Frame::transform(&Frame::EclipticJ2000, &Frame::Galactic).unwrap();

        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(hop.apply(&v), direct.apply(&v), epsilon = 1e-12);
    }

    #[rstest]
    #[case("eqtoecl", Frame::EquatorialJ2000, Frame::EclipticJ2000)]
    #[case("EquatorialToEcliptic", Frame::EquatorialJ2000, Frame::EclipticJ2000)]
    #[case("ECLTOEQ", Frame::EclipticJ2000, Frame::EquatorialJ2000)]
    #[case("galtoecl", Frame::Galactic, Frame::EclipticJ2000)]
    #[case("equatorialtogalactic", Frame::EquatorialJ2000, Frame::Galactic)]
    fn test_named_transforms(#[case] name: &str, #[case] from: Frame, #[case] to: Frame) {
        let named = named_transform(name).unwrap();
        let expected = Frame::transform(&from, &to).unwrap();
        assert_relative_eq!(*named.matrix(), *expected.matrix(), epsilon = 1e-15);
    }

    #[test]
    fn test_unknown_name_is_identity() {
        assert!(named_frames("nowhere").is_none());
        assert_eq!(named_transform("nowhere").unwrap(), ChangeOfBasis::identity());
    }
}
