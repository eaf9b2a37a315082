//! Spherical coordinates and their Cartesian form
//!
//! Cartesian vectors follow the astronomical convention of the frame they are
//! expressed in: x toward longitude 0 on the fundamental plane, y toward
//! longitude 90°, z toward the pole.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Wrap an angle into [0, 2π)
///
/// `rem_euclid` rounds tiny negative angles up to exactly 2π; those map to 0.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(2.0 * PI);
    if wrapped >= 2.0 * PI {
        0.0
    } else {
        wrapped
    }
}

/// Longitude, latitude (radians) and radius on any spherical frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    /// Longitude in radians, [0, 2π)
    pub lon: f64,
    /// Latitude in radians, [-π/2, π/2]
    pub lat: f64,
    /// Distance from the origin
    pub radius: f64,
}

impl Spherical {
    /// Create a spherical coordinate, normalising the longitude to [0, 2π)
    pub fn new(lon: f64, lat: f64, radius: f64) -> Self {
        Spherical {
            lon: normalize_longitude(lon),
            lat,
            radius,
        }
    }

    /// Cartesian vector with the same length as `radius`
    ///
    /// - `x = r cos(lat) cos(lon)`
    /// - `y = r cos(lat) sin(lon)`
    /// - `z = r sin(lat)`
    pub fn to_cartesian(&self) -> Vector3<f64> {
        let (sin_lat, cos_lat) = self.lat.sin_cos();
        let (sin_lon, cos_lon) = self.lon.sin_cos();
        Vector3::new(
            self.radius * cos_lat * cos_lon,
            self.radius * cos_lat * sin_lon,
            self.radius * sin_lat,
        )
    }

    /// Spherical form of a Cartesian vector
    ///
    /// The zero vector maps to all zeros; on the pole the longitude is 0.
    pub fn from_cartesian(v: &Vector3<f64>) -> Self {
        let radius = v.norm();
        if radius == 0.0 {
            return Spherical {
                lon: 0.0,
                lat: 0.0,
                radius: 0.0,
            };
        }

        let lat = (v.z / radius).clamp(-1.0, 1.0).asin();
        let lon = if v.x == 0.0 && v.y == 0.0 {
            0.0
        } else {
            normalize_longitude(v.y.atan2(v.x))
        };

        Spherical { lon, lat, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_specific_directions() {
        let v = Spherical::new(0.0, 0.0, 1.0).to_cartesian();
        assert_relative_eq!(v, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-15);

        let v = Spherical::new(PI / 2.0, 0.0, 2.0).to_cartesian();
        assert_relative_eq!(v, Vector3::new(0.0, 2.0, 0.0), epsilon = 1e-15);

        let v = Spherical::new(1.0, PI / 2.0, 3.0).to_cartesian();
        assert_relative_eq!(v, Vector3::new(0.0, 0.0, 3.0), epsilon = 1e-15);
    }

    #[test]
    fn test_longitude_normalised() {
        let s = Spherical::new(-PI / 2.0, 0.0, 1.0);
        assert_relative_eq!(s.lon, 3.0 * PI / 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_tiny_negative_longitude_wraps_to_zero() {
        assert_eq!((-1e-20f64).rem_euclid(2.0 * PI), 2.0 * PI);
        assert_eq!(normalize_longitude(-1e-20), 0.0);
        assert_eq!(Spherical::new(-1e-20, 0.0, 1.0).lon, 0.0);
        assert!(normalize_longitude(-1e-10) < 2.0 * PI);

        let below_axis = Spherical::from_cartesian(&Vector3::new(1.0, -1e-300, 0.0));
        assert!(below_axis.lon < 2.0 * PI);
    }

    #[test]
    fn test_cartesian_roundtrip() {
        let mut rng = StdRng::seed_from_u64(424242);
        for _ in 0..100 {
            let lon = rng.gen::<f64>() * 2.0 * PI;
            let lat = (rng.gen::<f64>() * PI - PI / 2.0) * 0.99;
            let radius = rng.gen_range(0.1..40.0);

            let original = Spherical::new(lon, lat, radius);
            let roundtrip = Spherical::from_cartesian(&original.to_cartesian());

            assert_relative_eq!(original.lon.cos(), roundtrip.lon.cos(), epsilon = 1e-9);
            assert_relative_eq!(original.lon.sin(), roundtrip.lon.sin(), epsilon = 1e-9);
            assert_relative_eq!(original.lat, roundtrip.lat, epsilon = 1e-9);
            assert_relative_eq!(original.radius, roundtrip.radius, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_vector() {
        let s = Spherical::from_cartesian(&Vector3::zeros());
        assert_eq!(s.radius, 0.0);
        assert_eq!(s.lon, 0.0);
        assert_eq!(s.lat, 0.0);
    }
}
