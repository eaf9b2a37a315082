use crate::constants::DEGENERACY_EPSILON;
use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for frame construction and conversion
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    /// `determinant` is scaled by the product of the axis lengths
    #[error("Degenerate basis: |det| = {determinant:e}")]
    DegenerateBasis { determinant: f64 },

    #[error("Transform is not invertible")]
    NotInvertible,

    #[error("Transform is not a proper rotation")]
    NotRotation,
}

/// Largest deviation of `RᵀR` from the identity accepted as a rotation
const ORTHONORMAL_TOLERANCE: f64 = 1e-9;

/// Result type for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;

/// Homogeneous 4x4 change-of-basis transform
///
/// The upper-left 3x3 block holds the three basis axes as columns, so that
/// applying the transform to `(1, 0, 0)` yields the x axis. The last column
/// carries an optional translation that only applies to points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeOfBasis {
    matrix: Matrix4<f64>,
}

impl ChangeOfBasis {
    /// Build a transform from three linearly independent axes
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - target basis axes expressed in the source frame
    ///
    /// # Returns
    /// `FrameError::DegenerateBasis` when the determinant divided by the
    /// product of the axis lengths is below `DEGENERACY_EPSILON`, or when any
    /// component is not finite. The test only depends on the angles between
    /// the axes, not on their scale.
    pub fn new(x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>) -> Result<Self> {
        let rotation = Matrix3::from_columns(&[x, y, z]);
        let determinant = rotation.determinant() / (x.norm() * y.norm() * z.norm());
        if !determinant.is_finite() || determinant.abs() < DEGENERACY_EPSILON {
            return Err(FrameError::DegenerateBasis { determinant });
        }

        Ok(Self::from_rotation(&rotation))
    }

    /// The identity transform
    pub fn identity() -> Self {
        ChangeOfBasis {
            matrix: Matrix4::identity(),
        }
    }

    fn from_rotation(rotation: &Matrix3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        ChangeOfBasis { matrix }
    }

    /// Same basis, with a translation applied to points after the rotation
    pub fn with_translation(mut self, translation: Vector3<f64>) -> Self {
        self.matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        self
    }

    /// The full homogeneous matrix
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// The 3x3 basis block
    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Transform a point, translation included
    pub fn apply(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.apply_vector(point) + self.translation()
    }

    /// Transform a direction or velocity, translation ignored
    pub fn apply_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Compose with another transform: `self` first, then `next`
    pub fn then(&self, next: &ChangeOfBasis) -> ChangeOfBasis {
        ChangeOfBasis {
            matrix: next.matrix * self.matrix,
        }
    }

    /// The basis block as a rotation quaternion
    ///
    /// Fails with `FrameError::NotRotation` unless the block is orthonormal
    /// with a positive determinant.
    pub fn to_rotation(&self) -> Result<UnitQuaternion<f64>> {
        let m = self.rotation();
        let deviation = (m.transpose() * m - Matrix3::identity()).norm();
        if !(deviation < ORTHONORMAL_TOLERANCE && m.determinant() > 0.0) {
            return Err(FrameError::NotRotation);
        }
        Ok(UnitQuaternion::from_rotation_matrix(
            &Rotation3::from_matrix_unchecked(m),
        ))
    }

    /// The transform that undoes this one
    pub fn inverse(&self) -> Result<ChangeOfBasis> {
        let matrix = self.matrix.try_inverse().ok_or(FrameError::NotInvertible)?;
        Ok(ChangeOfBasis { matrix })
    }
}

impl Default for ChangeOfBasis {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_permutation_example() {
        let basis = ChangeOfBasis::new(
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();

        assert_eq!(basis.apply(&Vector3::x()), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(basis.apply(&Vector3::y()), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(basis.apply(&Vector3::z()), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_repeated_axis_is_degenerate() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let result = ChangeOfBasis::new(x, Vector3::new(0.0, 1.0, 0.0), x);
        assert!(matches!(result, Err(FrameError::DegenerateBasis { .. })));
    }

    #[test]
    fn test_coplanar_and_non_finite_axes_are_degenerate() {
        let coplanar = ChangeOfBasis::new(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        );
        assert!(coplanar.is_err());

        let nan = ChangeOfBasis::new(
            Vector3::new(f64::NAN, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert!(nan.is_err());
    }

    #[test]
    fn test_degeneracy_ignores_axis_scale() {
        let small = ChangeOfBasis::new(
            Vector3::new(1e-3, 0.0, 0.0),
            Vector3::new(0.0, 1e-3, 0.0),
            Vector3::new(0.0, 0.0, 1e-3),
        );
        assert!(small.is_ok());

        let zero_axis = ChangeOfBasis::new(Vector3::zeros(), Vector3::y(), Vector3::z());
        assert!(matches!(zero_axis, Err(FrameError::DegenerateBasis { .. })));

        let nearly_parallel = ChangeOfBasis::new(
            Vector3::new(1e3, 0.0, 0.0),
            Vector3::new(1e3, 1e-10, 0.0),
            Vector3::new(0.0, 0.0, 1e3),
        );
        assert!(nearly_parallel.is_err());
    }

    #[test]
    fn test_inverse_roundtrip() {
        let theta: f64 = 0.3;
        let basis = ChangeOfBasis::new(
            Vector3::new(theta.cos(), theta.sin(), 0.0),
            Vector3::new(-theta.sin(), theta.cos(), 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        )
        .unwrap()
        .with_translation(Vector3::new(1.0, -2.0, 0.5));

        let v = Vector3::new(0.7, -1.3, 2.9);
        let back = basis.inverse().unwrap().apply(&basis.apply(&v));
        assert_relative_eq!(back, v, epsilon = 1e-12);
    }

    #[test]
    fn test_composition_is_sequential_application() {
        let a = ChangeOfBasis::new(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap()
        .with_translation(Vector3::new(0.0, 0.0, 3.0));
        let b = ChangeOfBasis::new(
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 0.5, 0.5),
            Vector3::new(0.0, -0.5, 0.5),
        )
        .unwrap();

        let v = Vector3::new(1.5, -0.25, 4.0);
        assert_relative_eq!(a.then(&b).apply(&v), b.apply(&a.apply(&v)), epsilon = 1e-12);
    }

    #[test]
    fn test_to_rotation() {
        let basis = ChangeOfBasis::new(Vector3::y(), Vector3::z(), Vector3::x()).unwrap();
        let q = basis.to_rotation().unwrap();
        let v = Vector3::new(0.4, -1.1, 2.0);
        assert_relative_eq!(q * v, basis.apply_vector(&v), epsilon = 1e-12);

        let mirrored = ChangeOfBasis::new(Vector3::y(), Vector3::x(), Vector3::z()).unwrap();
        assert_eq!(mirrored.to_rotation(), Err(FrameError::NotRotation));

        let stretched =
            ChangeOfBasis::new(Vector3::x() * 2.0, Vector3::y(), Vector3::z()).unwrap();
        assert_eq!(stretched.to_rotation(), Err(FrameError::NotRotation));
    }

    #[test]
    fn test_vectors_ignore_translation() {
        let basis = ChangeOfBasis::identity().with_translation(Vector3::new(5.0, 5.0, 5.0));
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(basis.apply_vector(&v), v);
        assert_eq!(basis.apply(&v), Vector3::new(6.0, 7.0, 8.0));
    }
}
