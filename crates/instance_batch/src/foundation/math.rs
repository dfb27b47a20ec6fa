//! Math utilities and types
//!
//! Provides the small set of math types the batching layer needs.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Translation component of a world matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Length of the matrix Y basis column, i.e. the world Y scale
pub fn scale_y_of(matrix: &Mat4) -> f32 {
    Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_extraction() {
        let transform = Transform::from_position(Vec3::new(1.0, 5.0, -2.0));
        let matrix = transform.to_matrix();
        assert_relative_eq!(translation_of(&matrix), Vec3::new(1.0, 5.0, -2.0));
    }

    #[test]
    fn test_scale_y_survives_rotation() {
        let transform = Transform {
            position: Vec3::zeros(),
            rotation: Quat::from_axis_angle(&Vector3::z_axis(), 0.7),
            scale: Vec3::new(1.0, 2.0, 3.0),
        };
        assert_relative_eq!(scale_y_of(&transform.to_matrix()), 2.0, epsilon = 1e-5);
    }
}
