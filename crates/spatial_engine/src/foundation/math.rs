//! Math utilities and types
//!
//! Provides fundamental math types for poses, transforms and geometry.

use serde::{Deserialize, Serialize};

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

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

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from an affine transformation matrix
    ///
    /// Anchor poses arrive as `origin_from_anchor` matrices; this splits them
    /// back into position, rotation and (positive) scale.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = translation_of(matrix);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        if scale_x <= f32::EPSILON || scale_y <= f32::EPSILON || scale_z <= f32::EPSILON {
            return Self { position, rotation: Quat::identity(), scale };
        }

        let rotation_matrix = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Serializable pose used by scenario and configuration files
///
/// Rotation is stored as `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Translation in meters
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation quaternion `[x, y, z, w]`
    #[serde(default = "PoseRecord::identity_rotation")]
    pub rotation: [f32; 4],
}

impl PoseRecord {
    const fn identity_rotation() -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    /// Pose located at `position` with no rotation
    pub const fn at(position: [f32; 3]) -> Self {
        Self { position, rotation: Self::identity_rotation() }
    }

    /// Convert to a rigid transform
    pub fn to_transform(&self) -> Transform {
        let [x, y, z, w] = self.rotation;
        let rotation = Quat::from_quaternion(Quaternion::new(w, x, y, z));
        Transform::from_position_rotation(Vec3::from(self.position), rotation)
    }

    /// Convert to an affine matrix
    pub fn to_matrix(&self) -> Mat4 {
        self.to_transform().to_matrix()
    }
}

impl Default for PoseRecord {
    fn default() -> Self {
        Self::at([0.0; 3])
    }
}

/// Extract the translation column of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}
