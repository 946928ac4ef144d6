use crate::math::{Matrix3, Vector3};
use nalgebra as na;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A quaternion representation for rotations
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Creates a new quaternion from components
    #[inline]
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Creates an identity quaternion (no rotation)
    #[inline]
    pub fn identity() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Creates a quaternion from an axis and an angle in radians
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let half = angle * 0.5;
        let s = half.sin();
        let axis = axis.normalize();

        Self {
            w: half.cos(),
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// Returns a normalized version of the quaternion
    pub fn normalize(&self) -> Self {
        let length = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if length > crate::math::EPSILON {
            Self {
                w: self.w / length,
                x: self.x / length,
                y: self.y / length,
                z: self.z / length,
            }
        } else {
            Self::identity()
        }
    }

    /// Returns the conjugate, which is the inverse for a unit quaternion
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    /// Rotates a vector by this quaternion
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let u = Vector3::new(self.x, self.y, self.z);
        let uv = u.cross(&v);
        let uuv = u.cross(&uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// Converts the quaternion to a 3x3 rotation matrix
    pub fn to_rotation_matrix(&self) -> Matrix3 {
        let rot = self.to_nalgebra().to_rotation_matrix();
        Matrix3::from_nalgebra(rot.matrix())
    }

    /// Extracts the closest pure rotation from a (possibly sheared) linear map
    pub fn from_linear(linear: &Matrix3) -> Self {
        let unit = na::UnitQuaternion::from_matrix(&linear.to_nalgebra());
        Self::from_nalgebra(&unit)
    }

    /// Convert to nalgebra UnitQuaternion
    #[inline]
    pub fn to_nalgebra(&self) -> na::UnitQuaternion<f32> {
        na::UnitQuaternion::from_quaternion(na::Quaternion::new(self.w, self.x, self.y, self.z))
    }

    /// Convert from nalgebra UnitQuaternion
    #[inline]
    pub fn from_nalgebra(q: &na::UnitQuaternion<f32>) -> Self {
        Self { w: q.w, x: q.i, y: q.j, z: q.k }
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}
