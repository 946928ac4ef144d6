use crate::collider::aabb::slab_intersect;
use crate::collider::ContactInfo;
use crate::math::{Matrix4, Quaternion, Ray, Vector3};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Box collider with an arbitrary orientation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct OrientedBox {
    pub center: Vector3,
    pub half_extents: Vector3,
    pub rotation: Quaternion,
}

impl OrientedBox {
    /// Creates an oriented box from a center, half extents and rotation
    #[inline]
    pub fn new(center: Vector3, half_extents: Vector3, rotation: Quaternion) -> Self {
        Self { center, half_extents, rotation }
    }

    /// Maps a world-space point into the box's local frame
    #[inline]
    fn to_local(&self, p: Vector3) -> Vector3 {
        self.rotation.conjugate().rotate_vector(p - self.center)
    }

    /// Checks if this box contains a point
    pub fn contains(&self, p: Vector3) -> bool {
        let local = self.to_local(p).abs();
        local.x <= self.half_extents.x && local.y <= self.half_extents.y && local.z <= self.half_extents.z
    }

    /// Returns the closest surface point to `p` with the outward normal.
    ///
    /// Penetration is positive when `p` lies inside the box and negative
    /// when it lies outside.
    pub fn closest_point(&self, p: Vector3) -> ContactInfo {
        let local = self.to_local(p);
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        let surface = self.rotation.rotate_vector(clamped) + self.center;

        let delta = local - clamped;
        let outside_dist = delta.length();

        let (local_normal, penetration) = if outside_dist > 0.0 {
            (delta, -outside_dist)
        } else {
            let depths = self.half_extents - local.abs();
            if depths.x <= depths.y && depths.x <= depths.z {
                (Vector3::new(local.x.signum(), 0.0, 0.0), depths.x)
            } else if depths.y <= depths.x && depths.y <= depths.z {
                (Vector3::new(0.0, local.y.signum(), 0.0), depths.y)
            } else {
                (Vector3::new(0.0, 0.0, local.z.signum()), depths.z)
            }
        };

        ContactInfo {
            point: surface,
            normal: self.rotation.rotate_vector(local_normal).normalize(),
            penetration,
        }
    }

    /// Returns the distance along the ray to the first intersection, if any
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inverse = self.rotation.conjugate();
        let local_origin = inverse.rotate_vector(ray.origin - self.center);
        let local_direction = inverse.rotate_vector(ray.direction);

        slab_intersect(local_origin, local_direction, self.half_extents)
    }

    /// Produces the world-space box for the given model matrix.
    ///
    /// Half extents go through the absolute linear map; the combined linear
    /// part is re-orthonormalized to recover a pure rotation.
    pub fn transformed(&self, model: &Matrix4) -> OrientedBox {
        let linear = model.linear();

        let center = linear.multiply_vector(self.center) + model.translation();
        let half_extents = linear.abs().multiply_vector(self.half_extents);

        let local_rotation = self.rotation.to_rotation_matrix();
        let combined = crate::math::Matrix3::from_columns(
            linear.multiply_vector(local_rotation.column(0)),
            linear.multiply_vector(local_rotation.column(1)),
            linear.multiply_vector(local_rotation.column(2)),
        );
        let rotation = Quaternion::from_linear(&combined);

        OrientedBox { center, half_extents, rotation }
    }
}
