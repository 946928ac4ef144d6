use crate::collider::ContactInfo;
use crate::math::{Matrix4, Ray, Vector3, EPSILON};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box collider defined by a center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    pub center: Vector3,
    pub half_extents: Vector3,
}

impl Aabb {
    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn new(center: Vector3, half_extents: Vector3) -> Self {
        Self { center, half_extents }
    }

    /// Creates an AABB from minimum and maximum corners
    #[inline]
    pub fn from_min_max(min: Vector3, max: Vector3) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    /// Returns the minimum corner of the box
    #[inline]
    pub fn min(&self) -> Vector3 {
        self.center - self.half_extents
    }

    /// Returns the maximum corner of the box
    #[inline]
    pub fn max(&self) -> Vector3 {
        self.center + self.half_extents
    }

    /// Checks if this AABB contains a point
    pub fn contains(&self, p: Vector3) -> bool {
        let local = (p - self.center).abs();
        local.x <= self.half_extents.x && local.y <= self.half_extents.y && local.z <= self.half_extents.z
    }

    /// Checks if this AABB intersects with another AABB
    pub fn intersects_aabb(&self, other: &Self) -> bool {
        let (min, max) = (self.min(), self.max());
        let (omin, omax) = (other.min(), other.max());

        min.x <= omax.x && max.x >= omin.x
            && min.y <= omax.y && max.y >= omin.y
            && min.z <= omax.z && max.z >= omin.z
    }

    /// Returns the closest surface point to `p` with the outward normal.
    ///
    /// Penetration is positive when `p` lies inside the box (the distance to
    /// the nearest face) and negative when it lies outside.
    pub fn closest_point(&self, p: Vector3) -> ContactInfo {
        let local = p - self.center;
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        let surface = self.center + clamped;

        let delta = local - clamped;
        let outside_dist = delta.length();

        if outside_dist > 0.0 {
            return ContactInfo {
                point: surface,
                normal: delta.normalize(),
                penetration: -outside_dist,
            };
        }

        // Inside: push out along the nearest face
        let depths = self.half_extents - local.abs();
        let (normal, penetration) = if depths.x <= depths.y && depths.x <= depths.z {
            (Vector3::new(local.x.signum(), 0.0, 0.0), depths.x)
        } else if depths.y <= depths.x && depths.y <= depths.z {
            (Vector3::new(0.0, local.y.signum(), 0.0), depths.y)
        } else {
            (Vector3::new(0.0, 0.0, local.z.signum()), depths.z)
        };

        ContactInfo { point: surface, normal, penetration }
    }

    /// Returns the distance along the ray to the first intersection, if any.
    ///
    /// Slab method; an axis-parallel ray that starts outside the slab misses
    /// instead of dividing by zero.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        slab_intersect(ray.origin - self.center, ray.direction, self.half_extents)
    }

    /// Produces the world-space box for the given model matrix
    pub fn transformed(&self, model: &Matrix4) -> Aabb {
        let linear = model.linear();
        Aabb {
            center: linear.multiply_vector(self.center) + model.translation(),
            half_extents: linear.abs().multiply_vector(self.half_extents),
        }
    }
}

/// Shared slab test against a box centered at the origin
pub(crate) fn slab_intersect(origin: Vector3, direction: Vector3, half_extents: Vector3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis];

        if d.abs() < EPSILON {
            // Parallel to this slab: miss unless the origin lies within it
            if o.abs() > h {
                return None;
            }
            continue;
        }

        let t1 = (-h - o) / d;
        let t2 = (h - o) / d;
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }

    if t_far >= t_near.max(0.0) {
        Some(t_near.max(0.0))
    } else {
        None
    }
}
