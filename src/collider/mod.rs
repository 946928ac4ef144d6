mod aabb;
mod oriented_box;

pub use aabb::Aabb;
pub use oriented_box::OrientedBox;

use crate::math::{Matrix4, Ray, Vector3};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Result of a closest-point query against a collider surface
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ContactInfo {
    /// The closest point on the collider surface in world space
    pub point: Vector3,

    /// The outward surface normal at the contact point
    pub normal: Vector3,

    /// Penetration depth, positive when the query point is inside the collider
    pub penetration: f32,
}

/// Local-space collision geometry owned by a rigid body.
///
/// Colliders are value-like and never mutated in place; `transformed` produces
/// a world-space copy for the current model matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Collider {
    Aabb(Aabb),
    OrientedBox(OrientedBox),
}

impl Collider {
    /// Returns true if the point is inside the collider
    pub fn contains(&self, p: Vector3) -> bool {
        match self {
            Collider::Aabb(aabb) => aabb.contains(p),
            Collider::OrientedBox(obb) => obb.contains(p),
        }
    }

    /// Returns the closest surface point, normal and penetration for a query point
    pub fn closest_point(&self, p: Vector3) -> ContactInfo {
        match self {
            Collider::Aabb(aabb) => aabb.closest_point(p),
            Collider::OrientedBox(obb) => obb.closest_point(p),
        }
    }

    /// Returns the distance along the ray to the first intersection, if any
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        match self {
            Collider::Aabb(aabb) => aabb.intersect_ray(ray),
            Collider::OrientedBox(obb) => obb.intersect_ray(ray),
        }
    }

    /// Produces a new collider transformed by the given model matrix
    pub fn transformed(&self, model: &Matrix4) -> Collider {
        match self {
            Collider::Aabb(aabb) => Collider::Aabb(aabb.transformed(model)),
            Collider::OrientedBox(obb) => Collider::OrientedBox(obb.transformed(model)),
        }
    }
}

impl From<Aabb> for Collider {
    fn from(aabb: Aabb) -> Self {
        Collider::Aabb(aabb)
    }
}

impl From<OrientedBox> for Collider {
    fn from(obb: OrientedBox) -> Self {
        Collider::OrientedBox(obb)
    }
}
