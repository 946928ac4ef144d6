mod body;

pub use body::{BodyState, PhysicsBody, GRAVITY_FORCE, NORMAL_FORCE};

use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A unique identifier for a body registered with the physics system.
///
/// Ids are assigned at registration and never reused while the body is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    /// Returns the raw id value
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// The concrete kind of a physics body, used for collision pair dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// A dimensionless particle with mass
    PointMass,

    /// A body with collision geometry
    RigidBody,
}

/// An immutable record of one body's kinematic state at one simulated instant
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Snapshot {
    /// The body this snapshot belongs to
    pub body: BodyId,

    /// Simulation time at which the snapshot was recorded
    pub time: f32,

    /// Position at that instant
    pub position: Vector3,

    /// Velocity at that instant
    pub velocity: Vector3,
}
