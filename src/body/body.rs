use crate::body::{BodyId, BodyKind, Snapshot};
use crate::collider::Collider;
use crate::math::{Matrix4, Vector3};

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Name of the system-managed gravity force entry
pub const GRAVITY_FORCE: &str = "Gravity";

/// Name of the system-managed resting contact force entry
pub const NORMAL_FORCE: &str = "Normal";

/// The kinematic state of a body, guarded by the body's mutex.
///
/// All operations on this type assume exclusive access; callers either go
/// through the locking accessors on [`PhysicsBody`] or hold the guard from
/// [`PhysicsBody::lock`] for batched multi-field mutation.
#[derive(Debug)]
pub struct BodyState {
    id: BodyId,
    position: Vector3,
    velocity: Vector3,
    mass: f32,
    is_static: bool,

    /// Sum of the named force map plus any unnamed one-off contributions
    net_force: Vector3,
    forces: BTreeMap<String, Vector3>,

    world_transform: Matrix4,
    frames: Vec<Snapshot>,
    unknowns: HashSet<String>,
    collider: Option<Collider>,

    /// Pose restored by `PhysicsSystem::reset`
    baseline_position: Vector3,
    baseline_velocity: Vector3,
}

impl BodyState {
    fn new(position: Vector3, mass: f32, is_static: bool, collider: Option<Collider>) -> Self {
        Self {
            id: BodyId(0),
            position,
            velocity: Vector3::zero(),
            mass: mass.max(f32::MIN_POSITIVE),
            is_static,
            net_force: Vector3::zero(),
            forces: BTreeMap::new(),
            world_transform: Matrix4::from_translation(position),
            frames: Vec::new(),
            unknowns: HashSet::new(),
            collider,
            baseline_position: position,
            baseline_velocity: Vector3::zero(),
        }
    }

    /// Returns the body's position
    #[inline]
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Sets the body's position and keeps the world transform in sync
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.world_transform.data[0][3] = position.x;
        self.world_transform.data[1][3] = position.y;
        self.world_transform.data[2][3] = position.z;
    }

    /// Returns the body's velocity
    #[inline]
    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    /// Sets the body's velocity
    #[inline]
    pub fn set_velocity(&mut self, velocity: Vector3) {
        self.velocity = velocity;
    }

    /// Returns the body's mass
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Sets the body's mass; non-positive values are rejected and the
    /// previous mass is retained
    pub fn set_mass(&mut self, mass: f32) {
        if mass > 0.0 {
            self.mass = mass;
        }
    }

    /// Returns whether the body is static (never integrated or collided as a mover)
    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Sets whether the body is static
    #[inline]
    pub fn set_is_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    /// Returns the current net force on the body
    #[inline]
    pub fn net_force(&self) -> Vector3 {
        self.net_force
    }

    /// Returns the named force contribution, or zero for an unknown name
    pub fn force(&self, name: &str) -> Vector3 {
        self.forces.get(name).copied().unwrap_or(Vector3::ZERO)
    }

    /// Returns a copy of the named force map
    pub fn all_forces(&self) -> BTreeMap<String, Vector3> {
        self.forces.clone()
    }

    /// Sets a named force contribution and recomputes the net force.
    ///
    /// Recomputation drops any unnamed contributions previously added via
    /// `apply_force`; one-off impulses are expected to act within a step.
    pub fn set_force(&mut self, name: &str, force: Vector3) {
        self.forces.insert(name.to_string(), force);
        self.net_force = self.forces.values().fold(Vector3::zero(), |acc, f| acc + *f);
    }

    /// Adds an unnamed one-off force directly to the net-force accumulator
    pub fn apply_force(&mut self, force: Vector3) {
        self.net_force += force;
    }

    /// Applies an instantaneous impulse, changing velocity by `impulse / mass`
    pub fn apply_impulse(&mut self, impulse: Vector3) {
        self.velocity += impulse / self.mass;
    }

    /// Advances the body by one velocity-Verlet step.
    ///
    /// The net force is re-read after the position update so a force changed
    /// mid-step contributes to the averaged acceleration.
    pub fn step(&mut self, dt: f32) {
        let a0 = self.net_force / self.mass;
        let position_increment = self.velocity * dt + a0 * (0.5 * dt * dt);
        self.set_position(self.position + position_increment);

        let a1 = self.net_force / self.mass;
        self.velocity += (a0 + a1) * (0.5 * dt);
    }

    /// Appends the current state to the frame history at the given time
    pub fn record_frame(&mut self, time: f32) {
        self.frames.push(Snapshot {
            body: self.id,
            time,
            position: self.position,
            velocity: self.velocity,
        });
    }

    /// Restores position and velocity from a snapshot
    pub fn load_frame(&mut self, snapshot: &Snapshot) {
        self.set_position(snapshot.position);
        self.set_velocity(snapshot.velocity);
    }

    /// Returns a copy of the recorded frame history
    pub fn all_frames(&self) -> Vec<Snapshot> {
        self.frames.clone()
    }

    /// Returns the most recent recorded frame, if any
    pub fn last_frame(&self) -> Option<Snapshot> {
        self.frames.last().copied()
    }

    /// Clears the recorded frame history
    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    /// Returns the body's world transform
    #[inline]
    pub fn world_transform(&self) -> Matrix4 {
        self.world_transform
    }

    /// Sets the body's world transform and re-derives the position from it
    pub fn set_world_transform(&mut self, transform: Matrix4) {
        self.world_transform = transform;
        self.position = transform.translation();
    }

    /// Returns whether the named parameter is marked unknown
    pub fn is_unknown(&self, name: &str) -> bool {
        self.unknowns.contains(name)
    }

    /// Marks or unmarks a parameter name as unknown
    pub fn set_unknown(&mut self, name: &str, unknown: bool) {
        if unknown {
            self.unknowns.insert(name.to_string());
        } else {
            self.unknowns.remove(name);
        }
    }

    /// Returns the body's collider, if it has one
    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    /// Returns the collider transformed into world space, if the body has one
    pub fn world_collider(&self) -> Option<Collider> {
        self.collider.as_ref().map(|c| c.transformed(&self.world_transform))
    }

    /// Captures the current pose and velocity as the reset baseline
    pub fn mark_baseline(&mut self) {
        self.baseline_position = self.position;
        self.baseline_velocity = self.velocity;
    }

    /// Restores the reset baseline, clears frame history and re-seeds the
    /// system-managed forces for the given global acceleration
    pub fn reset_to_baseline(&mut self, global_acceleration: Vector3) {
        self.set_position(self.baseline_position);
        self.set_velocity(self.baseline_velocity);
        self.frames.clear();
        self.set_force(NORMAL_FORCE, Vector3::zero());
        let gravity = global_acceleration * self.mass;
        self.set_force(GRAVITY_FORCE, gravity);
    }

    pub(crate) fn assign_id(&mut self, id: BodyId) {
        self.id = id;
    }
}

/// A simulated body: a stable id, its kind and the lock-guarded state.
///
/// The accessors on this type lock internally; callers that need batched
/// multi-field mutation (a solver resetting position and velocity together)
/// hold the guard from [`lock`](Self::lock) and use [`BodyState`] directly.
#[derive(Debug)]
pub struct PhysicsBody {
    id: BodyId,
    kind: BodyKind,
    state: Mutex<BodyState>,
}

impl PhysicsBody {
    /// Creates a point mass with the given mass and position
    pub fn point_mass(mass: f32, position: Vector3) -> Self {
        Self {
            id: BodyId(0),
            kind: BodyKind::PointMass,
            state: Mutex::new(BodyState::new(position, mass, false, None)),
        }
    }

    /// Creates a rigid body with the given mass, position and collider
    pub fn rigid_body(mass: f32, position: Vector3, collider: Collider) -> Self {
        Self {
            id: BodyId(0),
            kind: BodyKind::RigidBody,
            state: Mutex::new(BodyState::new(position, mass, false, Some(collider))),
        }
    }

    /// Creates a static rigid body; static bodies do not need a mass
    pub fn static_rigid_body(position: Vector3, collider: Collider) -> Self {
        Self {
            id: BodyId(0),
            kind: BodyKind::RigidBody,
            state: Mutex::new(BodyState::new(position, 1.0, true, Some(collider))),
        }
    }

    /// Returns the body's stable id
    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Returns the body's kind
    #[inline]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Acquires the body's state lock for batched access
    pub fn lock(&self) -> MutexGuard<'_, BodyState> {
        self.state.lock().expect("body state lock poisoned")
    }

    /// Returns the body's position
    pub fn position(&self) -> Vector3 {
        self.lock().position()
    }

    /// Sets the body's position
    pub fn set_position(&self, position: Vector3) {
        self.lock().set_position(position);
    }

    /// Returns the body's velocity
    pub fn velocity(&self) -> Vector3 {
        self.lock().velocity()
    }

    /// Sets the body's velocity
    pub fn set_velocity(&self, velocity: Vector3) {
        self.lock().set_velocity(velocity);
    }

    /// Returns the body's mass
    pub fn mass(&self) -> f32 {
        self.lock().mass()
    }

    /// Sets the body's mass; non-positive values are rejected
    pub fn set_mass(&self, mass: f32) {
        self.lock().set_mass(mass);
    }

    /// Returns whether the body is static
    pub fn is_static(&self) -> bool {
        self.lock().is_static()
    }

    /// Sets whether the body is static
    pub fn set_is_static(&self, is_static: bool) {
        self.lock().set_is_static(is_static);
    }

    /// Returns the current net force
    pub fn net_force(&self) -> Vector3 {
        self.lock().net_force()
    }

    /// Returns the named force contribution, or zero for an unknown name
    pub fn force(&self, name: &str) -> Vector3 {
        self.lock().force(name)
    }

    /// Returns a copy of the named force map
    pub fn all_forces(&self) -> BTreeMap<String, Vector3> {
        self.lock().all_forces()
    }

    /// Sets a named force contribution
    pub fn set_force(&self, name: &str, force: Vector3) {
        self.lock().set_force(name, force);
    }

    /// Adds an unnamed one-off force to the net-force accumulator
    pub fn apply_force(&self, force: Vector3) {
        self.lock().apply_force(force);
    }

    /// Returns the body's world transform
    pub fn world_transform(&self) -> Matrix4 {
        self.lock().world_transform()
    }

    /// Sets the body's world transform
    pub fn set_world_transform(&self, transform: Matrix4) {
        self.lock().set_world_transform(transform);
    }

    /// Returns a copy of the recorded frame history
    pub fn all_frames(&self) -> Vec<Snapshot> {
        self.lock().all_frames()
    }

    /// Clears the recorded frame history
    pub fn clear_frames(&self) {
        self.lock().clear_frames();
    }

    /// Returns whether the named parameter is marked unknown
    pub fn is_unknown(&self, name: &str) -> bool {
        self.lock().is_unknown(name)
    }

    /// Marks or unmarks a parameter name as unknown
    pub fn set_unknown(&self, name: &str, unknown: bool) {
        self.lock().set_unknown(name, unknown);
    }

    pub(crate) fn assign_id(&mut self, id: BodyId) {
        self.id = id;
        self.state.get_mut().expect("body state lock poisoned").assign_id(id);
    }
}
