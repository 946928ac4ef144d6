//! Pairwise collision testing and single-pass resolution.
//!
//! Dispatch is keyed on the `(BodyKind, BodyKind)` pair rather than virtual
//! methods, so adding a body kind extends one match instead of a method
//! matrix. RigidBody/RigidBody is an open extension point and always reports
//! no collision.

use crate::body::{BodyKind, PhysicsBody, NORMAL_FORCE};
use crate::math::{Vector3, EPSILON};

/// Proximity threshold below which two point masses are in contact
pub const CONTACT_THRESHOLD: f32 = 0.01;

/// Tests one unordered body pair and resolves the collision on a hit.
///
/// Returns true iff a collision was resolved. "No contact" and "separating
/// velocity" are normal false outcomes, not errors.
pub fn resolve_pair(a: &PhysicsBody, b: &PhysicsBody) -> bool {
    match (a.kind(), b.kind()) {
        (BodyKind::PointMass, BodyKind::PointMass) => resolve_point_point(a, b),
        (BodyKind::RigidBody, BodyKind::PointMass) => resolve_box_point(a, b),
        (BodyKind::PointMass, BodyKind::RigidBody) => resolve_box_point(b, a),
        (BodyKind::RigidBody, BodyKind::RigidBody) => false,
    }
}

/// Elastic impulse exchange between two point masses within the contact
/// threshold.
fn resolve_point_point(a: &PhysicsBody, b: &PhysicsBody) -> bool {
    // Lock order by id keeps the two-lock acquisition consistent
    let (first, second) = if a.id() <= b.id() { (a, b) } else { (b, a) };
    let mut state_a = first.lock();
    let mut state_b = second.lock();

    let separation = state_b.position() - state_a.position();
    let distance = separation.length();
    if distance > CONTACT_THRESHOLD || distance < EPSILON {
        return false;
    }

    let normal = separation / distance;
    let relative = state_a.velocity() - state_b.velocity();
    let approach = relative.dot(&normal);
    if approach <= 0.0 {
        // Moving apart or resting
        return false;
    }

    let (mass_a, mass_b) = (state_a.mass(), state_b.mass());
    let reduced_mass = match (state_a.is_static(), state_b.is_static()) {
        (true, true) => return false,
        (true, false) => mass_b,
        (false, true) => mass_a,
        (false, false) => mass_a * mass_b / (mass_a + mass_b),
    };

    // Fully elastic exchange along the separation normal
    let restitution = 1.0;
    let impulse = (1.0 + restitution) * reduced_mass * approach;

    if !state_a.is_static() {
        state_a.apply_impulse(normal * -impulse);
    }
    if !state_b.is_static() {
        state_b.apply_impulse(normal * impulse);
    }

    true
}

/// Resolves a point mass against a rigid body's collider: clamps the point
/// out along the contact normal, kills the inward velocity component and
/// installs a persistent Normal force so gravity is balanced on the next
/// step (approximate resting contact).
fn resolve_box_point(rigid: &PhysicsBody, point: &PhysicsBody) -> bool {
    let rigid_state = rigid.lock();
    let Some(collider) = rigid_state.world_collider() else {
        return false;
    };
    drop(rigid_state);

    let mut state = point.lock();
    let contact = collider.closest_point(state.position());
    if contact.penetration < 0.0 {
        // No overlap
        return false;
    }

    let inward = state.velocity().dot(&contact.normal);
    if inward >= 0.0 {
        // Moving apart or resting
        return false;
    }

    // Inelastic along the contact normal
    let restitution = 0.0;
    let impulse = -(1.0 + restitution) * inward * state.mass();
    state.apply_impulse(contact.normal * impulse);

    // Balance only the force component pressing into the surface so the
    // next step does not re-penetrate; an outward driving force gets no
    // counter-force and lets the body leave
    let driving = state
        .all_forces()
        .iter()
        .filter(|(name, _)| name.as_str() != NORMAL_FORCE)
        .fold(Vector3::zero(), |acc, (_, f)| acc + *f);
    let inward_magnitude = (-driving.dot(&contact.normal)).max(0.0);
    state.set_force(NORMAL_FORCE, contact.normal * inward_magnitude);

    let pushed = state.position() + contact.normal * contact.penetration;
    state.set_position(pushed);

    true
}

/// Tests one unordered body pair without resolving it
pub fn test_pair(a: &PhysicsBody, b: &PhysicsBody) -> bool {
    match (a.kind(), b.kind()) {
        (BodyKind::PointMass, BodyKind::PointMass) => {
            let distance = a.position().distance(&b.position());
            distance <= CONTACT_THRESHOLD
        }
        (BodyKind::RigidBody, BodyKind::PointMass) => box_contains_point(a, b),
        (BodyKind::PointMass, BodyKind::RigidBody) => box_contains_point(b, a),
        (BodyKind::RigidBody, BodyKind::RigidBody) => false,
    }
}

fn box_contains_point(rigid: &PhysicsBody, point: &PhysicsBody) -> bool {
    let state = rigid.lock();
    let Some(collider) = state.world_collider() else {
        return false;
    };
    drop(state);

    collider.contains(point.position())
}
