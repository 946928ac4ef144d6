//! Online inverse-problem solvers.
//!
//! A solver is installed into the physics system and polled once after every
//! completed simulation step, so a solve spreads across frames instead of
//! blocking the stepping thread. Solvers capture body ids, never body
//! references, and re-resolve them on every poll; a body removed mid-solve
//! terminates the solve on its next poll.

mod bisection;
mod intercept;
mod newton;
mod router;

pub use bisection::ScalarRootSolver;
pub use intercept::InterceptSolver;
pub use newton::VectorRootSolver;
pub use router::{ProblemRouter, SolverDecision, SolverEntry};

use crate::system::PhysicsSystem;

/// How a routed problem is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMode {
    /// The initial state is fully known; plain continued stepping answers
    /// the question and no solver is installed
    Simulate,

    /// An unknown must be recovered by a dedicated solver
    Solve,
}

/// A resumable solver driven by the simulation loop.
///
/// `step_frame` is called once after each completed step; returning true
/// detaches the solver. Implementations own all solve state and must make
/// progress without blocking.
pub trait Solver: Send {
    /// Advances the solve by one poll; returns true when finished
    fn step_frame(&mut self, system: &PhysicsSystem) -> bool;
}
