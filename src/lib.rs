pub mod math;
pub mod collider;
pub mod body;
pub mod collision;
pub mod system;
pub mod solver;

/// Re-export common types for easier usage
pub use crate::body::{BodyId, BodyKind, PhysicsBody, Snapshot};
pub use crate::collider::{Collider, ContactInfo};
pub use crate::math::Vector3;
pub use crate::solver::{ProblemRouter, Solver, SolverDecision, SolverMode};
pub use crate::system::{PhysicsSystem, SimulationConfig};

/// Error types for the physics engine
pub mod error {
    use crate::body::BodyId;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Body not found: {0:?}")]
        BodyNotFound(BodyId),

        #[error("No solver available for unknown: {0}")]
        NoSolver(String),

        #[error("A solver is already in flight")]
        SolverBusy,
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
