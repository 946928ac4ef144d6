use crate::math::{Matrix3, Vector3};
use crate::solver::Solver;
use crate::system::PhysicsSystem;

use log::{debug, warn};

/// Determinant magnitude below which the Jacobian counts as singular
const SINGULAR_EPSILON: f32 = 1.0e-8;

/// Step fraction of the residual used when the Jacobian is singular
const GRADIENT_NUDGE: f32 = 0.01;

/// Applies a candidate guess and restarts the sub-simulation; returns false
/// if the targeted body no longer exists
pub type SetGuess = Box<dyn FnMut(&PhysicsSystem, Vector3) -> bool + Send>;

/// Reports whether the current sub-simulation has run to completion; `None`
/// means the targeted body is gone
pub type StopCondition = Box<dyn Fn(&PhysicsSystem) -> Option<bool> + Send>;

/// Reads the outcome of a completed sub-simulation
pub type Extract = Box<dyn Fn(&PhysicsSystem) -> Option<Vector3> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Apply the initial guess on the first poll
    Start,

    /// Sub-simulation for the unperturbed guess is running
    WaitBase,

    /// Sub-simulation for the guess perturbed along one axis is running
    WaitPerturbed(usize),
}

/// Damped Newton iteration over three unknowns, with the Jacobian estimated
/// by forward finite differences.
///
/// Each Newton iteration costs four full sub-simulations: one at the current
/// guess and one per perturbed component. The iteration converges when the
/// residual of the unperturbed run drops under the tolerance, so convergence
/// is detected one evaluation after the guess that achieved it.
pub struct VectorRootSolver {
    set_guess: SetGuess,
    stop: StopCondition,
    extract: Extract,

    target: Vector3,
    guess: Vector3,

    perturbation: f32,
    damping: f32,
    tolerance: f32,
    max_iterations: u32,

    iterations: u32,
    base: Vector3,
    perturbed: [Vector3; 3],
    phase: Phase,
}

impl VectorRootSolver {
    /// Creates a solver seeking `target` starting from `initial_guess`
    pub fn new(
        set_guess: SetGuess,
        stop: StopCondition,
        extract: Extract,
        target: Vector3,
        initial_guess: Vector3,
    ) -> Self {
        Self {
            set_guess,
            stop,
            extract,
            target,
            guess: initial_guess,
            perturbation: 0.01,
            damping: 1.0,
            tolerance: 1.0e-3,
            max_iterations: 30,
            iterations: 0,
            base: Vector3::zero(),
            perturbed: [Vector3::zero(); 3],
            phase: Phase::Start,
        }
    }

    /// Sets the finite-difference perturbation size
    pub fn set_perturbation(&mut self, perturbation: f32) {
        if perturbation > 0.0 {
            self.perturbation = perturbation;
        }
    }

    /// Sets the Newton damping factor
    pub fn set_damping(&mut self, damping: f32) {
        if damping > 0.0 {
            self.damping = damping;
        }
    }

    /// Sets the convergence tolerance on the residual norm
    pub fn set_tolerance(&mut self, tolerance: f32) {
        if tolerance > 0.0 {
            self.tolerance = tolerance;
        }
    }

    /// Sets the hard cap on Newton iterations
    pub fn set_max_iterations(&mut self, max_iterations: u32) {
        self.max_iterations = max_iterations;
    }

    /// Launches the sub-simulation for the guess perturbed along `axis`
    fn begin_perturbation(&mut self, system: &PhysicsSystem, axis: usize) -> bool {
        let perturbed = self.guess + Vector3::unit_axis(axis) * self.perturbation;
        if !(self.set_guess)(system, perturbed) {
            warn!("vector root lost its body; stopping");
            return true;
        }
        self.phase = Phase::WaitPerturbed(axis);
        false
    }

    /// Builds the finite-difference Jacobian, takes the damped Newton step
    /// and launches the sub-simulation for the updated guess
    fn apply_newton_update(&mut self, system: &PhysicsSystem) -> bool {
        let h = self.perturbation;
        let jacobian = Matrix3::from_columns(
            (self.perturbed[0] - self.base) / h,
            (self.perturbed[1] - self.base) / h,
            (self.perturbed[2] - self.base) / h,
        );

        let error = self.base - self.target;
        let determinant = jacobian.determinant();
        let delta = match jacobian.inverse() {
            Some(inverse) if determinant.abs() >= SINGULAR_EPSILON => {
                inverse.multiply_vector(error) * -self.damping
            }
            _ => {
                warn!("near-singular jacobian (det {determinant}); nudging along the residual");
                error * -GRADIENT_NUDGE
            }
        };

        self.guess += delta;
        debug!(
            "newton iteration {}: residual {} guess {}",
            self.iterations,
            error.length(),
            self.guess
        );

        if !(self.set_guess)(system, self.guess) {
            warn!("vector root lost its body; stopping");
            return true;
        }
        self.phase = Phase::WaitBase;
        false
    }
}

impl Solver for VectorRootSolver {
    fn step_frame(&mut self, system: &PhysicsSystem) -> bool {
        match self.phase {
            Phase::Start => {
                if !(self.set_guess)(system, self.guess) {
                    warn!("vector root lost its body; stopping");
                    return true;
                }
                self.phase = Phase::WaitBase;
                false
            }
            Phase::WaitBase => match (self.stop)(system) {
                None => {
                    warn!("vector root lost its body; stopping");
                    true
                }
                Some(false) => false,
                Some(true) => {
                    let Some(outcome) = (self.extract)(system) else {
                        warn!("vector root lost its body; stopping");
                        return true;
                    };
                    self.base = outcome;

                    let residual = (self.base - self.target).length();
                    if residual < self.tolerance {
                        debug!(
                            "vector root converged after {} iterations (residual {residual})",
                            self.iterations
                        );
                        return true;
                    }

                    self.iterations += 1;
                    if self.iterations > self.max_iterations {
                        warn!(
                            "vector root hit the iteration cap ({}) with residual {residual}",
                            self.max_iterations
                        );
                        return true;
                    }

                    self.begin_perturbation(system, 0)
                }
            },
            Phase::WaitPerturbed(axis) => match (self.stop)(system) {
                None => {
                    warn!("vector root lost its body; stopping");
                    true
                }
                Some(false) => false,
                Some(true) => {
                    let Some(outcome) = (self.extract)(system) else {
                        warn!("vector root lost its body; stopping");
                        return true;
                    };
                    self.perturbed[axis] = outcome;

                    if axis < 2 {
                        self.begin_perturbation(system, axis + 1)
                    } else {
                        self.apply_newton_update(system)
                    }
                }
            },
        }
    }
}
