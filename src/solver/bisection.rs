use crate::solver::Solver;
use crate::system::PhysicsSystem;

use log::{debug, warn};

/// Applies a candidate scalar guess and restarts the sub-simulation; returns
/// false if the targeted body no longer exists
pub type SetScalarGuess = Box<dyn FnMut(&PhysicsSystem, f32) -> bool + Send>;

/// Reports whether the current sub-simulation has run to completion; `None`
/// means the targeted body is gone
pub type StopCondition = Box<dyn Fn(&PhysicsSystem) -> Option<bool> + Send>;

/// Reads the scalar outcome of a completed sub-simulation
pub type ExtractScalar = Box<dyn Fn(&PhysicsSystem) -> Option<f32> + Send>;

/// Interval width below which bisection stops refining
const BRACKET_EPSILON: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Low,
    High,
    Mid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Wait(Slot),
}

/// Root finder for a single scalar unknown.
///
/// Starting from the initial guess, the bracket ends alternately step
/// outward with a doubling stride until the residual changes sign, then the
/// bracket is narrowed by bisection. Each residual evaluation is one full
/// sub-simulation.
pub struct ScalarRootSolver {
    set_guess: SetScalarGuess,
    stop: StopCondition,
    extract: ExtractScalar,

    target: f32,
    tolerance: f32,
    max_evaluations: u32,

    low: f32,
    high: f32,
    f_low: f32,
    f_high: f32,
    delta: f32,
    move_low_next: bool,
    have_high: bool,

    evaluations: u32,
    phase: Phase,
}

impl ScalarRootSolver {
    /// Creates a solver seeking `target` starting from `initial_guess`
    pub fn new(
        set_guess: SetScalarGuess,
        stop: StopCondition,
        extract: ExtractScalar,
        target: f32,
        initial_guess: f32,
    ) -> Self {
        Self {
            set_guess,
            stop,
            extract,
            target,
            tolerance: 1.0e-3,
            max_evaluations: 64,
            low: initial_guess,
            high: initial_guess,
            f_low: 0.0,
            f_high: 0.0,
            delta: 0.5,
            move_low_next: true,
            have_high: false,
            evaluations: 0,
            phase: Phase::Start,
        }
    }

    /// Sets the convergence tolerance on the residual magnitude
    pub fn set_tolerance(&mut self, tolerance: f32) {
        if tolerance > 0.0 {
            self.tolerance = tolerance;
        }
    }

    /// Sets the hard cap on residual evaluations
    pub fn set_max_evaluations(&mut self, max_evaluations: u32) {
        self.max_evaluations = max_evaluations;
    }

    /// Launches the sub-simulation evaluating `guess` for the given bracket
    /// slot; returns true if the solve must terminate instead
    fn launch(&mut self, system: &PhysicsSystem, guess: f32, slot: Slot) -> bool {
        self.evaluations += 1;
        if self.evaluations > self.max_evaluations {
            warn!(
                "scalar root hit the evaluation cap ({}) on bracket [{}, {}]",
                self.max_evaluations, self.low, self.high
            );
            return true;
        }

        if !(self.set_guess)(system, guess) {
            warn!("scalar root lost its body; stopping");
            return true;
        }
        self.phase = Phase::Wait(slot);
        false
    }

    /// Steps one bracket end outward, alternating ends with a doubling
    /// stride, and launches its evaluation
    fn expand(&mut self, system: &PhysicsSystem) -> bool {
        if self.move_low_next {
            self.low -= self.delta;
            self.delta *= 2.0;
            self.move_low_next = false;
            self.launch(system, self.low, Slot::Low)
        } else {
            self.high += self.delta;
            self.delta *= 2.0;
            self.move_low_next = true;
            self.launch(system, self.high, Slot::High)
        }
    }

    /// Dispatches a completed residual evaluation
    fn on_residual(&mut self, system: &PhysicsSystem, slot: Slot, residual: f32) -> bool {
        if residual.abs() < self.tolerance {
            debug!(
                "scalar root converged after {} evaluations (residual {residual})",
                self.evaluations
            );
            return true;
        }

        match slot {
            Slot::Low => {
                self.f_low = residual;
                if !self.have_high {
                    self.have_high = true;
                    self.high = self.low + self.delta;
                    return self.launch(system, self.high, Slot::High);
                }
            }
            Slot::High => self.f_high = residual,
            Slot::Mid => {
                let mid = 0.5 * (self.low + self.high);
                if self.f_low * residual < 0.0 {
                    self.high = mid;
                    self.f_high = residual;
                } else {
                    self.low = mid;
                    self.f_low = residual;
                }

                if (self.high - self.low).abs() < BRACKET_EPSILON {
                    debug!(
                        "scalar root bracket collapsed at {} (residual {residual})",
                        0.5 * (self.low + self.high)
                    );
                    return true;
                }
                let next = 0.5 * (self.low + self.high);
                return self.launch(system, next, Slot::Mid);
            }
        }

        if self.f_low * self.f_high <= 0.0 {
            let mid = 0.5 * (self.low + self.high);
            self.launch(system, mid, Slot::Mid)
        } else {
            self.expand(system)
        }
    }
}

impl Solver for ScalarRootSolver {
    fn step_frame(&mut self, system: &PhysicsSystem) -> bool {
        match self.phase {
            Phase::Start => self.launch(system, self.low, Slot::Low),
            Phase::Wait(slot) => match (self.stop)(system) {
                None => {
                    warn!("scalar root lost its body; stopping");
                    true
                }
                Some(false) => false,
                Some(true) => {
                    let Some(outcome) = (self.extract)(system) else {
                        warn!("scalar root lost its body; stopping");
                        return true;
                    };
                    self.on_residual(system, slot, outcome - self.target)
                }
            },
        }
    }
}
