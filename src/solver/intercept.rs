use crate::solver::Solver;
use crate::system::PhysicsSystem;

use log::{debug, warn};

/// Observation function polled each frame; the solve finishes when the
/// returned value drops to zero or below. `None` means the observed body is
/// gone and the solve must stop.
pub type Monitor = Box<dyn Fn(&PhysicsSystem) -> Option<f32> + Send>;

/// One-time initial-condition setup run on the first poll; returns false if
/// the body it targets no longer exists
pub type Setup = Box<dyn FnOnce(&PhysicsSystem) -> bool + Send>;

/// Forward-simulation solver for "when does this happen" problems.
///
/// It applies its initial conditions once, then lets the simulation run and
/// watches a monitor value each frame; the answer is the simulation time at
/// which the monitor first reports zero or below. An optional timeout bounds
/// the watch so a condition that never occurs cannot pin the solver forever.
pub struct InterceptSolver {
    setup: Option<Setup>,
    monitor: Monitor,
    timeout: Option<f32>,
}

impl InterceptSolver {
    /// Creates an intercept solver with no setup and no timeout
    pub fn new(monitor: Monitor) -> Self {
        Self { setup: None, monitor, timeout: None }
    }

    /// Sets the one-time initial-condition setup
    pub fn with_setup(mut self, setup: Setup) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Bounds the watch at the given simulation time
    pub fn with_timeout(mut self, timeout: f32) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Solver for InterceptSolver {
    fn step_frame(&mut self, system: &PhysicsSystem) -> bool {
        if let Some(setup) = self.setup.take() {
            if !setup(system) {
                warn!("intercept setup lost its body; stopping");
                return true;
            }
            return false;
        }

        if let Some(timeout) = self.timeout {
            if system.sim_time() > timeout {
                warn!("intercept watch timed out at t={}", system.sim_time());
                return true;
            }
        }

        match (self.monitor)(system) {
            None => {
                warn!("intercept monitor lost its body; stopping");
                true
            }
            Some(value) if value <= 0.0 => {
                debug!("intercept condition met at t={}", system.sim_time());
                true
            }
            Some(_) => false,
        }
    }
}
