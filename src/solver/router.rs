use crate::body::BodyId;
use crate::math::Vector3;
use crate::solver::{InterceptSolver, ScalarRootSolver, Solver, SolverMode, VectorRootSolver};
use crate::system::PhysicsSystem;

use log::debug;
use std::collections::HashMap;

/// Convergence tolerance shared by the built-in trajectory solvers
const POSITION_TOLERANCE: f32 = 1.0e-3;

/// Intercept watches give up after this much simulated time
const INTERCEPT_TIMEOUT: f32 = 60.0;

/// Speed under which a body counts as at rest, ending a sub-simulation early
const REST_SPEED: f32 = 1.0e-3;

/// Builds a solver for one body from the known problem parameters; `None`
/// when a required key is missing despite the signature check
type SolverFactory = fn(BodyId, &HashMap<String, f64>) -> Option<Box<dyn Solver>>;

/// One registered way of solving for an unknown
pub struct SolverEntry {
    required_keys: Vec<&'static str>,
    factory: SolverFactory,
}

/// The routing outcome for one problem
pub struct SolverDecision {
    /// Whether the problem needs a solver at all
    pub mode: SolverMode,

    /// The constructed solver for `SolverMode::Solve`; `None` when no
    /// registered entry matches the supplied knowns
    pub solver: Option<Box<dyn Solver>>,
}

/// Maps an unknown name plus a set of known parameters to a solver.
///
/// Entries for the same unknown are tried in registration order; the first
/// one whose required keys are all present wins. Problems whose initial
/// state is fully known short-circuit to plain simulation.
pub struct ProblemRouter {
    entries: HashMap<String, Vec<SolverEntry>>,
}

impl ProblemRouter {
    /// Creates a router with the built-in trajectory solvers registered
    pub fn new() -> Self {
        let mut router = Self { entries: HashMap::new() };

        router.register(
            "v0",
            vec!["r0_x", "r0_y", "r0_z", "rT_x", "rT_y", "rT_z", "T"],
            make_launch_velocity_solver,
        );
        router.register(
            "T",
            vec!["r0_x", "r0_y", "r0_z", "v0_x", "v0_y", "v0_z", "rT_x", "rT_y", "rT_z"],
            make_intercept_time_solver,
        );
        router.register("v0_y", vec!["r0_y", "rT_y", "T"], make_vertical_speed_solver);

        router
    }

    /// Registers a solver entry for an unknown
    pub fn register(&mut self, unknown: &str, required_keys: Vec<&'static str>, factory: SolverFactory) {
        self.entries
            .entry(unknown.to_string())
            .or_default()
            .push(SolverEntry { required_keys, factory });
    }

    /// Routes one problem for the given body.
    ///
    /// The aggregate `r0` and `v0` keys flag a fully known initial state;
    /// when both are present, plain continued stepping answers the question
    /// and no solver is needed, regardless of the requested unknown.
    pub fn route_problem(
        &self,
        body: BodyId,
        knowns: &HashMap<String, f64>,
        unknown: &str,
    ) -> SolverDecision {
        if knowns.contains_key("r0") && knowns.contains_key("v0") {
            debug!("initial state fully known; simulating for body {body:?}");
            return SolverDecision { mode: SolverMode::Simulate, solver: None };
        }

        let solver = self
            .entries
            .get(unknown)
            .into_iter()
            .flatten()
            .find(|entry| entry.required_keys.iter().all(|k| knowns.contains_key(*k)))
            .and_then(|entry| (entry.factory)(body, knowns));

        SolverDecision { mode: SolverMode::Solve, solver }
    }

    /// Returns the required-knowns signature of every entry registered for
    /// an unknown
    pub fn required_keys(&self, unknown: &str) -> Vec<Vec<String>> {
        self.entries
            .get(unknown)
            .into_iter()
            .flatten()
            .map(|entry| entry.required_keys.iter().map(|k| k.to_string()).collect())
            .collect()
    }
}

impl Default for ProblemRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn key(knowns: &HashMap<String, f64>, name: &str) -> Option<f32> {
    knowns.get(name).map(|v| *v as f32)
}

fn vector_key(knowns: &HashMap<String, f64>, prefix: &str) -> Option<Vector3> {
    Some(Vector3::new(
        key(knowns, &format!("{prefix}_x"))?,
        key(knowns, &format!("{prefix}_y"))?,
        key(knowns, &format!("{prefix}_z"))?,
    ))
}

/// Unknown launch velocity `v0`: damped Newton over the three velocity
/// components, each residual evaluation one sub-simulation of duration `T`
fn make_launch_velocity_solver(
    body: BodyId,
    knowns: &HashMap<String, f64>,
) -> Option<Box<dyn Solver>> {
    let start = vector_key(knowns, "r0")?;
    let target = vector_key(knowns, "rT")?;
    let duration = key(knowns, "T")?;
    if duration <= 0.0 {
        return None;
    }

    let set_guess = Box::new(move |system: &PhysicsSystem, guess: Vector3| {
        let Some(b) = system.body_by_id(body) else {
            return false;
        };
        system.reset();
        let mut state = b.lock();
        state.set_position(start);
        state.set_velocity(guess);
        true
    });
    let stop = Box::new(move |system: &PhysicsSystem| {
        let b = system.body_by_id(body)?;
        Some(system.sim_time() >= duration || b.velocity().length() < REST_SPEED)
    });
    let extract = Box::new(move |system: &PhysicsSystem| {
        system.body_by_id(body).map(|b| b.position())
    });

    // Straight-line guess; gravity correction is the Newton iteration's job
    let initial_guess = (target - start) / duration;
    let mut solver = VectorRootSolver::new(set_guess, stop, extract, target, initial_guess);
    solver.set_tolerance(POSITION_TOLERANCE);
    Some(Box::new(solver))
}

/// Unknown flight time `T`: run the fully specified trajectory forward and
/// watch for closest approach to the target point
fn make_intercept_time_solver(
    body: BodyId,
    knowns: &HashMap<String, f64>,
) -> Option<Box<dyn Solver>> {
    let start = vector_key(knowns, "r0")?;
    let velocity = vector_key(knowns, "v0")?;
    let target = vector_key(knowns, "rT")?;

    let setup = Box::new(move |system: &PhysicsSystem| {
        let Some(b) = system.body_by_id(body) else {
            return false;
        };
        system.reset();
        let mut state = b.lock();
        state.set_position(start);
        state.set_velocity(velocity);
        true
    });

    // Positive while closing on the target; zero or below at closest
    // approach or on arrival
    let monitor = Box::new(move |system: &PhysicsSystem| {
        let b = system.body_by_id(body)?;
        let state = b.lock();
        let to_target = target - state.position();
        let distance = to_target.length();
        if distance < POSITION_TOLERANCE {
            return Some(-1.0);
        }
        Some(state.velocity().dot(&(to_target / distance)))
    });

    Some(Box::new(
        InterceptSolver::new(monitor)
            .with_setup(setup)
            .with_timeout(INTERCEPT_TIMEOUT),
    ))
}

/// Unknown vertical launch speed `v0_y`: one-dimensional bracketing and
/// bisection on the altitude reached at time `T`
fn make_vertical_speed_solver(
    body: BodyId,
    knowns: &HashMap<String, f64>,
) -> Option<Box<dyn Solver>> {
    let start_y = key(knowns, "r0_y")?;
    let target_y = key(knowns, "rT_y")?;
    let duration = key(knowns, "T")?;
    if duration <= 0.0 {
        return None;
    }

    let set_guess = Box::new(move |system: &PhysicsSystem, guess: f32| {
        let Some(b) = system.body_by_id(body) else {
            return false;
        };
        system.reset();
        let mut state = b.lock();
        let mut position = state.position();
        position.y = start_y;
        state.set_position(position);
        let mut velocity = state.velocity();
        velocity.y = guess;
        state.set_velocity(velocity);
        true
    });
    let stop = Box::new(move |system: &PhysicsSystem| {
        system.body_by_id(body)?;
        Some(system.sim_time() >= duration)
    });
    let extract = Box::new(move |system: &PhysicsSystem| {
        system.body_by_id(body).map(|b| b.position().y)
    });

    let initial_guess = (target_y - start_y) / duration;
    let mut solver = ScalarRootSolver::new(set_guess, stop, extract, target_y, initial_guess);
    solver.set_tolerance(POSITION_TOLERANCE);
    Some(Box::new(solver))
}
