use crate::body::{BodyId, PhysicsBody, Snapshot, GRAVITY_FORCE, NORMAL_FORCE};
use crate::collision;
use crate::error::PhysicsError;
use crate::math::Vector3;
use crate::solver::{ProblemRouter, Solver, SolverMode};
use crate::Result;

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// The fixed time step consumed by the simulation thread.
    ///
    /// Stepping in fixed increments keeps repeated solver evaluations
    /// numerically comparable; wall-clock time only feeds the accumulator.
    pub fixed_time_step: f32,

    /// Upper bound on accumulated wall-clock backlog, so a stalled thread
    /// does not spiral into an unbounded burst of catch-up steps
    pub max_step_backlog: f32,

    /// The global acceleration applied to every non-static body
    pub global_acceleration: Vector3,

    /// Initial simulation speed multiplier
    pub sim_speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: 1.0 / 240.0,
            max_step_backlog: 0.25,
            global_acceleration: Vector3::new(0.0, -9.81, 0.0),
            sim_speed: 1.0,
        }
    }
}

/// An f32 stored as atomic bits; tunables read with relaxed consistency
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// A vec3 of atomic f32 bits; components may tear relative to each other,
/// which is acceptable for the global tunables that use this
#[derive(Debug)]
struct AtomicVector3 {
    x: AtomicF32,
    y: AtomicF32,
    z: AtomicF32,
}

impl AtomicVector3 {
    fn new(v: Vector3) -> Self {
        Self {
            x: AtomicF32::new(v.x),
            y: AtomicF32::new(v.y),
            z: AtomicF32::new(v.z),
        }
    }

    fn load(&self) -> Vector3 {
        Vector3::new(self.x.load(), self.y.load(), self.z.load())
    }

    fn store(&self, v: Vector3) {
        self.x.store(v.x);
        self.y.store(v.y);
        self.z.store(v.z);
    }
}

/// Double-buffered per-body snapshots consumed by the render side
#[derive(Debug, Default)]
struct SnapshotBuffer {
    previous: Vec<Snapshot>,
    previous_time: f32,
    current: Vec<Snapshot>,
    current_time: f32,
}

/// The physics system: owns the body set, runs the stepping loop on a
/// dedicated thread, resolves collisions, publishes render snapshots and
/// drives at most one active solver.
pub struct PhysicsSystem {
    config: SimulationConfig,

    /// Handle to ourselves for handing an owning reference to the
    /// simulation thread
    self_ref: Weak<Self>,

    /// Registered bodies; this lock guards list mutation against the
    /// iterating step loop and is distinct from the per-body locks
    bodies: RwLock<Vec<Arc<PhysicsBody>>>,
    next_body_id: AtomicU32,

    global_acceleration: AtomicVector3,
    sim_speed: AtomicF32,
    sim_time: AtomicF32,

    enabled: AtomicBool,
    running: AtomicBool,
    thread: Mutex<Option<JoinHandle<()>>>,

    /// Guarded separately from body state so the renderer never contends
    /// with the simulation writer for more than a short copy
    snapshots: Mutex<SnapshotBuffer>,

    router: ProblemRouter,
    active_solver: Mutex<Option<Box<dyn Solver>>>,
}

impl PhysicsSystem {
    /// Creates a new physics system with default settings
    pub fn new() -> Arc<Self> {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics system with the given configuration
    pub fn with_config(config: SimulationConfig) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            global_acceleration: AtomicVector3::new(config.global_acceleration),
            sim_speed: AtomicF32::new(config.sim_speed),
            sim_time: AtomicF32::new(0.0),
            config,
            bodies: RwLock::new(Vec::new()),
            next_body_id: AtomicU32::new(1),
            enabled: AtomicBool::new(false),
            running: AtomicBool::new(false),
            thread: Mutex::new(None),
            snapshots: Mutex::new(SnapshotBuffer::default()),
            router: ProblemRouter::new(),
            active_solver: Mutex::new(None),
        })
    }

    /// Registers a body, assigns its stable id and seeds the system-managed
    /// forces so the first integration step already sees gravity
    pub fn add_body(&self, mut body: PhysicsBody) -> Arc<PhysicsBody> {
        let id = BodyId(self.next_body_id.fetch_add(1, Ordering::Relaxed));
        body.assign_id(id);

        {
            let mut state = body.lock();
            let gravity = self.global_acceleration.load() * state.mass();
            state.set_force(GRAVITY_FORCE, gravity);
            state.set_force(NORMAL_FORCE, Vector3::zero());
            state.mark_baseline();
        }

        let body = Arc::new(body);
        self.bodies
            .write()
            .expect("bodies lock poisoned")
            .push(Arc::clone(&body));
        body
    }

    /// Deregisters a body.
    ///
    /// An in-flight solver that captured this body's id terminates on its
    /// next poll, since id resolution fails from then on.
    pub fn remove_body(&self, id: BodyId) -> Result<()> {
        let mut bodies = self.bodies.write().expect("bodies lock poisoned");
        let before = bodies.len();
        bodies.retain(|b| b.id() != id);

        if bodies.len() == before {
            return Err(PhysicsError::BodyNotFound(id));
        }
        Ok(())
    }

    /// Resolves a stable id to a live body
    pub fn body_by_id(&self, id: BodyId) -> Option<Arc<PhysicsBody>> {
        self.bodies
            .read()
            .expect("bodies lock poisoned")
            .iter()
            .find(|b| b.id() == id)
            .cloned()
    }

    /// Returns the number of registered bodies
    pub fn body_count(&self) -> usize {
        self.bodies.read().expect("bodies lock poisoned").len()
    }

    /// Returns the current global acceleration
    pub fn global_acceleration(&self) -> Vector3 {
        self.global_acceleration.load()
    }

    /// Sets the global acceleration; takes effect on the next step
    pub fn set_global_acceleration(&self, acceleration: Vector3) {
        self.global_acceleration.store(acceleration);
    }

    /// Returns the current simulation speed multiplier
    pub fn sim_speed(&self) -> f32 {
        self.sim_speed.load()
    }

    /// Sets the simulation speed multiplier; negative values are rejected
    pub fn set_sim_speed(&self, speed: f32) {
        if speed >= 0.0 {
            self.sim_speed.store(speed);
        }
    }

    /// Returns the current simulation time
    pub fn sim_time(&self) -> f32 {
        self.sim_time.load()
    }

    /// Resumes stepping on the simulation thread
    pub fn enable_physics(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Pauses stepping without tearing down the simulation thread
    pub fn disable_physics(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Returns whether stepping is currently enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Starts the dedicated simulation thread; idempotent
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        // Always succeeds while any caller still holds the system
        let Some(system) = self.self_ref.upgrade() else {
            self.running.store(false, Ordering::SeqCst);
            return;
        };
        let handle = thread::Builder::new()
            .name("physics-step".into())
            .spawn(move || system.run_loop())
            .expect("failed to spawn simulation thread");

        *self.thread.lock().expect("thread handle lock poisoned") = Some(handle);
    }

    /// Signals the simulation thread to exit
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Blocks until the simulation thread has exited
    pub fn wait_for_stop(&self) {
        let handle = self.thread.lock().expect("thread handle lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Simulation thread body: a fixed-step accumulator fed by wall-clock
    /// time scaled by the sim speed
    fn run_loop(&self) {
        let fixed = self.config.fixed_time_step;
        let mut accumulator = 0.0f32;
        let mut last = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let now = Instant::now();
            let elapsed = now.duration_since(last).as_secs_f32();
            last = now;

            if self.enabled.load(Ordering::SeqCst) {
                accumulator = (accumulator + elapsed * self.sim_speed()).min(self.config.max_step_backlog);
                while accumulator >= fixed {
                    self.step(fixed);
                    accumulator -= fixed;
                }
            } else {
                accumulator = 0.0;
            }

            thread::sleep(Duration::from_micros(500));
        }
    }

    /// Advances the simulation by one step: record frames, integrate,
    /// refresh system-managed forces, advance sim time, resolve collisions,
    /// publish render snapshots and poll the active solver once.
    pub fn step(&self, dt: f32) {
        let time = self.sim_time();
        let gravity = self.global_acceleration.load();

        {
            let bodies = self.bodies.read().expect("bodies lock poisoned");

            for body in bodies.iter() {
                let mut state = body.lock();
                if state.is_static() {
                    continue;
                }

                state.record_frame(time);
                state.step(dt);

                // Normal is re-installed by collision resolution below;
                // user-named forces persist unless overwritten
                state.set_force(NORMAL_FORCE, Vector3::zero());
                let weight = gravity * state.mass();
                state.set_force(GRAVITY_FORCE, weight);
            }

            self.sim_time.store(time + dt);

            // Single pass per unordered pair, in body-list order
            for i in 0..bodies.len() {
                for j in (i + 1)..bodies.len() {
                    if bodies[i].is_static() && bodies[j].is_static() {
                        continue;
                    }
                    collision::resolve_pair(&bodies[i], &bodies[j]);
                }
            }

            self.publish_snapshots(&bodies, time + dt);
        }

        self.poll_solver();
    }

    /// Rotates the double buffer and captures the post-step body states
    fn publish_snapshots(&self, bodies: &[Arc<PhysicsBody>], time: f32) {
        let mut buffer = self.snapshots.lock().expect("snapshot lock poisoned");
        let buffer = &mut *buffer;

        std::mem::swap(&mut buffer.previous, &mut buffer.current);
        buffer.previous_time = buffer.current_time;

        buffer.current.clear();
        for body in bodies {
            let state = body.lock();
            buffer.current.push(Snapshot {
                body: body.id(),
                time,
                position: state.position(),
                velocity: state.velocity(),
            });
        }
        buffer.current_time = time;
    }

    /// Returns per-body states interpolated between the two most recent
    /// published snapshot sets bracketing `render_time` (alpha clamped to
    /// [0, 1]); never blocks the simulation writer beyond the copy
    pub fn fetch_latest_snapshot(&self, render_time: f32) -> Vec<Snapshot> {
        let buffer = self.snapshots.lock().expect("snapshot lock poisoned");

        let span = buffer.current_time - buffer.previous_time;
        let alpha = if span > crate::math::EPSILON {
            ((render_time - buffer.previous_time) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };

        buffer
            .current
            .iter()
            .map(|current| {
                let previous = buffer
                    .previous
                    .iter()
                    .find(|p| p.body == current.body)
                    .unwrap_or(current);
                Snapshot {
                    body: current.body,
                    time: render_time,
                    position: previous.position.lerp(&current.position, alpha),
                    velocity: previous.velocity.lerp(&current.velocity, alpha),
                }
            })
            .collect()
    }

    /// Restores every registered body to its recorded baseline and zeroes
    /// the simulation time.
    ///
    /// Called at the start of every solver evaluation so each one begins
    /// from identical initial conditions.
    pub fn reset(&self) {
        let gravity = self.global_acceleration.load();
        let bodies = self.bodies.read().expect("bodies lock poisoned");

        for body in bodies.iter() {
            body.lock().reset_to_baseline(gravity);
        }
        self.sim_time.store(0.0);

        // Publish twice so both buffers hold the baseline at t = 0 and
        // render consumers never interpolate across the reset
        self.publish_snapshots(&bodies, 0.0);
        self.publish_snapshots(&bodies, 0.0);
    }

    /// Routes a (knowns, unknown) problem for the given body.
    ///
    /// SIMULATE means plain continued stepping and installs nothing. SOLVE
    /// installs the constructed solver as the single active solver; while
    /// one is in flight further requests are rejected with `SolverBusy`.
    pub fn solve_problem(
        &self,
        body: BodyId,
        knowns: &HashMap<String, f64>,
        unknown: &str,
    ) -> Result<SolverMode> {
        let mut active = self.active_solver.lock().expect("solver lock poisoned");
        if active.is_some() {
            return Err(PhysicsError::SolverBusy);
        }

        if self.body_by_id(body).is_none() {
            return Err(PhysicsError::BodyNotFound(body));
        }

        let decision = self.router.route_problem(body, knowns, unknown);
        match decision.mode {
            SolverMode::Simulate => Ok(SolverMode::Simulate),
            SolverMode::Solve => {
                let Some(solver) = decision.solver else {
                    warn!("no registered solver matches unknown '{unknown}'");
                    return Err(PhysicsError::NoSolver(unknown.to_string()));
                };

                // Capture the baseline every evaluation resets back to
                let bodies = self.bodies.read().expect("bodies lock poisoned");
                for b in bodies.iter() {
                    b.lock().mark_baseline();
                }

                debug!("installing solver for unknown '{unknown}' on body {body:?}");
                *active = Some(solver);
                Ok(SolverMode::Solve)
            }
        }
    }

    /// Returns the required-knowns signatures registered for an unknown
    pub fn required_keys(&self, unknown: &str) -> Vec<Vec<String>> {
        self.router.required_keys(unknown)
    }

    /// Returns whether a solver is currently in flight
    pub fn is_solving(&self) -> bool {
        self.active_solver.lock().expect("solver lock poisoned").is_some()
    }

    /// Tears down an in-flight solve deterministically.
    ///
    /// Returns true if a solver was actually cancelled.
    pub fn cancel_solve(&self) -> bool {
        let mut active = self.active_solver.lock().expect("solver lock poisoned");
        if active.take().is_some() {
            debug!("active solve cancelled");
            true
        } else {
            false
        }
    }

    /// Polls the active solver once after a completed step; a true return
    /// detaches and discards it
    fn poll_solver(&self) {
        let mut active = self.active_solver.lock().expect("solver lock poisoned");
        if let Some(solver) = active.as_mut() {
            if solver.step_frame(self) {
                debug!("solver finished after sim time {}", self.sim_time());
                *active = None;
            }
        }
    }
}

impl Drop for PhysicsSystem {
    fn drop(&mut self) {
        self.stop();
        if let Ok(mut thread) = self.thread.lock() {
            if let Some(handle) = thread.take() {
                let _ = handle.join();
            }
        }
    }
}
