use approx::assert_relative_eq;
use std::collections::HashMap;
use traj_engine::body::PhysicsBody;
use traj_engine::error::PhysicsError;
use traj_engine::math::Vector3;
use traj_engine::solver::{ProblemRouter, SolverMode};
use traj_engine::system::PhysicsSystem;

fn knowns(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Steps until the active solver detaches; returns false on the step cap
fn run_until_solved(system: &PhysicsSystem, dt: f32, max_steps: u32) -> bool {
    for _ in 0..max_steps {
        system.step(dt);
        if !system.is_solving() {
            return true;
        }
    }
    false
}

#[test]
fn test_routing_fully_known_state_simulates() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let router = ProblemRouter::new();
    let decision = router.route_problem(body.id(), &knowns(&[("r0", 0.0), ("v0", 0.0)]), "T");
    assert_eq!(decision.mode, SolverMode::Simulate);
    assert!(decision.solver.is_none());
}

#[test]
fn test_routing_matches_required_keys() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));
    let router = ProblemRouter::new();

    let full = knowns(&[
        ("r0_x", 0.0),
        ("r0_y", 0.0),
        ("r0_z", 0.0),
        ("rT_x", 1.0),
        ("rT_y", 2.0),
        ("rT_z", 3.0),
        ("T", 1.0),
    ]);
    let decision = router.route_problem(body.id(), &full, "v0");
    assert_eq!(decision.mode, SolverMode::Solve);
    assert!(decision.solver.is_some());

    // A missing required key means no solver can be built
    let mut partial = full.clone();
    partial.remove("T");
    let decision = router.route_problem(body.id(), &partial, "v0");
    assert_eq!(decision.mode, SolverMode::Solve);
    assert!(decision.solver.is_none());

    // Unregistered unknowns never match
    let decision = router.route_problem(body.id(), &full, "warp");
    assert!(decision.solver.is_none());
}

#[test]
fn test_required_keys_listing() {
    let router = ProblemRouter::new();

    let signatures = router.required_keys("v0");
    assert_eq!(signatures.len(), 1);
    assert!(signatures[0].contains(&"rT_x".to_string()));
    assert!(signatures[0].contains(&"T".to_string()));

    assert!(router.required_keys("warp").is_empty());
}

#[test]
fn test_launch_velocity_solve() {
    init_logs();
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let problem = knowns(&[
        ("r0_x", 0.0),
        ("r0_y", 0.0),
        ("r0_z", 0.0),
        ("rT_x", 3.0),
        ("rT_y", 4.0),
        ("rT_z", 5.0),
        ("T", 1.0),
    ]);
    let mode = system.solve_problem(body.id(), &problem, "v0").unwrap();
    assert_eq!(mode, SolverMode::Solve);
    assert!(system.is_solving());

    assert!(run_until_solved(&system, 0.01, 100_000));

    // At detachment the body sits at the end of the converged run
    let p = body.position();
    assert_relative_eq!(p.x, 3.0, epsilon = 1e-2);
    assert_relative_eq!(p.y, 4.0, epsilon = 1e-2);
    assert_relative_eq!(p.z, 5.0, epsilon = 1e-2);
}

#[test]
fn test_intercept_time_solve() {
    init_logs();
    let system = PhysicsSystem::new();
    system.set_global_acceleration(Vector3::zero());
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let problem = knowns(&[
        ("r0_x", 0.0),
        ("r0_y", 0.0),
        ("r0_z", 0.0),
        ("v0_x", 2.0),
        ("v0_y", 0.0),
        ("v0_z", 0.0),
        ("rT_x", 10.0),
        ("rT_y", 0.0),
        ("rT_z", 0.0),
    ]);
    let mode = system.solve_problem(body.id(), &problem, "T").unwrap();
    assert_eq!(mode, SolverMode::Solve);

    assert!(run_until_solved(&system, 0.01, 2_000));

    // Straight run at 2 m/s covers 10 m in 5 s
    assert_relative_eq!(system.sim_time(), 5.0, epsilon = 0.1);
}

#[test]
fn test_vertical_speed_solve() {
    init_logs();
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let problem = knowns(&[("r0_y", 0.0), ("rT_y", 10.0), ("T", 1.0)]);
    let mode = system.solve_problem(body.id(), &problem, "v0_y").unwrap();
    assert_eq!(mode, SolverMode::Solve);

    assert!(run_until_solved(&system, 0.01, 100_000));

    assert_relative_eq!(body.position().y, 10.0, epsilon = 2e-2);
}

#[test]
fn test_solver_busy_rejection() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let problem = knowns(&[
        ("r0_x", 0.0),
        ("r0_y", 0.0),
        ("r0_z", 0.0),
        ("rT_x", 1.0),
        ("rT_y", 1.0),
        ("rT_z", 1.0),
        ("T", 1.0),
    ]);
    system.solve_problem(body.id(), &problem, "v0").unwrap();

    let second = system.solve_problem(body.id(), &problem, "v0");
    assert!(matches!(second, Err(PhysicsError::SolverBusy)));
}

#[test]
fn test_cancel_solve() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let problem = knowns(&[
        ("r0_x", 0.0),
        ("r0_y", 0.0),
        ("r0_z", 0.0),
        ("rT_x", 1.0),
        ("rT_y", 1.0),
        ("rT_z", 1.0),
        ("T", 1.0),
    ]);
    system.solve_problem(body.id(), &problem, "v0").unwrap();
    system.step(0.01);
    assert!(system.is_solving());

    assert!(system.cancel_solve());
    assert!(!system.is_solving());
    assert!(!system.cancel_solve());

    // A new problem can be routed after cancellation
    assert!(system.solve_problem(body.id(), &problem, "v0").is_ok());
}

#[test]
fn test_body_removal_terminates_solve() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));
    let id = body.id();

    let problem = knowns(&[
        ("r0_x", 0.0),
        ("r0_y", 0.0),
        ("r0_z", 0.0),
        ("rT_x", 1.0),
        ("rT_y", 1.0),
        ("rT_z", 1.0),
        ("T", 1.0),
    ]);
    system.solve_problem(id, &problem, "v0").unwrap();
    system.step(0.01);
    system.step(0.01);
    assert!(system.is_solving());

    system.remove_body(id).unwrap();
    for _ in 0..5 {
        system.step(0.01);
    }
    assert!(!system.is_solving());
}

#[test]
fn test_no_solver_error() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));

    let result = system.solve_problem(body.id(), &knowns(&[("T", 1.0)]), "warp");
    assert!(matches!(result, Err(PhysicsError::NoSolver(_))));
    assert!(!system.is_solving());
}

#[test]
fn test_solve_for_missing_body() {
    let system = PhysicsSystem::new();
    let body = system.add_body(PhysicsBody::point_mass(1.0, Vector3::zero()));
    let id = body.id();
    system.remove_body(id).unwrap();

    let result = system.solve_problem(id, &knowns(&[("r0", 0.0), ("v0", 0.0)]), "T");
    assert!(matches!(result, Err(PhysicsError::BodyNotFound(_))));
}
