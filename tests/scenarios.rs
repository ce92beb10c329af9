use rand::rngs::StdRng;
use rand::SeedableRng;

use trajectory_engine::collision::{generate_obstacles, Obstacle};
use trajectory_engine::common::{BoundingBox, Trajectory, TrajectoryGenerator, Waypoint};
use trajectory_engine::config::EngineConfig;
use trajectory_engine::evaluation::{
    compute_metrics, min_clearance, rank_candidates, safety_score,
};
use trajectory_engine::path_planning::{
    BezierPathGenerator, DubinsLikePathGenerator, PlanOutcome, RrtConfig, RrtPlanner,
    SplinePathGenerator,
};

fn start() -> Waypoint {
    Waypoint::new(0.0, 0.0, 100.0)
}

fn end() -> Waypoint {
    Waypoint::new(800.0, 600.0, 200.0)
}

fn blocking_obstacle() -> Obstacle {
    Obstacle::new(Waypoint::new(400.0, 300.0, 150.0), 80.0).unwrap()
}

fn geometric_generators(config: &EngineConfig) -> Vec<Box<dyn TrajectoryGenerator>> {
    let spline = SplinePathGenerator::new(config.bounds, config.spline);
    vec![
        Box::new(BezierPathGenerator::new(config.bounds, config.bezier)),
        Box::new(DubinsLikePathGenerator::new(config.dubins, &spline)),
        Box::new(spline),
    ]
}

#[test]
fn test_endpoint_fidelity_and_length_for_all_generators() {
    let config = EngineConfig::default();
    let obstacles = [blocking_obstacle()];
    let planner = RrtPlanner::new(&obstacles, config.bounds, config.rrt);
    let mut rng = StdRng::seed_from_u64(2024);

    for seq_len in [10, 11, 50, 123, 500] {
        let mut trajectories: Vec<(&str, Trajectory)> = geometric_generators(&config)
            .iter()
            .map(|g| (g.name(), g.generate(start(), end(), seq_len, &mut rng).unwrap()))
            .collect();
        let planned = planner.generate(start(), end(), seq_len, &mut rng).unwrap();
        trajectories.push((planner.name(), planned));

        for (name, traj) in trajectories {
            assert_eq!(traj.len(), seq_len, "{} length", name);
            assert!(traj.first().distance(&start()) < 1e-3, "{} start", name);
            assert!(traj.last().distance(&end()) < 1e-3, "{} end", name);
        }
    }
}

#[test]
fn test_efficiency_and_smoothness_bounds() {
    let config = EngineConfig::default();
    let planner = RrtPlanner::new(&[], config.bounds, config.rrt);
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut trajectories: Vec<Trajectory> = geometric_generators(&config)
            .iter()
            .map(|g| g.generate(start(), end(), 50, &mut rng).unwrap())
            .collect();
        trajectories.push(planner.plan(start(), end(), 50, &mut rng).unwrap());

        for traj in &trajectories {
            let m = compute_metrics(traj);
            assert!(m.path_efficiency > 0.0 && m.path_efficiency <= 1.0 + 1e-6);
            assert!(m.smoothness_score > 0.0 && m.smoothness_score <= 1.0);
            assert!(m.max_curvature >= m.avg_curvature);
            assert!(m.min_altitude <= m.avg_altitude && m.avg_altitude <= m.max_altitude);
        }
    }
}

#[test]
fn test_no_obstacle_score_is_one() {
    let config = EngineConfig::default();
    let mut rng = StdRng::seed_from_u64(5);
    for generator in geometric_generators(&config) {
        let traj = generator.generate(start(), end(), 50, &mut rng).unwrap();
        assert_eq!(safety_score(&traj, &[]), 1.0);
    }
}

#[test]
fn test_clear_candidate_outranks_colliding_one() {
    let obstacles = [blocking_obstacle()];
    // straight through the obstacle, shorter
    let through =
        Trajectory::new(vec![start(), Waypoint::new(400.0, 300.0, 150.0), end()]).unwrap();
    // long detour far above and around it
    let around = Trajectory::new(vec![
        start(),
        Waypoint::new(-200.0, 800.0, 450.0),
        Waypoint::new(600.0, 1000.0, 450.0),
        end(),
    ])
    .unwrap();
    assert!(through.total_length() < around.total_length());

    let ranked = rank_candidates(vec![through.clone(), around.clone()], &obstacles);
    assert_eq!(ranked[0].trajectory, around);
    assert_eq!(ranked[1].trajectory, through);
    assert!(ranked[0].safety_score > 0.0);
    assert!(ranked[1].safety_score < 0.0);
}

#[test]
fn test_planner_terminates_in_over_constrained_field() {
    let bounds = BoundingBox::default();
    let mut field_rng = StdRng::seed_from_u64(99);
    let obstacles = generate_obstacles(300, &start(), &end(), &bounds, &mut field_rng).unwrap();
    let planner = RrtPlanner::new(&obstacles, bounds, RrtConfig::default());

    for seed in 0..5 {
        let report = planner
            .plan_detailed(start(), end(), 80, &mut StdRng::seed_from_u64(seed))
            .unwrap();
        assert!(report.iterations <= 100);
        assert_eq!(report.trajectory.len(), 80);
        assert!(report.trajectory.last().distance(&end()) < 1e-3);
        if report.outcome == PlanOutcome::ForcedConnection {
            assert_eq!(report.iterations, 100);
        }
    }
}

#[test]
fn test_determinism_for_fixed_seed() {
    let config = EngineConfig::default();
    let obstacles = [blocking_obstacle()];
    let planner = RrtPlanner::new(&obstacles, config.bounds, config.rrt);
    let run = |seed: u64| -> Vec<Trajectory> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out: Vec<Trajectory> = geometric_generators(&config)
            .iter()
            .map(|g| g.generate(start(), end(), 64, &mut rng).unwrap())
            .collect();
        out.push(planner.plan(start(), end(), 64, &mut rng).unwrap());
        out
    };
    assert_eq!(run(11), run(11));
}

#[test]
fn test_dubins_reference_scenario() {
    let config = EngineConfig::default();
    let spline = SplinePathGenerator::new(config.bounds, config.spline);
    let dubins = DubinsLikePathGenerator::new(config.dubins, &spline);
    assert_eq!(dubins.turn_radius(), 100.0);

    for seed in 0..10 {
        let traj = dubins.plan(start(), end(), 50, &mut StdRng::seed_from_u64(seed)).unwrap();
        let m = compute_metrics(&traj);
        assert_eq!(traj.len(), 50);
        assert!(traj.first().distance(&start()) < 1e-3);
        assert!(traj.last().distance(&end()) < 1e-3);
        assert!(m.path_length >= m.straight_line_distance - 1e-9);
        assert!((m.straight_line_distance - 1004.987).abs() < 1e-3);
    }
}

#[test]
fn test_planner_avoids_obstacle_on_direct_line() {
    let obstacles = [blocking_obstacle()];
    let planner = RrtPlanner::new(&obstacles, BoundingBox::default(), RrtConfig::default());

    let clear_runs = (0..100)
        .filter(|&seed| {
            let traj = planner
                .plan(start(), end(), 50, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            min_clearance(&traj, &obstacles).map_or(false, |c| c >= 0.0)
        })
        .count();
    assert!(clear_runs >= 95, "only {} of 100 runs were clear", clear_runs);
}
