//! RRT (Rapidly-exploring Random Tree) trajectory planning in 3D
//!
//! Builds a goal-biased tree from the start waypoint, rejecting steps whose
//! segment hits a spherical obstacle, then smooths the start-to-goal branch
//! with a clamped cubic spline.
//!
//! The planner never fails a search. When the iteration budget runs out the
//! goal is attached to the nearest tree node regardless of collision, so the
//! caller always receives a trajectory; residual collisions show up in the
//! safety score instead.

use ordered_float::OrderedFloat;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collision::{random_waypoint, segment_collides, Obstacle};
use crate::common::{
    BoundingBox, Trajectory, TrajectoryError, TrajectoryGenerator, TrajectoryResult, Waypoint,
};
use crate::curves::{uniform_cubic_spline, SplineBoundary};
use crate::path_planning::perturbed::check_endpoints;

/// Node of the planner tree; `parent` indexes into the same arena
#[derive(Debug, Clone, Copy)]
struct RrtNode {
    point: Waypoint,
    parent: Option<usize>,
}

/// Configuration for RRT planner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RrtConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Probability of sampling the goal directly
    pub goal_bias: f64,
    /// Expansion distance per step [m]
    pub step_size: f64,
    /// Points tested along each new segment
    pub n_collision_checks: usize,
    /// Added to every obstacle radius while growing the tree [m]. Segments are
    /// only tested at `n_collision_checks` points, so the default covers the
    /// sagitta a sphere can slip between two samples of a full step.
    pub clearance_margin: f64,
}

impl Default for RrtConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            goal_bias: 0.2,
            step_size: 50.0,
            n_collision_checks: 10,
            clearance_margin: 10.0,
        }
    }
}

impl RrtConfig {
    pub fn validate(&self) -> TrajectoryResult<()> {
        if !(self.step_size > 0.0) || !self.step_size.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        if !(0.0..=1.0).contains(&self.goal_bias) {
            return Err(TrajectoryError::invalid(format!(
                "goal_bias must be in [0, 1], got {}",
                self.goal_bias
            )));
        }
        if self.n_collision_checks < 2 {
            return Err(TrajectoryError::invalid("n_collision_checks must be at least 2"));
        }
        if !(self.clearance_margin >= 0.0) || !self.clearance_margin.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "clearance_margin must be >= 0, got {}",
                self.clearance_margin
            )));
        }
        Ok(())
    }
}

/// How the tree reached the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOutcome {
    /// A collision-free branch reached the goal
    Reached,
    /// Budget exhausted; the goal was attached without a collision check
    ForcedConnection,
}

/// Planner result with search diagnostics
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub trajectory: Trajectory,
    pub outcome: PlanOutcome,
    /// Unsmoothed branch handed to the spline (after densification)
    pub raw_path: Vec<Waypoint>,
    pub tree_size: usize,
    pub iterations: usize,
}

/// RRT trajectory planner over a borrowed, read-only obstacle set
#[derive(Debug, Clone)]
pub struct RrtPlanner<'a> {
    config: RrtConfig,
    bounds: BoundingBox,
    obstacles: &'a [Obstacle],
}

impl<'a> RrtPlanner<'a> {
    pub fn new(obstacles: &'a [Obstacle], bounds: BoundingBox, config: RrtConfig) -> Self {
        RrtPlanner { config, bounds, obstacles }
    }

    pub fn plan<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        goal: Waypoint,
        n_samples: usize,
        rng: &mut R,
    ) -> TrajectoryResult<Trajectory> {
        self.plan_detailed(start, goal, n_samples, rng).map(|report| report.trajectory)
    }

    pub fn plan_detailed<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        goal: Waypoint,
        n_samples: usize,
        rng: &mut R,
    ) -> TrajectoryResult<PlanReport> {
        check_endpoints(&start, &goal)?;
        self.bounds.validate()?;
        self.config.validate()?;

        let (tree, terminal, outcome, iterations) = self.grow_tree(start, goal, rng);
        let raw_path = densify(extract_path(&tree, terminal));
        let trajectory = uniform_cubic_spline(&raw_path, n_samples, SplineBoundary::Clamped)?;

        debug!(
            tree_size = tree.len(),
            iterations,
            branch_len = raw_path.len(),
            ?outcome,
            "rrt planning finished"
        );

        Ok(PlanReport {
            trajectory,
            outcome,
            raw_path,
            tree_size: tree.len(),
            iterations,
        })
    }

    fn grow_tree<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        goal: Waypoint,
        rng: &mut R,
    ) -> (Vec<RrtNode>, usize, PlanOutcome, usize) {
        let mut tree = vec![RrtNode { point: start, parent: None }];

        if start.distance(&goal) < 1e-9 {
            return (tree, 0, PlanOutcome::Reached, 0);
        }

        for iteration in 0..self.config.max_iterations {
            let sample = self.sample_point(&goal, rng);
            let nearest_ind = nearest_node_index(&tree, &sample);
            let nearest = tree[nearest_ind].point;
            let new_point = steer(&nearest, &sample, self.config.step_size);

            if self.segment_blocked(&nearest, &new_point) {
                continue;
            }

            tree.push(RrtNode { point: new_point, parent: Some(nearest_ind) });
            let new_ind = tree.len() - 1;

            if new_point.distance(&goal) < 1e-9 {
                return (tree, new_ind, PlanOutcome::Reached, iteration + 1);
            }
            // the final link is collision-checked too; a blocked one keeps growing
            let within_step = new_point.distance(&goal) < self.config.step_size;
            if within_step && !self.segment_blocked(&new_point, &goal) {
                tree.push(RrtNode { point: goal, parent: Some(new_ind) });
                let goal_ind = tree.len() - 1;
                return (tree, goal_ind, PlanOutcome::Reached, iteration + 1);
            }
        }

        let nearest_ind = nearest_node_index(&tree, &goal);
        warn!(
            max_iterations = self.config.max_iterations,
            tree_size = tree.len(),
            gap = tree[nearest_ind].point.distance(&goal),
            "rrt exhausted its iteration budget, force-connecting goal"
        );
        tree.push(RrtNode { point: goal, parent: Some(nearest_ind) });
        let goal_ind = tree.len() - 1;
        (tree, goal_ind, PlanOutcome::ForcedConnection, self.config.max_iterations)
    }

    fn sample_point<R: Rng + ?Sized>(&self, goal: &Waypoint, rng: &mut R) -> Waypoint {
        if rng.gen::<f64>() < self.config.goal_bias {
            *goal
        } else {
            random_waypoint(&self.bounds, rng)
        }
    }

    fn segment_blocked(&self, from: &Waypoint, to: &Waypoint) -> bool {
        segment_collides(
            from,
            to,
            self.obstacles,
            self.config.n_collision_checks,
            self.config.clearance_margin,
        )
    }
}

impl TrajectoryGenerator for RrtPlanner<'_> {
    fn generate(
        &self,
        start: Waypoint,
        end: Waypoint,
        n_samples: usize,
        rng: &mut dyn RngCore,
    ) -> TrajectoryResult<Trajectory> {
        self.plan(start, end, n_samples, rng)
    }

    fn name(&self) -> &'static str {
        "rrt"
    }
}

// First node at minimum distance, so ties resolve to the older node.
fn nearest_node_index(tree: &[RrtNode], target: &Waypoint) -> usize {
    tree.iter()
        .enumerate()
        .min_by_key(|(_, node)| OrderedFloat(node.point.distance(target)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn steer(from: &Waypoint, to: &Waypoint, step_size: f64) -> Waypoint {
    let direction = to.to_vector() - from.to_vector();
    let distance = direction.norm();
    if distance > step_size {
        (from.to_vector() + direction / distance * step_size).into()
    } else {
        *to
    }
}

fn extract_path(tree: &[RrtNode], terminal: usize) -> Vec<Waypoint> {
    let mut points = Vec::new();
    let mut node_index = Some(terminal);

    while let Some(index) = node_index {
        let node = &tree[index];
        points.push(node.point);
        node_index = node.parent;
    }

    points.reverse();
    points
}

// The smoother wants at least 4 points; short branches get segment midpoints.
fn densify(path: Vec<Waypoint>) -> Vec<Waypoint> {
    if path.len() >= 4 {
        return path;
    }
    if path.len() == 1 {
        return vec![path[0], path[0]];
    }
    let mut dense = Vec::with_capacity(path.len() * 2 - 1);
    for pair in path.windows(2) {
        dense.push(pair[0]);
        dense.push(pair[0].midpoint(&pair[1]));
    }
    dense.extend(path.last().copied());
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn start() -> Waypoint {
        Waypoint::new(0.0, 0.0, 100.0)
    }

    fn goal() -> Waypoint {
        Waypoint::new(800.0, 600.0, 200.0)
    }

    #[test]
    fn test_rrt_config_default() {
        let config = RrtConfig::default();
        assert_eq!(config.step_size, 50.0);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.goal_bias, 0.2);
        assert_eq!(config.n_collision_checks, 10);
        assert_eq!(config.clearance_margin, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rrt_config_validation() {
        let bad_step = RrtConfig { step_size: 0.0, ..Default::default() };
        let bad_bias = RrtConfig { goal_bias: 1.5, ..Default::default() };
        let bad_checks = RrtConfig { n_collision_checks: 1, ..Default::default() };
        assert!(bad_step.validate().is_err());
        assert!(bad_bias.validate().is_err());
        assert!(bad_checks.validate().is_err());
    }

    #[test]
    fn test_steer_limits_step() {
        let a = Waypoint::origin();
        let far = Waypoint::new(300.0, 400.0, 0.0);
        let stepped = steer(&a, &far, 50.0);
        assert!((stepped.distance(&a) - 50.0).abs() < 1e-9);
        let near = Waypoint::new(3.0, 4.0, 0.0);
        assert_eq!(steer(&a, &near, 50.0), near);
    }

    #[test]
    fn test_extract_path_follows_parents() {
        let tree = vec![
            RrtNode { point: Waypoint::new(0.0, 0.0, 0.0), parent: None },
            RrtNode { point: Waypoint::new(1.0, 0.0, 0.0), parent: Some(0) },
            RrtNode { point: Waypoint::new(0.0, 1.0, 0.0), parent: Some(0) },
            RrtNode { point: Waypoint::new(2.0, 0.0, 0.0), parent: Some(1) },
        ];
        let path = extract_path(&tree, 3);
        assert_eq!(path, vec![tree[0].point, tree[1].point, tree[3].point]);
    }

    #[test]
    fn test_densify_short_branches() {
        let a = Waypoint::new(0.0, 0.0, 0.0);
        let b = Waypoint::new(10.0, 0.0, 0.0);
        assert_eq!(densify(vec![a, b]), vec![a, a.midpoint(&b), b]);
        let c = Waypoint::new(10.0, 10.0, 0.0);
        assert_eq!(densify(vec![a, b, c]).len(), 5);
        let long = vec![a, b, c, a];
        assert_eq!(densify(long.clone()), long);
    }

    #[test]
    fn test_rrt_obstacle_free_reaches_goal() {
        let config = RrtConfig { max_iterations: 500, ..Default::default() };
        let planner = RrtPlanner::new(&[], BoundingBox::default(), config);
        let mut rng = StdRng::seed_from_u64(42);
        let report = planner.plan_detailed(start(), goal(), 50, &mut rng).unwrap();
        assert_eq!(report.outcome, PlanOutcome::Reached);
        assert_eq!(report.trajectory.len(), 50);
        assert!(report.trajectory.first().distance(&start()) < 1e-3);
        assert!(report.trajectory.last().distance(&goal()) < 1e-3);
        for pair in report.raw_path.windows(2) {
            assert!(pair[0].distance(&pair[1]) <= 50.0 + 1e-9);
        }
    }

    #[test]
    fn test_rrt_deterministic_for_seed() {
        let obstacles = [Obstacle::new(Waypoint::new(400.0, 300.0, 150.0), 80.0).unwrap()];
        let planner = RrtPlanner::new(&obstacles, BoundingBox::default(), RrtConfig::default());
        let a = planner.plan(start(), goal(), 50, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = planner.plan(start(), goal(), 50, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rrt_zero_budget_forces_connection() {
        let config = RrtConfig { max_iterations: 0, ..Default::default() };
        let planner = RrtPlanner::new(&[], BoundingBox::default(), config);
        let report = planner
            .plan_detailed(start(), goal(), 20, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(report.outcome, PlanOutcome::ForcedConnection);
        assert_eq!(report.raw_path, vec![start(), start().midpoint(&goal()), goal()]);
        assert_eq!(report.trajectory.len(), 20);
    }

    #[test]
    fn test_rrt_enclosed_goal_still_terminates() {
        // goal sealed inside a shell of overlapping spheres
        let g = goal();
        let mut obstacles = Vec::new();
        for &(dx, dy, dz) in &[
            (60.0, 0.0, 0.0), (-60.0, 0.0, 0.0), (0.0, 60.0, 0.0),
            (0.0, -60.0, 0.0), (0.0, 0.0, 60.0), (0.0, 0.0, -60.0),
            (40.0, 40.0, 40.0), (-40.0, -40.0, -40.0), (40.0, -40.0, 40.0),
            (-40.0, 40.0, -40.0), (40.0, 40.0, -40.0), (-40.0, -40.0, 40.0),
            (40.0, -40.0, -40.0), (-40.0, 40.0, 40.0),
        ] {
            let center = Waypoint::new(g.x + dx, g.y + dy, g.z + dz);
            obstacles.push(Obstacle::new(center, 45.0).unwrap());
        }
        let planner = RrtPlanner::new(&obstacles, BoundingBox::default(), RrtConfig::default());
        let report = planner.plan_detailed(start(), g, 50, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(report.outcome, PlanOutcome::ForcedConnection);
        assert_eq!(report.iterations, 100);
        assert_eq!(report.trajectory.len(), 50);
        assert!(report.trajectory.last().distance(&g) < 1e-3);
    }

    #[test]
    fn test_rrt_same_start_and_goal() {
        let planner = RrtPlanner::new(&[], BoundingBox::default(), RrtConfig::default());
        let traj = planner.plan(start(), start(), 10, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(traj.len(), 10);
        assert!(traj.iter().all(|p| p.distance(&start()) < 1e-9));
    }

    #[test]
    fn test_rrt_blocked_final_link_keeps_searching() {
        // every sample lands within one step of the goal, behind a sphere
        let start = Waypoint::new(0.0, 0.0, 100.0);
        let goal = Waypoint::new(30.0, 0.0, 100.0);
        let obstacles = [Obstacle::new(Waypoint::new(15.0, 0.0, 100.0), 5.0).unwrap()];
        let corner = Waypoint::new(2.0, 1.0, 101.0);
        let bounds = BoundingBox::new(Waypoint::new(0.0, -1.0, 99.0), corner).unwrap();
        let config = RrtConfig {
            max_iterations: 30,
            goal_bias: 0.0,
            clearance_margin: 0.0,
            ..Default::default()
        };
        let planner = RrtPlanner::new(&obstacles, bounds, config);
        let report = planner
            .plan_detailed(start, goal, 20, &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(report.outcome, PlanOutcome::ForcedConnection);
        assert_eq!(report.iterations, 30);
        assert!(report.tree_size > 1);
    }

    #[test]
    fn test_rrt_rejects_inverted_bounds() {
        let inverted = BoundingBox {
            min: Waypoint::new(100.0, 0.0, 0.0),
            max: Waypoint::new(0.0, 100.0, 100.0),
        };
        let planner = RrtPlanner::new(&[], inverted, RrtConfig::default());
        let result = planner.plan_detailed(start(), goal(), 20, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(TrajectoryError::InvalidInput(_))));
    }
}
