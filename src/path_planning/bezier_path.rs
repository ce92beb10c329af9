//! Bezier path generation
//!
//! Random control points are scattered around the straight line between
//! start and end, and the resulting Bezier curve is sampled uniformly in
//! its parameter.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::common::{
    linspace01, BoundingBox, Trajectory, TrajectoryGenerator, TrajectoryResult, Waypoint,
};
use crate::curves::bezier_curve;
use crate::path_planning::perturbed::{check_endpoints, perturbed_waypoints, Perturbation};

/// Configuration for the Bezier generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BezierConfig {
    /// Number of intermediate control points
    pub n_control_points: usize,
    pub perturbation: Perturbation,
}

impl Default for BezierConfig {
    fn default() -> Self {
        Self {
            n_control_points: 3,
            perturbation: Perturbation::new(100.0, 0.5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BezierPathGenerator {
    config: BezierConfig,
    bounds: BoundingBox,
}

impl BezierPathGenerator {
    pub fn new(bounds: BoundingBox, config: BezierConfig) -> Self {
        Self { config, bounds }
    }

    /// Control polygon `[start, c_1, .., c_n, end]`
    pub fn control_points<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        end: Waypoint,
        rng: &mut R,
    ) -> Vec<Waypoint> {
        perturbed_waypoints(
            &start,
            &end,
            self.config.n_control_points,
            &self.config.perturbation,
            &self.bounds,
            rng,
        )
    }

    pub fn plan<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        end: Waypoint,
        n_samples: usize,
        rng: &mut R,
    ) -> TrajectoryResult<Trajectory> {
        check_endpoints(&start, &end)?;
        self.bounds.validate()?;
        self.config.perturbation.validate()?;
        let control_points = self.control_points(start, end, rng);
        bezier_curve(&control_points, &linspace01(n_samples))
    }
}

impl TrajectoryGenerator for BezierPathGenerator {
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
        "bezier"
    }
}
