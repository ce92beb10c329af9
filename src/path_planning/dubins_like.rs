//! Dubins-like turn-straight-turn paths
//!
//! Not a true Dubins solver: headings are not modelled. Two turn waypoints
//! sit one turn radius inside each endpoint along the start-end direction,
//! and a clamped spline is fitted through `[start, turn1, turn2, end]`.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{Trajectory, TrajectoryError, TrajectoryGenerator, TrajectoryResult, Waypoint};
use crate::curves::{uniform_cubic_spline, SplineBoundary};
use crate::path_planning::perturbed::check_endpoints;
use crate::path_planning::spline_path::SplinePathGenerator;

/// Configuration for the Dubins-like generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DubinsConfig {
    /// Minimum turn radius [m]
    pub turn_radius: f64,
}

impl Default for DubinsConfig {
    fn default() -> Self {
        Self { turn_radius: 100.0 }
    }
}

#[derive(Debug, Clone)]
pub struct DubinsLikePathGenerator {
    config: DubinsConfig,
    fallback: SplinePathGenerator,
}

impl DubinsLikePathGenerator {
    /// `spline` is used, with 2 intermediate waypoints, when the endpoints
    /// are too close for a turn-straight-turn path.
    pub fn new(config: DubinsConfig, spline: &SplinePathGenerator) -> Self {
        Self {
            config,
            fallback: spline.with_waypoints(2),
        }
    }

    pub fn turn_radius(&self) -> f64 {
        self.config.turn_radius
    }

    pub fn plan<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        end: Waypoint,
        n_samples: usize,
        rng: &mut R,
    ) -> TrajectoryResult<Trajectory> {
        check_endpoints(&start, &end)?;
        let turn_radius = self.config.turn_radius;
        if !(turn_radius > 0.0) || !turn_radius.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "turn radius must be positive, got {}",
                turn_radius
            )));
        }

        let direction = end.to_vector() - start.to_vector();
        let distance = direction.norm();
        if distance < 2.0 * turn_radius {
            debug!(
                distance,
                turn_radius,
                "endpoints too close for turn-straight-turn, using spline"
            );
            return self.fallback.plan(start, end, n_samples, rng);
        }

        let unit_dir = direction / distance;
        let turn1: Waypoint = (start.to_vector() + unit_dir * turn_radius).into();
        let turn2: Waypoint = (end.to_vector() - unit_dir * turn_radius).into();
        uniform_cubic_spline(&[start, turn1, turn2, end], n_samples, SplineBoundary::Clamped)
    }
}

impl TrajectoryGenerator for DubinsLikePathGenerator {
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
        "dubins"
    }
}
