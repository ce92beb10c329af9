//! Cubic spline path generation through randomly perturbed waypoints

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::common::{BoundingBox, Trajectory, TrajectoryGenerator, TrajectoryResult, Waypoint};
use crate::curves::{uniform_cubic_spline, SplineBoundary};
use crate::path_planning::perturbed::{check_endpoints, perturbed_waypoints, Perturbation};

/// Configuration for the spline generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineConfig {
    /// Number of intermediate waypoints
    pub n_waypoints: usize,
    pub perturbation: Perturbation,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            n_waypoints: 5,
            perturbation: Perturbation::new(50.0, 0.3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplinePathGenerator {
    config: SplineConfig,
    bounds: BoundingBox,
}

impl SplinePathGenerator {
    pub fn new(bounds: BoundingBox, config: SplineConfig) -> Self {
        Self { config, bounds }
    }

    /// Same generator with a different number of intermediate waypoints
    pub fn with_waypoints(&self, n_waypoints: usize) -> Self {
        Self {
            config: SplineConfig { n_waypoints, ..self.config },
            bounds: self.bounds,
        }
    }

    pub fn config(&self) -> &SplineConfig {
        &self.config
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
        let waypoints = perturbed_waypoints(
            &start,
            &end,
            self.config.n_waypoints,
            &self.config.perturbation,
            &self.bounds,
            rng,
        );
        uniform_cubic_spline(&waypoints, n_samples, SplineBoundary::Natural)
    }
}

impl TrajectoryGenerator for SplinePathGenerator {
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
        "spline"
    }
}
