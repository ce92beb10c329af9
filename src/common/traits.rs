//! Common traits defining interfaces for trajectory generators

use rand::RngCore;

use crate::common::error::TrajectoryResult;
use crate::common::types::*;

/// Trait shared by every path-generation strategy.
///
/// Randomness is always supplied by the caller, so two calls with
/// identically seeded generators produce identical trajectories.
pub trait TrajectoryGenerator {
    /// Generate a trajectory of `n_samples` waypoints from `start` to `end`
    fn generate(
        &self,
        start: Waypoint,
        end: Waypoint,
        n_samples: usize,
        rng: &mut dyn RngCore,
    ) -> TrajectoryResult<Trajectory>;

    /// Short lowercase name used in logs and responses
    fn name(&self) -> &'static str;
}
