//! Randomly perturbed intermediate waypoints along the start-end line
//!
//! Shared by the Bezier and spline generators: point `i` of `n` sits at
//! `alpha = (i + 1) / (n + 1)` on the straight segment, displaced by
//! Gaussian noise and clamped back into the bounding box.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::common::{BoundingBox, TrajectoryError, TrajectoryResult, Waypoint};

/// Gaussian displacement applied to intermediate points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    /// Standard deviation on x and y [m]
    pub sigma: f64,
    /// Multiplier applied to `sigma` on z
    pub z_scale: f64,
}

impl Perturbation {
    pub fn new(sigma: f64, z_scale: f64) -> Self {
        Self { sigma, z_scale }
    }

    pub fn validate(&self) -> TrajectoryResult<()> {
        if !(self.sigma >= 0.0) || !self.sigma.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "perturbation sigma must be >= 0, got {}",
                self.sigma
            )));
        }
        if !(self.z_scale >= 0.0) || !self.z_scale.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "perturbation z_scale must be >= 0, got {}",
                self.z_scale
            )));
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; 3] {
        let dx: f64 = rng.sample(StandardNormal);
        let dy: f64 = rng.sample(StandardNormal);
        let dz: f64 = rng.sample(StandardNormal);
        [dx * self.sigma, dy * self.sigma, dz * self.sigma * self.z_scale]
    }
}

pub(crate) fn check_endpoints(start: &Waypoint, end: &Waypoint) -> TrajectoryResult<()> {
    if !start.is_finite() || !end.is_finite() {
        return Err(TrajectoryError::invalid(format!(
            "start {:?} and end {:?} must be finite",
            start, end
        )));
    }
    Ok(())
}

/// `[start, p_1, .., p_n, end]` with every `p_i` perturbed and clamped.
pub fn perturbed_waypoints<R: Rng + ?Sized>(
    start: &Waypoint,
    end: &Waypoint,
    n_intermediate: usize,
    perturbation: &Perturbation,
    bounds: &BoundingBox,
    rng: &mut R,
) -> Vec<Waypoint> {
    let mut points = Vec::with_capacity(n_intermediate + 2);
    points.push(*start);
    for i in 0..n_intermediate {
        let alpha = (i + 1) as f64 / (n_intermediate + 1) as f64;
        let base = start.lerp(end, alpha);
        let [dx, dy, dz] = perturbation.sample(rng);
        let displaced = Waypoint::new(base.x + dx, base.y + dy, base.z + dz);
        points.push(bounds.clamp(&displaced));
    }
    points.push(*end);
    points
}
