//! Geometric quality metrics of a single trajectory
//!
//! All functions are pure single passes over the waypoints and cannot fail
//! on a constructed [`Trajectory`].

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::common::{Trajectory, Waypoint};

/// Segments shorter than this contribute no curvature sample
const MIN_SEGMENT_NORM: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMetrics {
    pub path_length: f64,
    pub straight_line_distance: f64,
    /// straight_line_distance / path_length, in (0, 1] for non-degenerate paths
    pub path_efficiency: f64,
    pub avg_curvature: f64,
    pub max_curvature: f64,
    /// 1 / (1 + avg_curvature)
    pub smoothness_score: f64,
    /// Mean segment length; the time step is implicit
    pub avg_velocity: f64,
    pub min_altitude: f64,
    pub max_altitude: f64,
    pub avg_altitude: f64,
}

pub fn compute_metrics(trajectory: &Trajectory) -> TrajectoryMetrics {
    let points = trajectory.waypoints();

    let path_length = trajectory.total_length();
    let straight_line_distance = trajectory.first().distance(&trajectory.last());
    let path_efficiency = if path_length > 0.0 {
        straight_line_distance / path_length
    } else {
        0.0
    };

    let curvatures = curvature_profile(trajectory);
    let avg_curvature = mean(&curvatures);
    let max_curvature = curvatures.iter().copied().fold(0.0, f64::max);

    let avg_velocity = path_length / (points.len() - 1) as f64;

    let (min_altitude, max_altitude) = match points.iter().map(|p| p.z).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => (0.0, 0.0),
        MinMaxResult::OneElement(z) => (z, z),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let avg_altitude = points.iter().map(|p| p.z).sum::<f64>() / points.len() as f64;

    TrajectoryMetrics {
        path_length,
        straight_line_distance,
        path_efficiency,
        avg_curvature,
        max_curvature,
        smoothness_score: 1.0 / (1.0 + avg_curvature),
        avg_velocity,
        min_altitude,
        max_altitude,
        avg_altitude,
    }
}

/// Turning angle per unit length at each interior waypoint.
///
/// Points adjacent to a near-zero segment are skipped, so the result may be
/// shorter than `len - 2`.
pub fn curvature_profile(trajectory: &Trajectory) -> Vec<f64> {
    trajectory
        .iter()
        .tuple_windows()
        .filter_map(|(prev, cur, next)| {
            let v1 = cur.to_vector() - prev.to_vector();
            let v2 = next.to_vector() - cur.to_vector();
            let (n1, n2) = (v1.norm(), v2.norm());
            if n1 <= MIN_SEGMENT_NORM || n2 <= MIN_SEGMENT_NORM {
                return None;
            }
            let cos_angle = (v1.dot(&v2) / (n1 * n2)).clamp(-1.0, 1.0);
            Some(cos_angle.acos() / n1)
        })
        .collect()
}

/// Distance from the last waypoint to where the trajectory should end
pub fn endpoint_error(trajectory: &Trajectory, expected_end: &Waypoint) -> f64 {
    trajectory.last().distance(expected_end)
}

/// Mean squared second difference `|p[i+1] - 2 p[i] + p[i-1]|^2`; 0 below 3 points.
pub fn second_order_smoothness(trajectory: &Trajectory) -> f64 {
    let second_diffs: Vec<f64> = trajectory
        .iter()
        .tuple_windows()
        .map(|(prev, cur, next)| {
            (next.to_vector() - cur.to_vector() * 2.0 + prev.to_vector()).norm_squared()
        })
        .collect();
    mean(&second_diffs)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
