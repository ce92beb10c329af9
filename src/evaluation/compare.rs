//! Candidate-set comparison: diversity, constraint checks, quality ranking
//! and aggregate statistics.

use std::cmp::Reverse;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{Trajectory, TrajectoryError, TrajectoryResult, Waypoint};
use crate::evaluation::metrics::{
    compute_metrics, curvature_profile, endpoint_error, mean, TrajectoryMetrics,
};

/// Endpoint error is divided by this before weighting [m]
const ENDPOINT_ERROR_SCALE: f64 = 100.0;

/// Mean over all pairs of the mean pointwise distance, compared over the
/// shorter of the two lengths. 0 for fewer than two trajectories.
pub fn diversity(trajectories: &[Trajectory]) -> f64 {
    let pair_distances: Vec<f64> = trajectories
        .iter()
        .tuple_combinations()
        .map(|(a, b)| {
            let distances: Vec<f64> = a.iter().zip(b.iter()).map(|(p, q)| p.distance(q)).collect();
            mean(&distances)
        })
        .collect();
    mean(&pair_distances)
}

/// Flight envelope used by [`is_trajectory_valid`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConstraints {
    /// [rad/m]
    pub max_curvature: f64,
    pub min_altitude: f64,
    pub max_altitude: f64,
}

impl Default for TrajectoryConstraints {
    fn default() -> Self {
        Self {
            max_curvature: 0.1,
            min_altitude: 50.0,
            max_altitude: 1000.0,
        }
    }
}

pub fn is_trajectory_valid(trajectory: &Trajectory, constraints: &TrajectoryConstraints) -> bool {
    let within_curvature = curvature_profile(trajectory)
        .iter()
        .all(|&k| k <= constraints.max_curvature);
    let within_altitude = trajectory
        .iter()
        .all(|p| p.z >= constraints.min_altitude && p.z <= constraints.max_altitude);
    within_curvature && within_altitude
}

/// Weights of `w1 * efficiency + w2 * smoothness - w3 * endpoint_error / 100`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub efficiency: f64,
    pub smoothness: f64,
    pub endpoint: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            efficiency: 0.3,
            smoothness: 0.5,
            endpoint: 0.2,
        }
    }
}

pub fn quality_score(
    trajectory: &Trajectory,
    expected_end: &Waypoint,
    weights: &QualityWeights,
) -> f64 {
    let metrics = compute_metrics(trajectory);
    weights.efficiency * metrics.path_efficiency + weights.smoothness * metrics.smoothness_score
        - weights.endpoint * (endpoint_error(trajectory, expected_end) / ENDPOINT_ERROR_SCALE)
}

/// Indices into `trajectories`, best quality first; ties keep input order.
pub fn rank_by_quality(
    trajectories: &[Trajectory],
    expected_end: &Waypoint,
    weights: &QualityWeights,
) -> Vec<usize> {
    let scores: Vec<f64> = trajectories
        .iter()
        .map(|t| quality_score(t, expected_end, weights))
        .collect();
    let mut indices: Vec<usize> = (0..trajectories.len()).collect();
    indices.sort_by_key(|&i| Reverse(OrderedFloat(scores[i])));
    indices
}

/// Mean squared coordinate error against a ground truth of the same length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionError {
    pub mean: f64,
    pub min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub n_samples: usize,
    pub diversity: f64,
    /// Per-field mean over the candidate set
    pub mean: TrajectoryMetrics,
    /// Per-field population standard deviation
    pub std: TrajectoryMetrics,
    pub reconstruction_error: Option<ReconstructionError>,
}

pub fn compare_trajectories(
    trajectories: &[Trajectory],
    ground_truth: Option<&Trajectory>,
) -> TrajectoryResult<ComparisonReport> {
    if trajectories.is_empty() {
        return Err(TrajectoryError::invalid("cannot compare an empty trajectory set"));
    }

    let fields: Vec<[f64; 10]> = trajectories
        .iter()
        .map(|t| metrics_to_array(&compute_metrics(t)))
        .collect();
    let mut means = [0.0; 10];
    let mut stds = [0.0; 10];
    for k in 0..10 {
        let column: Vec<f64> = fields.iter().map(|f| f[k]).collect();
        means[k] = mean(&column);
        let variance: Vec<f64> = column.iter().map(|v| (v - means[k]).powi(2)).collect();
        stds[k] = mean(&variance).sqrt();
    }

    let reconstruction_error = ground_truth
        .map(|truth| reconstruction_error(trajectories, truth))
        .transpose()?;

    Ok(ComparisonReport {
        n_samples: trajectories.len(),
        diversity: diversity(trajectories),
        mean: metrics_from_array(means),
        std: metrics_from_array(stds),
        reconstruction_error,
    })
}

fn reconstruction_error(
    trajectories: &[Trajectory],
    truth: &Trajectory,
) -> TrajectoryResult<ReconstructionError> {
    let mut errors = Vec::with_capacity(trajectories.len());
    for t in trajectories {
        if t.len() != truth.len() {
            return Err(TrajectoryError::invalid(format!(
                "ground truth has {} waypoints, candidate has {}",
                truth.len(),
                t.len()
            )));
        }
        let squared: f64 = t
            .iter()
            .zip(truth.iter())
            .map(|(p, q)| (p.to_vector() - q.to_vector()).norm_squared())
            .sum();
        errors.push(squared / (3 * t.len()) as f64);
    }
    Ok(ReconstructionError {
        mean: mean(&errors),
        min: errors.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

fn metrics_to_array(m: &TrajectoryMetrics) -> [f64; 10] {
    [
        m.path_length,
        m.straight_line_distance,
        m.path_efficiency,
        m.avg_curvature,
        m.max_curvature,
        m.smoothness_score,
        m.avg_velocity,
        m.min_altitude,
        m.max_altitude,
        m.avg_altitude,
    ]
}

fn metrics_from_array(a: [f64; 10]) -> TrajectoryMetrics {
    TrajectoryMetrics {
        path_length: a[0],
        straight_line_distance: a[1],
        path_efficiency: a[2],
        avg_curvature: a[3],
        max_curvature: a[4],
        smoothness_score: a[5],
        avg_velocity: a[6],
        min_altitude: a[7],
        max_altitude: a[8],
        avg_altitude: a[9],
    }
}
