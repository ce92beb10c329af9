//! Obstacle safety scoring and candidate ranking
//!
//! A single score totally orders candidates: any colliding trajectory
//! scores below any clear one. Clear trajectories score their minimum
//! clearance, colliding ones the negated total penetration.

use std::cmp::Reverse;

use itertools::iproduct;
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::collision::Obstacle;
use crate::common::Trajectory;
use crate::evaluation::metrics::{compute_metrics, TrajectoryMetrics};

/// Score of a trajectory when no obstacles are present
pub const NO_OBSTACLE_SCORE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub trajectory: Trajectory,
    pub metrics: TrajectoryMetrics,
    pub safety_score: f64,
}

/// Smallest waypoint-to-surface distance over all obstacles; `None` without obstacles.
pub fn min_clearance(trajectory: &Trajectory, obstacles: &[Obstacle]) -> Option<f64> {
    iproduct!(trajectory.iter(), obstacles.iter())
        .map(|(p, obs)| obs.clearance(p))
        .min_by_key(|&c| OrderedFloat(c))
}

pub fn safety_score(trajectory: &Trajectory, obstacles: &[Obstacle]) -> f64 {
    if obstacles.is_empty() {
        return NO_OBSTACLE_SCORE;
    }

    let mut min_clearance = f64::INFINITY;
    let mut penalty = 0.0;
    for (p, obs) in iproduct!(trajectory.iter(), obstacles.iter()) {
        let clearance = obs.clearance(p);
        min_clearance = min_clearance.min(clearance);
        if clearance < 0.0 {
            penalty += clearance.abs();
        }
    }

    if penalty > 0.0 {
        -penalty
    } else {
        min_clearance
    }
}

/// Score every candidate and sort best first; equal scores keep input order.
pub fn rank_candidates(
    candidates: Vec<Trajectory>,
    obstacles: &[Obstacle],
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|trajectory| RankedCandidate {
            metrics: compute_metrics(&trajectory),
            safety_score: safety_score(&trajectory, obstacles),
            trajectory,
        })
        .collect();
    ranked.sort_by_key(|c| Reverse(OrderedFloat(c.safety_score)));
    ranked
}
