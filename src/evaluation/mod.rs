//! Trajectory evaluation: per-trajectory metrics, obstacle safety scoring
//! and candidate-set comparison

pub mod metrics;
pub mod safety;
pub mod compare;

pub use metrics::{
    compute_metrics, curvature_profile, endpoint_error, second_order_smoothness, TrajectoryMetrics,
};
pub use safety::{
    min_clearance, rank_candidates, safety_score, RankedCandidate, NO_OBSTACLE_SCORE,
};
pub use compare::{
    compare_trajectories, diversity, is_trajectory_valid, quality_score, rank_by_quality,
    ComparisonReport, QualityWeights, ReconstructionError, TrajectoryConstraints,
};
