//! Request-level orchestration: generate candidates, measure them and rank
//! them by safety when obstacles are given.
//!
//! Candidates of one request run on the rayon pool. Each gets its own
//! `StdRng` seeded from a master generator, so a response depends only on
//! the request, never on thread scheduling.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collision::Obstacle;
use crate::common::{Trajectory, TrajectoryError, TrajectoryGenerator, TrajectoryResult, Waypoint};
use crate::config::EngineConfig;
use crate::evaluation::{compute_metrics, rank_candidates, TrajectoryMetrics};
use crate::path_planning::{
    BezierPathGenerator, DubinsLikePathGenerator, RrtPlanner, SplinePathGenerator,
};
use crate::sampler::{GenerativeSamplerAdapter, TrajectorySampler};

pub const N_SAMPLES_RANGE: (usize, usize) = (1, 20);
pub const SEQ_LEN_RANGE: (usize, usize) = (10, 500);

/// Sampler type stored by the engine
pub type BoxedSampler = Box<dyn TrajectorySampler + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    #[default]
    Bezier,
    Spline,
    Dubins,
    Rrt,
    Sampled,
}

impl GenerationMethod {
    pub const ALL: [GenerationMethod; 5] = [
        GenerationMethod::Bezier,
        GenerationMethod::Spline,
        GenerationMethod::Dubins,
        GenerationMethod::Rrt,
        GenerationMethod::Sampled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMethod::Bezier => "bezier",
            GenerationMethod::Spline => "spline",
            GenerationMethod::Dubins => "dubins",
            GenerationMethod::Rrt => "rrt",
            GenerationMethod::Sampled => "sampled",
        }
    }
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMethod {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> TrajectoryResult<Self> {
        GenerationMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TrajectoryError::invalid(format!("unknown generation method '{}'", s)))
    }
}

fn default_n_samples() -> usize {
    1
}

fn default_seq_len() -> usize {
    50
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub start: Waypoint,
    pub end: Waypoint,
    /// Number of candidates
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    /// Waypoints per candidate
    #[serde(default = "default_seq_len")]
    pub seq_len: usize,
    /// `Some` (even empty) enables safety scoring and ranking
    #[serde(default)]
    pub obstacles: Option<Vec<Obstacle>>,
    #[serde(default)]
    pub method: GenerationMethod,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl GenerationRequest {
    pub fn new(start: Waypoint, end: Waypoint, method: GenerationMethod) -> Self {
        Self {
            start,
            end,
            n_samples: default_n_samples(),
            seq_len: default_seq_len(),
            obstacles: None,
            method,
            seed: default_seed(),
        }
    }

    pub fn validate(&self) -> TrajectoryResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(TrajectoryError::invalid("start and end must be finite"));
        }
        let (lo, hi) = N_SAMPLES_RANGE;
        if !(lo..=hi).contains(&self.n_samples) {
            return Err(TrajectoryError::invalid(format!(
                "n_samples must be in [{}, {}], got {}",
                lo, hi, self.n_samples
            )));
        }
        let (lo, hi) = SEQ_LEN_RANGE;
        if !(lo..=hi).contains(&self.seq_len) {
            return Err(TrajectoryError::invalid(format!(
                "seq_len must be in [{}, {}], got {}",
                lo, hi, self.seq_len
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResponse {
    pub waypoints: Vec<[f64; 3]>,
    pub metrics: TrajectoryMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<f64>,
}

impl CandidateResponse {
    fn new(trajectory: &Trajectory, metrics: TrajectoryMetrics, safety_score: Option<f64>) -> Self {
        Self {
            waypoints: trajectory.to_arrays(),
            metrics,
            safety_score,
        }
    }
}

/// Candidates in output order: safest first when obstacles were given,
/// generation order otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub method: GenerationMethod,
    pub candidates: Vec<CandidateResponse>,
}

pub struct TrajectoryEngine {
    config: EngineConfig,
    sampler: Option<GenerativeSamplerAdapter<BoxedSampler>>,
}

impl TrajectoryEngine {
    pub fn new(config: EngineConfig) -> TrajectoryResult<Self> {
        config.validate()?;
        Ok(Self { config, sampler: None })
    }

    /// Attach the adapter serving [`GenerationMethod::Sampled`]
    pub fn with_sampler(mut self, sampler: GenerativeSamplerAdapter<BoxedSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn has_sampler(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn generate(&self, request: &GenerationRequest) -> TrajectoryResult<GenerationResponse> {
        request.validate()?;

        let obstacles = request.obstacles.as_deref().unwrap_or(&[]);
        let trajectories = self.generate_candidates(request, obstacles)?;

        let candidates: Vec<CandidateResponse> = match &request.obstacles {
            Some(obstacles) => rank_candidates(trajectories, obstacles)
                .into_iter()
                .map(|c| CandidateResponse::new(&c.trajectory, c.metrics, Some(c.safety_score)))
                .collect(),
            None => trajectories
                .iter()
                .map(|t| CandidateResponse::new(t, compute_metrics(t), None))
                .collect(),
        };

        info!(
            method = %request.method,
            n_samples = request.n_samples,
            seq_len = request.seq_len,
            n_obstacles = obstacles.len(),
            best_score = ?candidates.first().and_then(|c| c.safety_score),
            "generated trajectories"
        );

        Ok(GenerationResponse {
            method: request.method,
            candidates,
        })
    }

    fn generate_candidates(
        &self,
        request: &GenerationRequest,
        obstacles: &[Obstacle],
    ) -> TrajectoryResult<Vec<Trajectory>> {
        let mut master = StdRng::seed_from_u64(request.seed);

        if request.method == GenerationMethod::Sampled {
            let sampler = self.sampler.as_ref().ok_or_else(|| {
                TrajectoryError::unavailable("trajectory sampler", "no sampler configured", false)
            })?;
            return sampler.sample_many(
                request.start,
                request.end,
                request.n_samples,
                request.seq_len,
                &mut master,
            );
        }

        let generator = self.geometric_generator(request.method, obstacles);
        let seeds: Vec<u64> = (0..request.n_samples).map(|_| master.gen()).collect();
        seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                generator.generate(request.start, request.end, request.seq_len, &mut rng)
            })
            .collect()
    }

    fn geometric_generator<'a>(
        &self,
        method: GenerationMethod,
        obstacles: &'a [Obstacle],
    ) -> Box<dyn TrajectoryGenerator + Sync + 'a> {
        let config = &self.config;
        let spline = SplinePathGenerator::new(config.bounds, config.spline);
        match method {
            GenerationMethod::Bezier => {
                Box::new(BezierPathGenerator::new(config.bounds, config.bezier))
            }
            GenerationMethod::Dubins => {
                Box::new(DubinsLikePathGenerator::new(config.dubins, &spline))
            }
            GenerationMethod::Rrt => {
                Box::new(RrtPlanner::new(obstacles, config.bounds, config.rrt))
            }
            GenerationMethod::Spline | GenerationMethod::Sampled => Box::new(spline),
        }
    }
}
