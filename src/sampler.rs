//! Adapter around an external learned trajectory sampler
//!
//! The model itself lives outside this crate. It is reached through
//! [`TrajectorySampler`] and works in a normalized coordinate frame; the
//! adapter owns the per-axis normalization, draws latent codes from the
//! caller's RNG, checks the returned shape and converts back to metres.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::{Trajectory, TrajectoryError, TrajectoryGenerator, TrajectoryResult, Waypoint};

const SAMPLER_RESOURCE: &str = "trajectory sampler";
const NORMALIZATION_RESOURCE: &str = "normalization file";

/// Per-axis mean and standard deviation of the training data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNormalization")]
pub struct Normalization {
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

#[derive(Deserialize)]
struct RawNormalization {
    mean: [f64; 3],
    std: [f64; 3],
}

impl TryFrom<RawNormalization> for Normalization {
    type Error = TrajectoryError;

    fn try_from(raw: RawNormalization) -> TrajectoryResult<Self> {
        Normalization::new(raw.mean, raw.std)
    }
}

impl Normalization {
    pub fn new(mean: [f64; 3], std: [f64; 3]) -> TrajectoryResult<Self> {
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(TrajectoryError::invalid(format!(
                "normalization mean must be finite, got {:?}",
                mean
            )));
        }
        if std.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
            return Err(TrajectoryError::invalid(format!(
                "normalization std must be positive, got {:?}",
                std
            )));
        }
        Ok(Self { mean, std })
    }

    pub fn identity() -> Self {
        Self { mean: [0.0; 3], std: [1.0; 3] }
    }

    /// Parse `{"mean": [x, y, z], "std": [x, y, z]}`
    pub fn from_json_str(json: &str) -> TrajectoryResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TrajectoryError::invalid(format!("malformed normalization record: {}", e)))
    }

    /// Load the normalization record; a missing file is `Unavailable`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TrajectoryResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TrajectoryError::unavailable(
                NORMALIZATION_RESOURCE,
                format!("{} not found", path.display()),
                false,
            ),
            _ => TrajectoryError::invalid(format!("cannot read {}: {}", path.display(), e)),
        })?;
        let normalization = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            mean = ?normalization.mean,
            std = ?normalization.std,
            "loaded normalization"
        );
        Ok(normalization)
    }

    pub fn normalize(&self, p: &Waypoint) -> [f64; 3] {
        let a = p.to_array();
        [
            (a[0] - self.mean[0]) / self.std[0],
            (a[1] - self.mean[1]) / self.std[1],
            (a[2] - self.mean[2]) / self.std[2],
        ]
    }

    pub fn denormalize(&self, raw: &[f64; 3]) -> Waypoint {
        Waypoint::new(
            raw[0] * self.std[0] + self.mean[0],
            raw[1] * self.std[1] + self.mean[1],
            raw[2] * self.std[2] + self.mean[2],
        )
    }
}

/// Black-box learned sampler working in normalized coordinates.
///
/// Implementations may be in-process models, RPC clients or subprocesses.
/// Unreachable backends should return [`TrajectoryError::Unavailable`] with
/// their own retry classification.
pub trait TrajectorySampler {
    /// Length of the latent code consumed by [`TrajectorySampler::sample`]
    fn latent_dim(&self) -> usize;

    /// One normalized trajectory of `seq_len` points for a single latent code
    fn sample(
        &self,
        start: [f64; 3],
        end: [f64; 3],
        latent: &[f64],
        seq_len: usize,
    ) -> TrajectoryResult<Vec<[f64; 3]>>;

    /// One trajectory per latent code; override when the backend batches.
    fn sample_batch(
        &self,
        start: [f64; 3],
        end: [f64; 3],
        latents: &[Vec<f64>],
        seq_len: usize,
    ) -> TrajectoryResult<Vec<Vec<[f64; 3]>>> {
        latents
            .iter()
            .map(|latent| self.sample(start, end, latent, seq_len))
            .collect()
    }
}

impl<S: TrajectorySampler + ?Sized> TrajectorySampler for Box<S> {
    fn latent_dim(&self) -> usize {
        (**self).latent_dim()
    }

    fn sample(
        &self,
        start: [f64; 3],
        end: [f64; 3],
        latent: &[f64],
        seq_len: usize,
    ) -> TrajectoryResult<Vec<[f64; 3]>> {
        (**self).sample(start, end, latent, seq_len)
    }

    fn sample_batch(
        &self,
        start: [f64; 3],
        end: [f64; 3],
        latents: &[Vec<f64>],
        seq_len: usize,
    ) -> TrajectoryResult<Vec<Vec<[f64; 3]>>> {
        (**self).sample_batch(start, end, latents, seq_len)
    }
}

pub struct GenerativeSamplerAdapter<S> {
    sampler: S,
    normalization: Normalization,
}

impl<S: TrajectorySampler> GenerativeSamplerAdapter<S> {
    pub fn new(sampler: S, normalization: Normalization) -> Self {
        Self { sampler, normalization }
    }

    /// Draw `n_samples` latent codes from N(0, 1) and decode one trajectory per code.
    pub fn sample_many<R: Rng + ?Sized>(
        &self,
        start: Waypoint,
        end: Waypoint,
        n_samples: usize,
        seq_len: usize,
        rng: &mut R,
    ) -> TrajectoryResult<Vec<Trajectory>> {
        if !start.is_finite() || !end.is_finite() {
            return Err(TrajectoryError::invalid("start and end must be finite"));
        }
        if seq_len < 2 {
            return Err(TrajectoryError::invalid(format!(
                "seq_len must be at least 2, got {}",
                seq_len
            )));
        }

        let latent_dim = self.sampler.latent_dim();
        let latents: Vec<Vec<f64>> = (0..n_samples)
            .map(|_| (0..latent_dim).map(|_| rng.sample(StandardNormal)).collect())
            .collect();

        let start_n = self.normalization.normalize(&start);
        let end_n = self.normalization.normalize(&end);
        let raw = self.sampler.sample_batch(start_n, end_n, &latents, seq_len)?;
        debug!(n_samples, seq_len, latent_dim, "sampler batch decoded");

        if raw.len() != n_samples {
            return Err(shape_error(format!(
                "expected {} trajectories, got {}",
                n_samples,
                raw.len()
            )));
        }
        raw.iter()
            .map(|points| {
                if points.len() != seq_len {
                    return Err(shape_error(format!(
                        "expected {} points, got {}",
                        seq_len,
                        points.len()
                    )));
                }
                if points.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(shape_error("non-finite coordinate in sampler output"));
                }
                Trajectory::new(points.iter().map(|p| self.normalization.denormalize(p)).collect())
            })
            .collect()
    }
}

fn shape_error(reason: impl Into<String>) -> TrajectoryError {
    TrajectoryError::unavailable(SAMPLER_RESOURCE, reason, false)
}

impl<S: TrajectorySampler> TrajectoryGenerator for GenerativeSamplerAdapter<S> {
    fn generate(
        &self,
        start: Waypoint,
        end: Waypoint,
        n_samples: usize,
        rng: &mut dyn RngCore,
    ) -> TrajectoryResult<Trajectory> {
        self.sample_many(start, end, 1, n_samples, rng)?
            .pop()
            .ok_or_else(|| shape_error("sampler returned no trajectory"))
    }

    fn name(&self) -> &'static str {
        "sampled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Straight line in normalized space, bowed sideways by the first latent value.
    struct LineSampler;

    impl TrajectorySampler for LineSampler {
        fn latent_dim(&self) -> usize {
            4
        }

        fn sample(
            &self,
            start: [f64; 3],
            end: [f64; 3],
            latent: &[f64],
            seq_len: usize,
        ) -> TrajectoryResult<Vec<[f64; 3]>> {
            Ok((0..seq_len)
                .map(|i| {
                    let t = i as f64 / (seq_len - 1) as f64;
                    let bow = latent[0] * t * (1.0 - t);
                    [
                        start[0] + (end[0] - start[0]) * t,
                        start[1] + (end[1] - start[1]) * t + bow,
                        start[2] + (end[2] - start[2]) * t,
                    ]
                })
                .collect())
        }
    }

    struct ShortSampler;

    impl TrajectorySampler for ShortSampler {
        fn latent_dim(&self) -> usize {
            2
        }

        fn sample(
            &self,
            start: [f64; 3],
            end: [f64; 3],
            _latent: &[f64],
            _seq_len: usize,
        ) -> TrajectoryResult<Vec<[f64; 3]>> {
            Ok(vec![start, end])
        }
    }

    struct OfflineSampler;

    impl TrajectorySampler for OfflineSampler {
        fn latent_dim(&self) -> usize {
            8
        }

        fn sample(
            &self,
            _start: [f64; 3],
            _end: [f64; 3],
            _latent: &[f64],
            _seq_len: usize,
        ) -> TrajectoryResult<Vec<[f64; 3]>> {
            Err(TrajectoryError::unavailable("model server", "connection refused", true))
        }
    }

    fn normalization() -> Normalization {
        Normalization::new([0.0, 0.0, 250.0], [500.0, 500.0, 100.0]).unwrap()
    }

    #[test]
    fn test_normalization_roundtrip() {
        let norm = normalization();
        let p = Waypoint::new(800.0, 600.0, 200.0);
        assert_eq!(norm.normalize(&p), [1.6, 1.2, -0.5]);
        assert!(norm.denormalize(&norm.normalize(&p)).distance(&p) < 1e-9);
    }

    #[test]
    fn test_normalization_parsing() {
        let json = r#"{"mean": [1.0, 2.0, 3.0], "std": [4.0, 5.0, 6.0]}"#;
        let norm = Normalization::from_json_str(json).unwrap();
        assert_eq!(norm.std, [4.0, 5.0, 6.0]);
        let zero_std_json = r#"{"mean": [0.0, 0.0, 0.0], "std": [1.0, 0.0, 1.0]}"#;
        let zero_std = Normalization::from_json_str(zero_std_json);
        assert!(matches!(zero_std, Err(TrajectoryError::InvalidInput(_))));
        let not_object = Normalization::from_json_str("[1, 2]");
        assert!(matches!(not_object, Err(TrajectoryError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_normalization_file_is_unavailable() {
        let err = Normalization::from_json_file("/nonexistent/normalization.json").unwrap_err();
        assert!(matches!(err, TrajectoryError::Unavailable { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_sample_many_denormalizes() {
        let adapter = GenerativeSamplerAdapter::new(LineSampler, normalization());
        let start = Waypoint::new(0.0, 0.0, 100.0);
        let end = Waypoint::new(800.0, 600.0, 200.0);
        let mut rng = StdRng::seed_from_u64(42);
        let trajectories = adapter.sample_many(start, end, 3, 50, &mut rng).unwrap();
        assert_eq!(trajectories.len(), 3);
        for t in &trajectories {
            assert_eq!(t.len(), 50);
            assert!(t.first().distance(&start) < 1e-9);
            assert!(t.last().distance(&end) < 1e-9);
        }
        // each sample gets its own latent code
        assert_ne!(trajectories[0], trajectories[1]);
    }

    #[test]
    fn test_sample_many_deterministic_for_seed() {
        let adapter = GenerativeSamplerAdapter::new(LineSampler, normalization());
        let start = Waypoint::new(0.0, 0.0, 100.0);
        let end = Waypoint::new(-300.0, 500.0, 400.0);
        let a = adapter.sample_many(start, end, 2, 20, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = adapter.sample_many(start, end, 2, 20, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let adapter = GenerativeSamplerAdapter::new(ShortSampler, Normalization::identity());
        let err = adapter
            .sample_many(
                Waypoint::origin(),
                Waypoint::new(1.0, 1.0, 1.0),
                1,
                50,
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::Unavailable { retryable: false, .. }));
    }

    #[test]
    fn test_sampler_errors_propagate_unchanged() {
        let sampler: Box<dyn TrajectorySampler> = Box::new(OfflineSampler);
        let adapter = GenerativeSamplerAdapter::new(sampler, normalization());
        let err = adapter
            .generate(
                Waypoint::origin(),
                Waypoint::new(100.0, 0.0, 100.0),
                50,
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(adapter.name(), "sampled");
    }
}
