//! Engine configuration loaded from JSON.
//!
//! Every section falls back to its defaults when absent, so `{}` is a
//! valid configuration file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::{BoundingBox, TrajectoryResult};
use crate::path_planning::{BezierConfig, DubinsConfig, RrtConfig, SplineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling and clamping region shared by all generators
    pub bounds: BoundingBox,
    pub bezier: BezierConfig,
    pub spline: SplineConfig,
    pub dubins: DubinsConfig,
    pub rrt: RrtConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> TrajectoryResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TrajectoryResult<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    pub fn validate(&self) -> TrajectoryResult<()> {
        self.bounds.validate()?;
        self.bezier.perturbation.validate()?;
        self.spline.perturbation.validate()?;
        self.rrt.validate()
    }
}
