//! trajectory_engine - 3D point-to-point trajectory synthesis and ranking
//!
//! This crate generates candidate trajectories between a start and an end
//! waypoint (Bezier, cubic spline, Dubins-like, RRT or an external learned
//! sampler), measures their geometric quality and ranks them by clearance
//! to spherical obstacles.

// Core modules
pub mod common;
pub mod curves;
pub mod collision;
pub mod config;

// Generation and evaluation
pub mod path_planning;
pub mod evaluation;
pub mod sampler;
pub mod engine;

// Re-export common types for convenience
pub use common::{Trajectory, Waypoint, BoundingBox, TrajectoryGenerator};
pub use common::{TrajectoryError, TrajectoryResult};
pub use collision::Obstacle;
pub use engine::{GenerationMethod, GenerationRequest, GenerationResponse, TrajectoryEngine};
