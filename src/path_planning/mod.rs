// Path generation algorithms module

pub mod perturbed;
pub mod bezier_path;
pub mod spline_path;
pub mod dubins_like;
pub mod rrt;

pub use perturbed::{perturbed_waypoints, Perturbation};
pub use bezier_path::{BezierConfig, BezierPathGenerator};
pub use spline_path::{SplineConfig, SplinePathGenerator};
pub use dubins_like::{DubinsConfig, DubinsLikePathGenerator};
pub use rrt::{PlanOutcome, PlanReport, RrtConfig, RrtPlanner};
