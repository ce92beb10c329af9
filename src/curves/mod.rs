//! Stateless curve evaluators shared by the generators and the planner

pub mod bezier;
pub mod cubic_spline;

pub use bezier::{bezier_curve, bezier_curve_de_casteljau, bezier_point, de_casteljau};
pub use cubic_spline::{cubic_spline, uniform_cubic_spline, SplineBoundary};
