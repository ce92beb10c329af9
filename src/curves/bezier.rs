// Bezier curve evaluation in 3D.
//
// Bernstein form for the generators, De Casteljau as the numerically
// stable reference used for high-degree control polygons.

use crate::common::{Trajectory, TrajectoryError, TrajectoryResult, Waypoint};

// Binomial coefficient calculation
pub fn binomial_coefficient(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    if k == 0 || k == n {
        return 1.0;
    }

    let k = if k > n - k { n - k } else { k }; // Take advantage of symmetry

    let mut result = 1.0;
    for i in 0..k {
        result *= (n - i) as f64;
        result /= (i + 1) as f64;
    }
    result
}

// Bernstein polynomial b_{i,n}(t)
pub fn bernstein_poly(n: usize, i: usize, t: f64) -> f64 {
    binomial_coefficient(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

/// One point on the curve as the Bernstein-weighted sum of control points.
pub fn bezier_point(t: f64, control_points: &[Waypoint]) -> Waypoint {
    let n = control_points.len().saturating_sub(1);
    control_points
        .iter()
        .enumerate()
        .map(|(i, p)| p.to_vector() * bernstein_poly(n, i, t))
        .sum::<nalgebra::Vector3<f64>>()
        .into()
}

/// One point on the curve by repeated linear interpolation.
pub fn de_casteljau(t: f64, control_points: &[Waypoint]) -> Waypoint {
    let mut points: Vec<Waypoint> = control_points.to_vec();
    let n = points.len();
    for level in 1..n {
        for j in 0..n - level {
            points[j] = points[j].lerp(&points[j + 1], t);
        }
    }
    points.first().copied().unwrap_or_else(Waypoint::origin)
}

fn check_control_points(control_points: &[Waypoint]) -> TrajectoryResult<()> {
    if control_points.len() < 2 {
        return Err(TrajectoryError::invalid(format!(
            "bezier curve needs at least 2 control points, got {}",
            control_points.len()
        )));
    }
    Ok(())
}

/// Evaluate the curve of degree `control_points.len() - 1` at every parameter value.
///
/// Parameter values are expected in `[0, 1]`; values outside extend the polynomial.
pub fn bezier_curve(
    control_points: &[Waypoint],
    parameter_values: &[f64],
) -> TrajectoryResult<Trajectory> {
    check_control_points(control_points)?;
    Trajectory::new(
        parameter_values
            .iter()
            .map(|&t| bezier_point(t, control_points))
            .collect(),
    )
}

/// Same as [`bezier_curve`] but evaluated with De Casteljau's algorithm.
pub fn bezier_curve_de_casteljau(
    control_points: &[Waypoint],
    parameter_values: &[f64],
) -> TrajectoryResult<Trajectory> {
    check_control_points(control_points)?;
    Trajectory::new(
        parameter_values
            .iter()
            .map(|&t| de_casteljau(t, control_points))
            .collect(),
    )
}
