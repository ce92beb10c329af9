// Cubic spline interpolation through 3D waypoints
//
// Each axis is an independent 1D spline over the same knot vector.
// Coefficients follow the usual a + b*dx + c*dx^2 + d*dx^3 form with the
// c-coefficients solved from a tridiagonal system.

extern crate nalgebra as na;

use serde::{Deserialize, Serialize};

use crate::common::{linspace01, Trajectory, TrajectoryError, TrajectoryResult, Waypoint};

/// End condition of the spline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplineBoundary {
    /// Zero second derivative at both ends
    Natural,
    /// Zero first derivative at both ends (end tangents pinned)
    Clamped,
}

#[derive(Debug, Clone)]
struct Spline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl Spline {
    fn new(x: &[f64], y: &[f64], boundary: SplineBoundary) -> TrajectoryResult<Spline> {
        let nx = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();
        let a_mat = Spline::calc_a(&h, boundary);
        let b_vec = Spline::calc_b(&h, &a, boundary);

        let c_na = a_mat
            .lu()
            .solve(&b_vec)
            .ok_or_else(|| TrajectoryError::Numerical("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().copied().collect();

        let mut b = Vec::with_capacity(nx - 1);
        let mut d = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(Spline { a, b, c, d, x: x.to_vec() })
    }

    fn calc(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    // Segment containing t; out-of-range values use the first/last piece.
    fn search_index(&self, t: f64) -> usize {
        let last_segment = self.x.len() - 2;
        self.x.partition_point(|&k| k <= t).saturating_sub(1).min(last_segment)
    }

    fn calc_a(h: &[f64], boundary: SplineBoundary) -> na::DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = na::DMatrix::zeros(nx, nx);
        for i in 1..nx - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
        }
        match boundary {
            SplineBoundary::Natural => {
                a[(0, 0)] = 1.0;
                a[(nx - 1, nx - 1)] = 1.0;
            }
            SplineBoundary::Clamped => {
                a[(0, 0)] = 2.0 * h[0];
                a[(0, 1)] = h[0];
                a[(nx - 1, nx - 2)] = h[nx - 2];
                a[(nx - 1, nx - 1)] = 2.0 * h[nx - 2];
            }
        }
        a
    }

    fn calc_b(h: &[f64], a: &[f64], boundary: SplineBoundary) -> na::DVector<f64> {
        let nx = h.len() + 1;
        let mut b = na::DVector::zeros(nx);
        for i in 0..nx - 2 {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        if boundary == SplineBoundary::Clamped {
            b[0] = 3.0 * (a[1] - a[0]) / h[0];
            b[nx - 1] = -3.0 * (a[nx - 1] - a[nx - 2]) / h[nx - 2];
        }
        b
    }
}

/// Per-axis cubic spline through `waypoints` placed at `knots`, sampled at `sample_positions`.
pub fn cubic_spline(
    waypoints: &[Waypoint],
    knots: &[f64],
    sample_positions: &[f64],
    boundary: SplineBoundary,
) -> TrajectoryResult<Trajectory> {
    if waypoints.len() < 2 {
        return Err(TrajectoryError::invalid(format!(
            "cubic spline needs at least 2 waypoints, got {}",
            waypoints.len()
        )));
    }
    if knots.len() != waypoints.len() {
        return Err(TrajectoryError::invalid(format!(
            "{} knots given for {} waypoints",
            knots.len(),
            waypoints.len()
        )));
    }
    if knots.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(TrajectoryError::invalid("spline knots must be strictly increasing"));
    }

    let xs: Vec<f64> = waypoints.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = waypoints.iter().map(|p| p.y).collect();
    let zs: Vec<f64> = waypoints.iter().map(|p| p.z).collect();
    let sx = Spline::new(knots, &xs, boundary)?;
    let sy = Spline::new(knots, &ys, boundary)?;
    let sz = Spline::new(knots, &zs, boundary)?;

    Trajectory::new(
        sample_positions
            .iter()
            .map(|&t| Waypoint::new(sx.calc(t), sy.calc(t), sz.calc(t)))
            .collect(),
    )
}

/// Spline with knots evenly spaced in `[0, 1]`, sampled at `n_samples` even positions.
pub fn uniform_cubic_spline(
    waypoints: &[Waypoint],
    n_samples: usize,
    boundary: SplineBoundary,
) -> TrajectoryResult<Trajectory> {
    cubic_spline(waypoints, &linspace01(waypoints.len()), &linspace01(n_samples), boundary)
}
