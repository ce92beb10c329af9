//! Common types used throughout trajectory_engine

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::common::error::{TrajectoryError, TrajectoryResult};

/// 3D waypoint in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn distance(&self, other: &Waypoint) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Linear interpolation: `self * (1 - alpha) + other * alpha`
    pub fn lerp(&self, other: &Waypoint, alpha: f64) -> Waypoint {
        (self.to_vector() * (1.0 - alpha) + other.to_vector() * alpha).into()
    }

    pub fn midpoint(&self, other: &Waypoint) -> Waypoint {
        self.lerp(other, 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Waypoint {
    fn from(a: [f64; 3]) -> Self {
        Self { x: a[0], y: a[1], z: a[2] }
    }
}

impl From<(f64, f64, f64)> for Waypoint {
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1, z: tuple.2 }
    }
}

impl From<Vector3<f64>> for Waypoint {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], z: v[2] }
    }
}

/// Axis-aligned box that bounds sampling and control-point placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: Waypoint,
    pub max: Waypoint,
}

#[derive(Deserialize)]
struct RawBoundingBox {
    min: Waypoint,
    max: Waypoint,
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBoundingBox::deserialize(deserializer)?;
        BoundingBox::new(raw.min, raw.max).map_err(serde::de::Error::custom)
    }
}

impl BoundingBox {
    pub fn new(min: Waypoint, max: Waypoint) -> TrajectoryResult<Self> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Corners must be finite and `min <= max` on every axis.
    pub fn validate(&self) -> TrajectoryResult<()> {
        let (min, max) = (&self.min, &self.max);
        if !min.is_finite() || !max.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "bounding box corners must be finite, got {:?} and {:?}",
                min, max
            )));
        }
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(TrajectoryError::invalid(format!(
                "bounding box min {:?} exceeds max {:?}",
                min, max
            )));
        }
        Ok(())
    }

    pub fn clamp(&self, p: &Waypoint) -> Waypoint {
        Waypoint::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    pub fn contains(&self, p: &Waypoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Waypoint::new(-1000.0, -1000.0, 50.0),
            max: Waypoint::new(1000.0, 1000.0, 500.0),
        }
    }
}

/// Ordered sequence of at least two waypoints from start to end.
///
/// Storage is private; a trajectory is never mutated once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Waypoint>", into = "Vec<Waypoint>")]
pub struct Trajectory {
    waypoints: Vec<Waypoint>,
}

impl Trajectory {
    pub fn new(waypoints: Vec<Waypoint>) -> TrajectoryResult<Self> {
        if waypoints.len() < 2 {
            return Err(TrajectoryError::invalid(format!(
                "trajectory needs at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        Ok(Self { waypoints })
    }

    pub fn from_arrays(points: &[[f64; 3]]) -> TrajectoryResult<Self> {
        Self::new(points.iter().copied().map(Waypoint::from).collect())
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false: construction rejects fewer than two waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> Waypoint {
        self.waypoints[0]
    }

    pub fn last(&self) -> Waypoint {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }

    pub fn to_arrays(&self) -> Vec<[f64; 3]> {
        self.waypoints.iter().map(Waypoint::to_array).collect()
    }

    pub fn total_length(&self) -> f64 {
        self.waypoints.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl TryFrom<Vec<Waypoint>> for Trajectory {
    type Error = TrajectoryError;

    fn try_from(waypoints: Vec<Waypoint>) -> TrajectoryResult<Self> {
        Self::new(waypoints)
    }
}

impl From<Trajectory> for Vec<Waypoint> {
    fn from(t: Trajectory) -> Self {
        t.waypoints
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

/// `n` evenly spaced values in `[0, 1]`, both ends included.
pub fn linspace01(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}
