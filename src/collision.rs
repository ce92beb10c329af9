//! Spherical obstacles and discrete collision predicates
//!
//! Segment checks test a fixed number of evenly spaced points, so a
//! negative answer is probabilistic: a thin sliver of a sphere lying
//! between two samples can be missed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{BoundingBox, TrajectoryError, TrajectoryResult, Waypoint};

/// Obstacles are kept at least this far from start and end when generated
pub const OBSTACLE_SAFE_RADIUS: f64 = 150.0;
/// Radius range of generated obstacles [m]
pub const OBSTACLE_RADIUS_RANGE: (f64, f64) = (30.0, 80.0);

/// Sphere obstacle (center, radius)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub center: Waypoint,
    pub radius: f64,
}

#[derive(Deserialize)]
struct RawObstacle {
    center: Waypoint,
    radius: f64,
}

impl<'de> Deserialize<'de> for Obstacle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawObstacle::deserialize(deserializer)?;
        Obstacle::new(raw.center, raw.radius).map_err(serde::de::Error::custom)
    }
}

impl Obstacle {
    pub fn new(center: Waypoint, radius: f64) -> TrajectoryResult<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(TrajectoryError::invalid(format!(
                "obstacle radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self { center, radius })
    }

    /// Signed distance from `p` to the sphere surface (negative inside)
    pub fn clearance(&self, p: &Waypoint) -> f64 {
        p.distance(&self.center) - self.radius
    }

    pub fn contains(&self, p: &Waypoint) -> bool {
        self.contains_with_margin(p, 0.0)
    }

    pub fn contains_with_margin(&self, p: &Waypoint, margin: f64) -> bool {
        p.distance(&self.center) < self.radius + margin
    }
}

/// True when any obstacle contains `p`
pub fn point_collides(p: &Waypoint, obstacles: &[Obstacle], margin: f64) -> bool {
    obstacles.iter().any(|obs| obs.contains_with_margin(p, margin))
}

/// Check `n_checks` evenly spaced points on the segment `a`-`b`, ends included.
pub fn segment_collides(
    a: &Waypoint,
    b: &Waypoint,
    obstacles: &[Obstacle],
    n_checks: usize,
    margin: f64,
) -> bool {
    if obstacles.is_empty() {
        return false;
    }
    let n = n_checks.max(2);
    (0..n)
        .map(|i| a.lerp(b, i as f64 / (n - 1) as f64))
        .any(|p| point_collides(&p, obstacles, margin))
}

/// Uniformly random waypoint inside `bounds`
pub fn random_waypoint<R: Rng + ?Sized>(bounds: &BoundingBox, rng: &mut R) -> Waypoint {
    Waypoint::new(
        rng.gen_range(bounds.min.x..=bounds.max.x),
        rng.gen_range(bounds.min.y..=bounds.max.y),
        rng.gen_range(bounds.min.z..=bounds.max.z),
    )
}

/// Random obstacle field that keeps clear of the start and end regions.
///
/// Centres are rejection-sampled inside `bounds` until they lie more than
/// [`OBSTACLE_SAFE_RADIUS`] from both `start` and `end`; at most
/// `max_attempts` draws are made per obstacle.
pub fn generate_obstacles<R: Rng + ?Sized>(
    n_obstacles: usize,
    start: &Waypoint,
    end: &Waypoint,
    bounds: &BoundingBox,
    rng: &mut R,
) -> TrajectoryResult<Vec<Obstacle>> {
    bounds.validate()?;
    let max_attempts = 10_000;
    let mut obstacles = Vec::with_capacity(n_obstacles);
    for _ in 0..n_obstacles {
        let center = (0..max_attempts)
            .map(|_| random_waypoint(bounds, rng))
            .find(|c| {
                c.distance(start) > OBSTACLE_SAFE_RADIUS && c.distance(end) > OBSTACLE_SAFE_RADIUS
            })
            .ok_or_else(|| {
                TrajectoryError::invalid(
                    "bounding box leaves no room for obstacles away from start and end",
                )
            })?;
        let radius = rng.gen_range(OBSTACLE_RADIUS_RANGE.0..OBSTACLE_RADIUS_RANGE.1);
        obstacles.push(Obstacle { center, radius });
    }
    Ok(obstacles)
}
