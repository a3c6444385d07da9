use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::direction::bucket_from_fraction;

/// A transient scatter-write into the disturbance field.
///
/// Coordinates are normalized: `position` in `[0,1]²` over the grid interior,
/// `direction_fraction` in `[0,1]` over a full turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceEvent {
    pub position: Vec2,
    pub direction_fraction: f32,
    pub magnitude: f32,
}

impl DisturbanceEvent {
    pub fn new(position: Vec2, direction_fraction: f32, magnitude: f32) -> Self {
        Self {
            position,
            direction_fraction,
            magnitude,
        }
    }

    /// Out-of-domain positions and non-finite values are rejected.
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        self.position.is_finite()
            && in_unit(self.position.x)
            && in_unit(self.position.y)
            && in_unit(self.direction_fraction)
            && self.magnitude.is_finite()
    }

    /// Interior cell `(x, y)` and bucket this event lands in, for an `n`-wide grid.
    ///
    /// Cell `i` covers the normalized interval `[i/n, (i+1)/n)`; 1.0 lands in the last cell.
    pub fn target_cell(&self, n: usize) -> (usize, usize, usize) {
        let last = n.saturating_sub(1);
        let cell = |v: f32| ((v * n as f32).floor() as usize).min(last);
        (
            cell(self.position.x),
            cell(self.position.y),
            bucket_from_fraction(self.direction_fraction),
        )
    }
}
