//! Disturbance events: the cross-thread queue, scatter into the field, and
//! the directional spread fan.

use std::sync::mpsc;

use glam::Vec2;
use wavegrid_common::{DIRECTIONS, DisturbanceEvent};

use crate::field::AmplitudeField;

/// Slerp steps per side of the spread fan.
const FAN_STEPS: usize = 4;

/// Cloneable handle for queueing events from other threads.
///
/// Queued events are applied at the start of the grid's next tick, in send order.
#[derive(Debug, Clone)]
pub struct DisturbanceSender {
    tx: mpsc::Sender<DisturbanceEvent>,
}

impl DisturbanceSender {
    /// Returns `false` once the grid has been dropped.
    pub fn send(&self, event: DisturbanceEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[derive(Debug)]
pub(crate) struct DisturbanceQueue {
    tx: mpsc::Sender<DisturbanceEvent>,
    rx: mpsc::Receiver<DisturbanceEvent>,
}

impl DisturbanceQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> DisturbanceSender {
        DisturbanceSender {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn drain(&self) -> mpsc::TryIter<'_, DisturbanceEvent> {
        self.rx.try_iter()
    }
}

/// Add `event.magnitude` to its target cell and bucket. Invalid events are ignored.
pub(crate) fn scatter(field: &mut AmplitudeField, event: &DisturbanceEvent) -> bool {
    if !event.is_valid() {
        return false;
    }
    let (x, y, bucket) = event.target_cell(field.resolution());
    field.add(x + 1, y + 1, bucket, event.magnitude);
    true
}

/// One event per direction bucket, each carrying the full magnitude.
pub fn omnidirectional(position: Vec2, magnitude: f32) -> [DisturbanceEvent; DIRECTIONS] {
    std::array::from_fn(|b| {
        DisturbanceEvent::new(position, (b as f32 + 0.5) / DIRECTIONS as f32, magnitude)
    })
}

/// Directions and weights of the spread fan around unit vector `dir`.
///
/// Two slerps from each perpendicular into `dir`; weights sum to one and the
/// centre direction carries twice the weight of each side direction.
pub fn spread_fan(dir: Vec2) -> Vec<(Vec2, f32)> {
    let side = dir.perp();
    let count = 2 * (FAN_STEPS + 1);
    let weight = 1.0 / count as f32;
    [-side, side]
        .into_iter()
        .flat_map(|from| {
            (0..=FAN_STEPS).map(move |i| (slerp(from, dir, i as f32 / FAN_STEPS as f32), weight))
        })
        .collect()
}

fn slerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    let angle = a.perp_dot(b).atan2(a.dot(b));
    Vec2::from_angle(angle * t).rotate(a)
}
