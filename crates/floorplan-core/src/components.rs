//! Components of the episode actors.
//!
//! The driver spawns exactly two entities: the agent
//! (`Agent, Body, Heading, RoomTracker`) and the objective
//! (`Objective, Body`).

use floorplan_logic::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Marker for the learning agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent;

/// Marker for the objective the agent searches for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective;

/// Axis-aligned box an actor occupies. `rect.x, rect.y` is its top-left
/// corner in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub rect: Rect,
}

impl Body {
    pub fn square(size: f32) -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, size, size),
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.rect.x = x;
        self.rect.y = y;
    }
}

/// Facing in whole degrees, kept in `[0, 360)`. 0° points to +x and 90° to
/// −y, so positive turns rotate counter-clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub degrees: u16,
}

impl Heading {
    pub fn new(degrees: u16) -> Self {
        Self {
            degrees: degrees % 360,
        }
    }

    pub fn turn(&mut self, delta: i32) {
        self.degrees = (i32::from(self.degrees) + delta).rem_euclid(360) as u16;
    }
}

/// Last room reported by the room sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTracker {
    pub last_room: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_wraps_both_ways() {
        let mut h = Heading::new(0);
        h.turn(-45);
        assert_eq!(h.degrees, 315);
        h.turn(90);
        assert_eq!(h.degrees, 45);
        assert_eq!(Heading::new(450).degrees, 90);
    }

    #[test]
    fn body_moves_by_top_left_corner() {
        let mut body = Body::square(8.0);
        body.move_to(10.0, 20.0);
        assert_eq!(body.rect, Rect::new(10.0, 20.0, 8.0, 8.0));
    }
}
