//! Door navigation - the rule-based door-crossing override
//!
//! Doors are matched center to center against the agent through a
//! [`DoorWindow`]. Once a crossing is committed the agent is moved just
//! past the door center, facing through it.

use floorplan_logic::geometry::{point_distance, Rect};
use floorplan_logic::scene::Scene;
use hecs::{Entity, World};

use crate::components::{Body, Heading};
use crate::config::DoorWindow;
use crate::error::SimError;

/// Distance from the door line the agent is placed at when crossing.
const CROSSING_OFFSET: f32 = 2.0;
/// Below this a door dimension counts as zero.
const FLAT: f32 = 0.5;

/// Whether `door` lies inside `window` around `agent`.
pub fn door_within(agent: &Rect, door: &Rect, window: DoorWindow) -> bool {
    let (a, d) = (agent.center(), door.center());
    let (dx, dy) = ((a.x - d.x).abs(), (a.y - d.y).abs());
    (dx < window.depth && dy < window.lateral) || (dy < window.depth && dx < window.lateral)
}

/// Some door of the scene lies inside `window`.
pub fn door_in_front(scene: &Scene, agent: &Rect, window: DoorWindow) -> bool {
    scene
        .rooms
        .iter()
        .any(|room| door_within(agent, &room.door.rect, window))
}

/// The door inside `window` nearest to the agent, first in room order on
/// ties.
pub fn closest_door(scene: &Scene, agent: &Rect, window: DoorWindow) -> Option<Rect> {
    let center = agent.center();
    let mut best: Option<(f32, Rect)> = None;
    for room in &scene.rooms {
        let door = room.door.rect;
        if !door_within(agent, &door, window) {
            continue;
        }
        let d = point_distance(center, door.center());
        if best.map_or(true, |(b, _)| d < b) {
            best = Some((d, door));
        }
    }
    best.map(|(_, door)| door)
}

/// Pose that carries an agent at `agent` across `door`, or `None` when the
/// agent is level with the door line.
pub fn crossing_pose(agent: &Rect, door: &Rect) -> Option<(f32, f32, u16)> {
    let dx = agent.x - door.x;
    let dy = agent.y - door.y;
    if door.width < FLAT {
        let y = (door.y + door.height / 2.0).trunc();
        if dx > 0.0 {
            Some(((door.x - CROSSING_OFFSET).trunc(), y, 180))
        } else if dx < 0.0 {
            Some(((door.x + CROSSING_OFFSET).trunc(), y, 0))
        } else {
            None
        }
    } else if door.height < FLAT {
        let x = (door.x + door.width / 2.0).trunc();
        if dy > 0.0 {
            Some((x, (door.y - CROSSING_OFFSET).trunc(), 90))
        } else if dy < 0.0 {
            Some((x, (door.y + CROSSING_OFFSET).trunc(), 270))
        } else {
            None
        }
    } else {
        None
    }
}

/// Move `agent` across `door`. Returns whether the agent was moved.
pub fn cross_door(world: &mut World, agent: Entity, door: &Rect) -> Result<bool, SimError> {
    let rect = world.get::<&Body>(agent)?.rect;
    let Some((x, y, degrees)) = crossing_pose(&rect, door) else {
        return Ok(false);
    };
    world.get::<&mut Body>(agent)?.move_to(x, y);
    *world.get::<&mut Heading>(agent)? = Heading::new(degrees);
    log::debug!("crossed door at ({}, {}) heading {}", x, y, degrees);
    Ok(true)
}
