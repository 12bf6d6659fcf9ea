//! Collision system - agent against furniture, floor and objective

use floorplan_logic::geometry::Rect;
use floorplan_logic::scene::{ObjectId, Scene};
use hecs::World;

use crate::components::{Agent, Body, Objective};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// The agent overlaps a furniture item or sub-item.
    Furniture(ObjectId),
    /// The agent is in no room and not fully on the floor.
    OutsideFloor,
}

/// Test an agent box against the scene.
///
/// Inside a room (boundary included) only that room's furniture can be hit.
/// Outside every room the agent must stay within the floor.
pub fn agent_collision(scene: &Scene, agent: &Rect) -> Option<Collision> {
    let mut in_room = false;
    for (index, room) in scene.rooms.iter().enumerate() {
        if !room.rect.contains_rect(agent) {
            continue;
        }
        in_room = true;
        for id in scene.furniture_tree(index) {
            if scene.object(id).rect.overlaps(agent) {
                return Some(Collision::Furniture(id));
            }
        }
    }
    if !in_room && !scene.floor.contains_rect(agent) {
        return Some(Collision::OutsideFloor);
    }
    None
}

/// First collision of any agent.
pub fn collision_system(world: &World, scene: &Scene) -> Option<Collision> {
    let mut query = world.query::<&Body>().with::<&Agent>();
    let hit = query
        .iter()
        .find_map(|(_, body)| agent_collision(scene, &body.rect));
    if let Some(collision) = hit {
        log::debug!("agent collision: {:?}", collision);
    }
    hit
}

/// Whether any agent overlaps any objective.
pub fn objective_reached(world: &World) -> bool {
    let mut agents = world.query::<&Body>().with::<&Agent>();
    let mut objectives = world.query::<&Body>().with::<&Objective>();
    let targets: Vec<Rect> = objectives.iter().map(|(_, b)| b.rect).collect();
    let reached = agents
        .iter()
        .any(|(_, a)| targets.iter().any(|t| t.overlaps(&a.rect)));
    reached
}
