//! Spawning system - places the agent and the objective in random rooms

use floorplan_logic::geometry::{Rect, Vertex};
use floorplan_logic::layout::pick;
use floorplan_logic::scene::Scene;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Agent, Body, Heading, Objective, RoomTracker};
use crate::config::DriverConfig;
use crate::error::SimError;
use crate::systems::sense_room;

/// Random whole-unit point in `room`, keeping `inset` of its size clear on
/// every side.
pub fn spawn_point<R: Rng>(room: &Rect, inset: f32, rng: &mut R) -> Vertex {
    let x = pick(
        rng,
        room.x + room.width * inset,
        room.x + room.width * (1.0 - inset),
    );
    let y = pick(
        rng,
        room.y + room.height * inset,
        room.y + room.height * (1.0 - inset),
    );
    Vertex::new(x.trunc(), y.trunc())
}

fn clear_of_furniture(scene: &Scene, rect: &Rect) -> bool {
    scene.solid_boxes().all(|b| !b.overlaps(rect))
}

/// Box of the first entity carrying marker `M`.
fn marked_body<M: hecs::Component>(world: &World) -> Option<Rect> {
    let mut query = world.query::<&Body>().with::<&M>();
    let rect = query.iter().next().map(|(_, body)| body.rect);
    rect
}

/// Redraw a spawn until `accept` holds, at most `config.max_spawn_attempts`
/// times. Returns the accepted box.
fn draw_spawn<R: Rng>(
    what: &'static str,
    scene: &Scene,
    size: (f32, f32),
    config: &DriverConfig,
    rng: &mut R,
    accept: impl Fn(&Rect, &Rect) -> bool,
) -> Result<Rect, SimError> {
    if scene.rooms.is_empty() {
        return Err(SimError::EmptyScene);
    }
    for _ in 0..config.max_spawn_attempts {
        let room = scene.rooms[rng.gen_range(0..scene.rooms.len())].rect;
        let p = spawn_point(&room, config.spawn_inset, rng);
        let rect = Rect::new(p.x, p.y, size.0, size.1);
        if accept(&room, &rect) {
            return Ok(rect);
        }
    }
    log::warn!(
        "{} spawn failed after {} attempts",
        what,
        config.max_spawn_attempts
    );
    Err(SimError::SpawnFailed {
        what,
        attempts: config.max_spawn_attempts,
    })
}

/// Put the agent inside a random room, clear of furniture and of the
/// objective, facing the initial heading.
pub fn respawn_agent<R: Rng>(
    world: &mut World,
    agent: Entity,
    scene: &Scene,
    config: &DriverConfig,
    rng: &mut R,
) -> Result<(), SimError> {
    let size = {
        let body = world.get::<&Body>(agent)?;
        (body.rect.width, body.rect.height)
    };
    let objective = marked_body::<Objective>(world);
    let rect = draw_spawn("agent", scene, size, config, rng, |room, rect| {
        room.contains_rect(rect)
            && clear_of_furniture(scene, rect)
            && objective.map_or(true, |o| !o.overlaps(rect))
    })?;
    let body = Body { rect };
    let room = sense_room(scene, &body);
    *world.get::<&mut Body>(agent)? = body;
    *world.get::<&mut Heading>(agent)? = Heading::new(config.initial_heading);
    world.get::<&mut RoomTracker>(agent)?.last_room = room;
    Ok(())
}

/// Move the objective to a random room, clear of furniture and of the
/// agent. A capture therefore never repeats without the agent moving.
pub fn respawn_objective<R: Rng>(
    world: &mut World,
    objective: Entity,
    scene: &Scene,
    config: &DriverConfig,
    rng: &mut R,
) -> Result<(), SimError> {
    let size = {
        let body = world.get::<&Body>(objective)?;
        (body.rect.width, body.rect.height)
    };
    let agent = marked_body::<Agent>(world);
    let rect = draw_spawn("objective", scene, size, config, rng, |_, rect| {
        clear_of_furniture(scene, rect) && agent.map_or(true, |a| !a.overlaps(rect))
    })?;
    world.get::<&mut Body>(objective)?.rect = rect;
    Ok(())
}
