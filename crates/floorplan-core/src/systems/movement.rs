//! Movement system - applies actions to the agent and tracks its room

use floorplan_logic::geometry::Vertex;
use floorplan_logic::scene::Scene;
use hecs::World;

use crate::components::{Agent, Body, Heading, RoomTracker};
use crate::policy::Action;

const TURN_DEGREES: i32 = 45;

/// Unit displacement for a forward step at `heading`, in screen
/// coordinates (+y points down). Headings off the 45° grid do not move.
pub fn forward_step(heading: u16) -> (f32, f32) {
    match heading {
        0 => (1.0, 0.0),
        45 => (1.0, -1.0),
        90 => (0.0, -1.0),
        135 => (-1.0, -1.0),
        180 => (-1.0, 0.0),
        225 => (-1.0, 1.0),
        270 => (0.0, 1.0),
        315 => (1.0, 1.0),
        _ => (0.0, 0.0),
    }
}

/// Turn or step every agent.
pub fn apply_action(world: &mut World, action: Action, speed: f32) {
    for (_, (body, heading)) in world
        .query_mut::<(&mut Body, &mut Heading)>()
        .with::<&Agent>()
    {
        match action {
            Action::TurnLeft => heading.turn(TURN_DEGREES),
            Action::TurnRight => heading.turn(-TURN_DEGREES),
            Action::Forward => {
                let (dx, dy) = forward_step(heading.degrees);
                body.rect.x += dx * speed;
                body.rect.y += dy * speed;
            }
        }
    }
}

/// Room whose interior holds the top-left corner of `body`.
pub fn sense_room(scene: &Scene, body: &Body) -> Option<usize> {
    scene.room_containing(Vertex::new(body.rect.x, body.rect.y))
}

/// Update each agent's room and report whether any agent changed room.
pub fn room_sensor_system(world: &mut World, scene: &Scene) -> bool {
    let mut changed = false;
    for (_, (body, tracker)) in world
        .query_mut::<(&Body, &mut RoomTracker)>()
        .with::<&Agent>()
    {
        let room = sense_room(scene, body);
        if room != tracker.last_room {
            log::debug!("room change {:?} -> {:?}", tracker.last_room, room);
            tracker.last_room = room;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_logic::geometry::Rect;
    use floorplan_logic::scene::{Door, Room, RoomType, Side};

    fn spawn_agent(world: &mut World, x: f32, y: f32, heading: u16) -> hecs::Entity {
        world.spawn((
            Agent,
            Body {
                rect: Rect::new(x, y, 8.0, 8.0),
            },
            Heading::new(heading),
            RoomTracker::default(),
        ))
    }

    fn one_room() -> Scene {
        let mut scene = Scene::new(300.0, 300.0, 8.5, 8.5);
        scene.rooms.push(Room {
            index: 0,
            room_type: RoomType::Hall,
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            door: Door {
                rect: Rect::new(100.0, 40.0, 0.0, 21.25),
                side: Side::East,
            },
            furniture: Vec::new(),
        });
        scene
    }

    #[test]
    fn forward_follows_the_eight_way_table() {
        let cases = [
            (90, (50.0, 48.0)),
            (270, (50.0, 52.0)),
            (180, (48.0, 50.0)),
            (0, (52.0, 50.0)),
            (45, (52.0, 48.0)),
            (135, (48.0, 48.0)),
            (225, (48.0, 52.0)),
            (315, (52.0, 52.0)),
        ];
        for (heading, (x, y)) in cases {
            let mut world = World::new();
            let agent = spawn_agent(&mut world, 50.0, 50.0, heading);
            apply_action(&mut world, Action::Forward, 2.0);
            let body = world.get::<&Body>(agent).unwrap();
            assert_eq!((body.rect.x, body.rect.y), (x, y), "heading {}", heading);
        }
    }

    #[test]
    fn turns_change_heading_only() {
        let mut world = World::new();
        let agent = spawn_agent(&mut world, 50.0, 50.0, 90);
        apply_action(&mut world, Action::TurnLeft, 2.0);
        assert_eq!(world.get::<&Heading>(agent).unwrap().degrees, 135);
        apply_action(&mut world, Action::TurnRight, 2.0);
        apply_action(&mut world, Action::TurnRight, 2.0);
        assert_eq!(world.get::<&Heading>(agent).unwrap().degrees, 45);
        assert_eq!(world.get::<&Body>(agent).unwrap().rect.x, 50.0);
    }

    #[test]
    fn objective_is_not_moved() {
        let mut world = World::new();
        spawn_agent(&mut world, 50.0, 50.0, 0);
        let objective = world.spawn((
            crate::components::Objective,
            Body {
                rect: Rect::new(10.0, 10.0, 15.0, 15.0),
            },
            Heading::new(0),
        ));
        apply_action(&mut world, Action::Forward, 2.0);
        assert_eq!(world.get::<&Body>(objective).unwrap().rect.x, 10.0);
    }

    #[test]
    fn sensor_reports_room_crossings_once() {
        let scene = one_room();
        let mut world = World::new();
        let agent = spawn_agent(&mut world, 50.0, 50.0, 0);
        assert!(room_sensor_system(&mut world, &scene));
        assert!(!room_sensor_system(&mut world, &scene));
        assert_eq!(world.get::<&RoomTracker>(agent).unwrap().last_room, Some(0));

        world.get::<&mut Body>(agent).unwrap().rect.x = 100.0;
        assert!(room_sensor_system(&mut world, &scene));
        assert_eq!(world.get::<&RoomTracker>(agent).unwrap().last_room, None);
    }
}
