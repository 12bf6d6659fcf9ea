//! Ray-fan perception.
//!
//! The agent sees through [`RAY_COUNT`] rays spread over [`ANGLE_RANGE`]
//! degrees around its facing, each [`RAY_LENGTH`] world units long and cast
//! from the agent's center. Every ray reports the nearest thing it hits:
//! a room wall (door openings let rays through), a furniture item or
//! sub-item, the floor boundary where it runs outside all rooms, or the
//! objective.
//!
//! Angles follow screen convention: 0° points to +x, 90° to −y.

use crate::geometry::{
    closest_box_intersection, closest_room_intersection, point_distance, Rect, Segment, Vertex,
};
use crate::scene::Scene;

pub const ANGLE_RANGE: u32 = 120;
pub const ANGLE_STEP: u32 = 3;
pub const RAY_LENGTH: f32 = 220.0;
pub const RAY_COUNT: usize = (ANGLE_RANGE / ANGLE_STEP) as usize;

/// Read-only view of everything perception needs for one query.
#[derive(Debug, Clone, Copy)]
pub struct SceneSnapshot<'a> {
    pub scene: &'a Scene,
    pub agent: Rect,
    /// Facing in degrees.
    pub facing: f32,
    pub objective: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayReading {
    /// Direction the ray was cast in, `[0, 360)`.
    pub degrees: f32,
    /// `degrees / 359`.
    pub angle: f32,
    /// Hit distance over [`RAY_LENGTH`]; 1.0 when nothing was hit.
    pub distance: f32,
    /// The nearest hit belongs to the objective.
    pub objective: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// One reading per ray, from `facing + 60°` down to `facing − 57°`.
    pub rays: Vec<RayReading>,
    /// Some ray's nearest hit is the objective.
    pub sees_objective: bool,
}

impl Observation {
    /// `(angle, distance, objective)` triples, the policy input.
    pub fn features(&self) -> Vec<[f32; 3]> {
        self.rays
            .iter()
            .map(|r| [r.angle, r.distance, if r.objective { 1.0 } else { 0.0 }])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }
}

/// Nearest hit so far; earlier candidates win ties.
struct Nearest {
    origin: Vertex,
    best: Option<(f32, bool)>,
}

impl Nearest {
    fn offer(&mut self, hit: Option<Vertex>, objective: bool) {
        let Some(p) = hit else { return };
        let d = point_distance(self.origin, p);
        // The objective wins exact ties: it is seen where it touches a wall.
        match self.best {
            Some((best, _)) if d > best || (d == best && !objective) => {}
            _ => self.best = Some((d, objective)),
        }
    }
}

/// The ray at `degrees` from the agent's center.
pub fn ray_segment(origin: Vertex, degrees: f32) -> Segment {
    let rad = degrees.to_radians();
    Segment::new(
        origin,
        Vertex::new(origin.x + rad.cos() * RAY_LENGTH, origin.y - rad.sin() * RAY_LENGTH),
    )
}

/// Cast one ray and report its nearest hit.
pub fn cast_ray(snapshot: &SceneSnapshot<'_>, degrees: f32) -> RayReading {
    let scene = snapshot.scene;
    let origin = snapshot.agent.center();
    let ray = ray_segment(origin, degrees);
    let mut nearest = Nearest { origin, best: None };

    for (index, room) in scene.rooms.iter().enumerate() {
        nearest.offer(
            closest_room_intersection(&ray, &room.rect, &scene.door_opening(index)),
            false,
        );
        for &id in &room.furniture {
            let item = scene.object(id);
            nearest.offer(closest_box_intersection(&ray, &item.rect), false);
            for child in scene.children(id) {
                nearest.offer(closest_box_intersection(&ray, &child.rect), false);
            }
        }
    }

    // The floor outline only counts where it runs outside every room.
    if let Some(p) = closest_box_intersection(&ray, &scene.floor) {
        if !scene.any_room_contains(p) {
            nearest.offer(Some(p), false);
        }
    }
    nearest.offer(closest_box_intersection(&ray, &snapshot.objective), true);

    let (distance, objective) = match nearest.best {
        Some((d, objective)) => (d / RAY_LENGTH, objective),
        None => (1.0, false),
    };
    RayReading {
        degrees,
        angle: degrees / 359.0,
        distance,
        objective,
    }
}

/// Direction of ray `i`, wrapped to `[0, 360)`.
pub fn ray_degrees(facing: f32, i: usize) -> f32 {
    let half = (ANGLE_RANGE / 2) as f32;
    (facing + half - (ANGLE_STEP as usize * i) as f32).rem_euclid(360.0)
}

/// Cast the full fan, sweeping clockwise from `facing + 60°`.
pub fn project_segments(snapshot: &SceneSnapshot<'_>) -> Observation {
    let rays: Vec<RayReading> = (0..RAY_COUNT)
        .map(|i| cast_ray(snapshot, ray_degrees(snapshot.facing, i)))
        .collect();
    let sees_objective = rays.iter().any(|r| r.objective);
    Observation {
        rays,
        sees_objective,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Door, FurnitureKind, Orientation, Room, RoomType, Side};
    use approx::assert_relative_eq;

    /// Room 0 spans (0,0)-(200,200) with a door on its east wall around
    /// y = 100. Room 1 sits 30 units further east.
    fn two_rooms() -> Scene {
        let mut scene = Scene::new(400.0, 400.0, 8.5, 8.5);
        scene.rooms.push(Room {
            index: 0,
            room_type: RoomType::Hall,
            rect: Rect::new(0.0, 0.0, 200.0, 200.0),
            door: Door {
                rect: Rect::new(200.0, 90.0, 0.0, 21.25),
                side: Side::East,
            },
            furniture: Vec::new(),
        });
        scene.rooms.push(Room {
            index: 1,
            room_type: RoomType::Kitchen,
            rect: Rect::new(230.0, 0.0, 100.0, 200.0),
            door: Door {
                rect: Rect::new(230.0, 10.0, 0.0, 21.25),
                side: Side::West,
            },
            furniture: Vec::new(),
        });
        scene
    }

    fn agent_at(x: f32, y: f32) -> Rect {
        Rect::new(x - 4.0, y - 4.0, 8.0, 8.0)
    }

    fn far_objective() -> Rect {
        Rect::new(1000.0, 1000.0, 15.0, 15.0)
    }

    #[test]
    fn objective_wins_distance_ties() {
        let origin = Vertex::new(0.0, 0.0);
        let wall = Vertex::new(30.0, 40.0);
        let mut nearest = Nearest { origin, best: None };
        nearest.offer(Some(wall), false);
        nearest.offer(Some(wall), true);
        assert_eq!(nearest.best, Some((50.0, true)));

        // A later wall at the same distance does not take it back.
        nearest.offer(Some(Vertex::new(40.0, 30.0)), false);
        assert_eq!(nearest.best, Some((50.0, true)));

        nearest.offer(Some(Vertex::new(0.0, 60.0)), true);
        assert_eq!(nearest.best, Some((50.0, true)));
    }

    /// Hit points snap to whole units, so distances carry up to one unit
    /// of truncation error.
    fn assert_hit_at(reading: &RayReading, world: f32) {
        assert_relative_eq!(reading.distance, world / RAY_LENGTH, epsilon = 1.01 / RAY_LENGTH);
    }

    #[test]
    fn fan_has_forty_rays_in_three_degree_steps() {
        let scene = two_rooms();
        let snapshot = SceneSnapshot {
            scene: &scene,
            agent: agent_at(100.0, 100.0),
            facing: 90.0,
            objective: far_objective(),
        };
        let obs = project_segments(&snapshot);
        assert_eq!(obs.len(), RAY_COUNT);
        assert_eq!(obs.rays[0].degrees, 150.0);
        assert_eq!(obs.rays[39].degrees, 33.0);
        for pair in obs.rays.windows(2) {
            assert_relative_eq!(pair[0].degrees - pair[1].degrees, 3.0);
        }
        assert_eq!(obs, project_segments(&snapshot));
    }

    #[test]
    fn ray_angles_wrap_around_zero() {
        assert_eq!(ray_degrees(0.0, 0), 60.0);
        assert_eq!(ray_degrees(0.0, 20), 0.0);
        assert_eq!(ray_degrees(0.0, 21), 357.0);
        assert_eq!(ray_degrees(315.0, 0), 15.0);
    }

    #[test]
    fn ray_through_door_reaches_next_room() {
        let scene = two_rooms();
        let snapshot = SceneSnapshot {
            scene: &scene,
            agent: agent_at(100.0, 100.0),
            facing: 0.0,
            objective: far_objective(),
        };
        let ahead = cast_ray(&snapshot, 0.0);
        // East wall at x = 200 is skipped; room 1's west wall at x = 230.
        assert_hit_at(&ahead, 130.0);
        assert!(!ahead.objective);

        // Below the door the wall blocks.
        let low = SceneSnapshot {
            agent: agent_at(100.0, 150.0),
            ..snapshot
        };
        assert_hit_at(&cast_ray(&low, 0.0), 100.0);
    }

    #[test]
    fn empty_scene_reports_max_range() {
        let scene = Scene::new(100.0, 100.0, 1.0, 1.0);
        let snapshot = SceneSnapshot {
            scene: &scene,
            agent: agent_at(500.0, 500.0),
            facing: 90.0,
            objective: far_objective(),
        };
        let obs = project_segments(&snapshot);
        assert!(obs.rays.iter().all(|r| r.distance == 1.0 && !r.objective));
        assert!(!obs.sees_objective);
        assert_relative_eq!(obs.rays[0].angle, 150.0 / 359.0);
    }

    #[test]
    fn objective_in_front_is_flagged() {
        let scene = two_rooms();
        let snapshot = SceneSnapshot {
            scene: &scene,
            agent: agent_at(100.0, 100.0),
            facing: 0.0,
            objective: Rect::new(150.0, 90.0, 15.0, 15.0),
        };
        let obs = project_segments(&snapshot);
        assert!(obs.sees_objective);
        let center = &obs.rays[20];
        assert!(center.objective);
        assert_hit_at(center, 50.0);
        // Rays pointing away from it see walls.
        assert!(!obs.rays[0].objective);
        let features = obs.features();
        assert_eq!(features.len(), RAY_COUNT);
        assert_eq!(features[20][0], 0.0);
        assert_eq!(features[20][2], 1.0);
        assert_eq!(features[0][2], 0.0);
    }

    #[test]
    fn furniture_occludes_the_objective() {
        let mut scene = two_rooms();
        scene.add_object(
            0,
            None,
            FurnitureKind::Table,
            Rect::new(130.0, 80.0, 10.0, 40.0),
            Orientation::N,
        );
        let snapshot = SceneSnapshot {
            scene: &scene,
            agent: agent_at(100.0, 100.0),
            facing: 0.0,
            objective: Rect::new(150.0, 90.0, 15.0, 15.0),
        };
        let ahead = cast_ray(&snapshot, 0.0);
        assert!(!ahead.objective);
        assert_hit_at(&ahead, 30.0);
    }

    #[test]
    fn floor_outline_only_counts_outside_rooms() {
        let mut scene = two_rooms();
        scene.floor = Rect::new(180.0, 60.0, 70.0, 80.0);
        // Outside every room, the floor's east edge is visible.
        let outside = SceneSnapshot {
            scene: &scene,
            agent: agent_at(215.0, 100.0),
            facing: 90.0,
            objective: far_objective(),
        };
        // Straight up (−y) from (215, 100) meets the floor's y = 60 edge.
        assert_hit_at(&cast_ray(&outside, 90.0), 40.0);

        // From inside room 0 the floor's west edge at x = 180 lies in the
        // room and is ignored; the ray stops at room 1 instead.
        let inside = SceneSnapshot {
            agent: agent_at(100.0, 100.0),
            ..outside
        };
        assert_hit_at(&cast_ray(&inside, 0.0), 130.0);
    }
}
