//! Room shell: room boxes, barycenter, floor hub and doors.

use rand::Rng;

use super::pick;
use crate::config::LayoutConfig;
use crate::geometry::{Rect, Segment, Vertex};
use crate::scene::{barycenter_of, nearest_index, Door, RoomType, Side};
use crate::solver::{Constraint, Problem};

/// Width and height range of a room type, in units.
pub fn size_range(room_type: RoomType) -> (f32, f32) {
    match room_type {
        RoomType::Bedroom => (12.0, 17.0),
        RoomType::Bathroom => (8.0, 12.0),
        RoomType::Kitchen => (10.0, 15.0),
        RoomType::Hall => (15.0, 20.0),
    }
}

/// Solve room boxes inside the environment.
///
/// Every pair keeps `room_gap` clearance on one axis and every room center
/// stays within `(10 + 3n)` units of the centroid of all centers.
pub fn place_rooms<R: Rng>(
    config: &LayoutConfig,
    types: &[RoomType],
    env_width: f32,
    env_height: f32,
    rng: &mut R,
) -> Option<Vec<Rect>> {
    let bounds = Rect::new(0.0, 0.0, env_width, env_height);
    let mut problem: Problem<'_, R> = Problem::new();

    let ids: Vec<usize> = types
        .iter()
        .map(|&room_type| {
            let (lo, hi) = size_range(room_type);
            let (lo, hi) = (config.world(lo), config.world(hi));
            problem.add_variable(room_type.name(), 0.0, move |rng: &mut R, _: &[Rect]| {
                let w = pick(rng, lo, hi);
                let h = pick(rng, lo, hi);
                Rect::new(pick(rng, 0.0, env_width - w), pick(rng, 0.0, env_height - h), w, h)
            })
        })
        .collect();

    problem.all_apart(&ids, config.world(config.room_gap));
    for &item in &ids {
        problem.constrain(Constraint::Inside { item, bounds });
    }
    if types.len() > 1 {
        let n = types.len() as f32;
        problem.constrain(Constraint::Compact {
            radius: config.world(10.0 + 3.0 * n),
        });
    }

    problem.solve(rng, &config.search)
}

pub fn make_barycenter(rooms: &[Rect]) -> Option<Vertex> {
    barycenter_of(rooms.iter().copied())
}

fn corners(r: &Rect) -> [Vertex; 4] {
    [
        Vertex::new(r.x, r.max_y()),
        Vertex::new(r.max_x(), r.max_y()),
        Vertex::new(r.max_x(), r.y),
        Vertex::new(r.x, r.y),
    ]
}

/// Floor hub: bounding box of each room's corner nearest the barycenter,
/// inflated by `(3·floor_pos + 3)` units.
pub fn make_floor(rooms: &[Rect], barycenter: Vertex, floor_pos: f32, multiplier: f32) -> Rect {
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for room in rooms {
        let c = corners(room);
        let v = c[nearest_index(barycenter, &c)];
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
    }
    let space = (floor_pos * 3.0 + 3.0) * multiplier;
    Rect::new(
        min_x - space,
        min_y - space,
        max_x - min_x + 2.0 * space,
        max_y - min_y + 2.0 * space,
    )
}

/// Wall whose midpoint lies nearest the barycenter. Ties go to the first
/// wall in west, north, east, south order.
pub fn door_side(room: &Rect, barycenter: Vertex) -> Side {
    let [v1, v2, v3, v4] = corners(room);
    let midpoints = [
        Segment::new(v1, v4).midpoint(),
        Segment::new(v1, v2).midpoint(),
        Segment::new(v2, v3).midpoint(),
        Segment::new(v3, v4).midpoint(),
    ];
    Side::ALL[nearest_index(barycenter, &midpoints)]
}

/// One door per room, on the wall facing the barycenter.
///
/// The door position is uniform over the part of the wall whose door span
/// stays inside the floor range. Returns `None` when some wall has no such
/// part.
pub fn make_doors<R: Rng>(
    rooms: &[Rect],
    barycenter: Vertex,
    floor: &Rect,
    config: &LayoutConfig,
    rng: &mut R,
) -> Option<Vec<Door>> {
    let length = config.world(config.door_length);
    let mut doors = Vec::with_capacity(rooms.len());

    for room in rooms {
        let side = door_side(room, barycenter);
        let (lo, hi) = if side.is_vertical() {
            (room.y.max(floor.y), (room.max_y() - length).min(floor.max_y() - length))
        } else {
            (room.x.max(floor.x), (room.max_x() - length).min(floor.max_x() - length))
        };
        if hi < lo {
            log::debug!("no door span for {:?} wall of room at ({:.1}, {:.1})", side, room.x, room.y);
            return None;
        }
        let along = pick(rng, lo, hi);
        let rect = match side {
            Side::West => Rect::new(room.x, along, 0.0, length),
            Side::East => Rect::new(room.max_x(), along, 0.0, length),
            Side::North => Rect::new(along, room.max_y(), length, 0.0),
            Side::South => Rect::new(along, room.y, length, 0.0),
        };
        doors.push(Door { rect, side });
    }
    Some(doors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn floor_spans_nearest_corners() {
        let rooms = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 20.0, 10.0, 10.0)];
        let bary = make_barycenter(&rooms).unwrap();
        assert_eq!(bary, Vertex::new(15.0, 15.0));
        // floor_pos 0 gives a 3-unit margin.
        let floor = make_floor(&rooms, bary, 0.0, 1.0);
        assert_eq!(floor, Rect::new(7.0, 7.0, 16.0, 16.0));
    }

    #[test]
    fn door_faces_barycenter() {
        let room = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(door_side(&room, Vertex::new(-50.0, 5.0)), Side::West);
        assert_eq!(door_side(&room, Vertex::new(5.0, 60.0)), Side::North);
        assert_eq!(door_side(&room, Vertex::new(60.0, 5.0)), Side::East);
        assert_eq!(door_side(&room, Vertex::new(5.0, -60.0)), Side::South);
        // Equidistant from west and north midpoints: first in order wins.
        assert_eq!(door_side(&room, Vertex::new(-5.0, 15.0)), Side::West);
    }

    #[test]
    fn doors_lie_on_wall_inside_floor_range() {
        let config = LayoutConfig {
            multiplier: 1.0,
            ..Default::default()
        };
        let rooms = [Rect::new(0.0, 0.0, 12.0, 12.0), Rect::new(20.0, 0.0, 12.0, 12.0)];
        let bary = make_barycenter(&rooms).unwrap();
        let floor = make_floor(&rooms, bary, 0.5, 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let doors = make_doors(&rooms, bary, &floor, &config, &mut rng).unwrap();

        assert_eq!(doors[0].side, Side::East);
        assert_eq!(doors[0].rect.x, 12.0);
        assert_eq!(doors[0].rect.width, 0.0);
        assert!(doors[0].rect.y >= floor.y);
        assert!(doors[0].rect.max_y() <= floor.max_y() + 1e-4);

        assert_eq!(doors[1].side, Side::West);
        assert_eq!(doors[1].rect.x, 20.0);
    }

    #[test]
    fn door_fails_when_wall_misses_floor() {
        let config = LayoutConfig {
            multiplier: 1.0,
            ..Default::default()
        };
        let rooms = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let floor = Rect::new(100.0, 100.0, 5.0, 5.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(make_doors(&rooms, Vertex::new(50.0, 5.0), &floor, &config, &mut rng).is_none());
    }

    #[test]
    fn rooms_are_separated_and_compact() {
        let config = LayoutConfig::default();
        let types = [RoomType::Bedroom, RoomType::Bathroom, RoomType::Kitchen, RoomType::Hall];
        let env = config.world(15.0 + 8.0 * 4.0);
        let mut rng = StdRng::seed_from_u64(42);
        let rooms = (0..50)
            .find_map(|_| place_rooms(&config, &types, env, env, &mut rng))
            .expect("rooms placed");
        let gap = config.world(config.room_gap);
        for i in 0..rooms.len() {
            assert!(Rect::new(0.0, 0.0, env, env).contains_rect(&rooms[i]));
            for j in (i + 1)..rooms.len() {
                assert!(rooms[i].separated_by(&rooms[j], gap));
            }
        }
    }
}
