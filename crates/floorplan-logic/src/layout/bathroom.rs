//! Bathroom program: toilets, showers and sinks, each flush with a random
//! wall.

use rand::Rng;

use super::{random_wall, retry, Placement, RoomFrame};
use crate::error::GenerationError;
use crate::geometry::Rect;
use crate::scene::{FurnitureKind, Orientation, Side};
use crate::solver::Problem;

/// `(short, long)` side lengths of a fixture, in world units.
fn fixture_size<R: Rng>(frame: &RoomFrame, kind: FurnitureKind, rng: &mut R) -> (f32, f32) {
    match kind {
        FurnitureKind::Toilet => {
            let short = frame.draw(rng, 1.0, 1.3);
            (short, short + frame.u(0.7))
        }
        FurnitureKind::Sink => {
            let long = frame.draw(rng, 2.5, 3.5);
            (long * 2.0 / 3.0, long)
        }
        _ => {
            let side = frame.draw(rng, 3.0, 4.0);
            (side, side)
        }
    }
}

/// Fixture flush with `wall`, its long side running along the wall.
fn fixture_rect<R: Rng>(frame: &RoomFrame, kind: FurnitureKind, wall: Side, rng: &mut R) -> Rect {
    let (short, long) = fixture_size(frame, kind, rng);
    if wall.is_vertical() {
        frame.random_flush(rng, wall, short, long)
    } else {
        frame.random_flush(rng, wall, long, short)
    }
}

/// Facing of a fixture mounted on `wall`.
fn fixture_orientation(kind: FurnitureKind, wall: Side) -> Orientation {
    match (kind, wall) {
        (_, Side::West) => Orientation::E,
        (_, Side::East) => Orientation::W,
        (FurnitureKind::Sink, Side::North) => Orientation::N,
        (FurnitureKind::Sink, Side::South) => Orientation::S,
        (_, Side::South) => Orientation::N,
        (_, Side::North) => Orientation::S,
    }
}

/// Place toilets, showers and sinks, mutually non-overlapping and clear of
/// the door.
pub fn furnish_bathroom<R: Rng>(
    frame: &RoomFrame,
    toilets: u32,
    showers: u32,
    sinks: u32,
    rng: &mut R,
) -> Result<Vec<Placement>, GenerationError> {
    let kinds: Vec<FurnitureKind> = std::iter::repeat(FurnitureKind::Toilet)
        .take(toilets as usize)
        .chain(std::iter::repeat(FurnitureKind::Shower).take(showers as usize))
        .chain(std::iter::repeat(FurnitureKind::Sink).take(sinks as usize))
        .collect();
    if kinds.is_empty() {
        return Ok(Vec::new());
    }

    retry("bathroom", frame.max_attempts, || {
        let walls: Vec<Side> = kinds.iter().map(|_| random_wall(rng)).collect();
        let mut problem: Problem<'_, R> = Problem::new();
        let items: Vec<usize> = kinds
            .iter()
            .zip(&walls)
            .map(|(&kind, &wall)| {
                let f = *frame;
                problem.add_variable("fixture", 0.0, move |rng: &mut R, _: &[Rect]| {
                    fixture_rect(&f, kind, wall, rng)
                })
            })
            .collect();
        problem.all_apart(&items, 0.0);
        frame.bound_all(&mut problem, &items);

        let boxes = problem.solve(rng, &frame.budget)?;
        Some(
            kinds
                .iter()
                .zip(&walls)
                .zip(boxes)
                .map(|((&kind, &wall), rect)| Placement::new(kind, rect, fixture_orientation(kind, wall)))
                .collect(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchBudget;
    use crate::scene::Door;
    use crate::solver::door_clear;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bathroom() -> RoomFrame {
        RoomFrame {
            rect: Rect::new(0.0, 0.0, 85.0, 76.5),
            door: Door {
                rect: Rect::new(30.0, 76.5, 21.25, 0.0),
                side: Side::North,
            },
            multiplier: 8.5,
            clearance: 12.75,
            budget: SearchBudget::default(),
            max_attempts: 200,
        }
    }

    #[test]
    fn fixture_proportions() {
        let frame = bathroom();
        let mut rng = StdRng::seed_from_u64(42);
        let (short, long) = fixture_size(&frame, FurnitureKind::Toilet, &mut rng);
        assert!((long - short - 5.95).abs() < 1e-3);
        let (short, long) = fixture_size(&frame, FurnitureKind::Sink, &mut rng);
        assert!((short - long * 2.0 / 3.0).abs() < 1e-3);
        let (a, b) = fixture_size(&frame, FurnitureKind::Shower, &mut rng);
        assert_eq!(a, b);
    }

    #[test]
    fn long_side_runs_along_the_wall() {
        let frame = bathroom();
        let mut rng = StdRng::seed_from_u64(1);
        let west = fixture_rect(&frame, FurnitureKind::Toilet, Side::West, &mut rng);
        assert_eq!(west.x, 0.0);
        assert!(west.height > west.width);
        let south = fixture_rect(&frame, FurnitureKind::Sink, Side::South, &mut rng);
        assert_eq!(south.y, 0.0);
        assert!(south.width > south.height);
    }

    #[test]
    fn orientation_faces_into_the_room() {
        assert_eq!(fixture_orientation(FurnitureKind::Toilet, Side::West), Orientation::E);
        assert_eq!(fixture_orientation(FurnitureKind::Shower, Side::East), Orientation::W);
        assert_eq!(fixture_orientation(FurnitureKind::Toilet, Side::South), Orientation::N);
        assert_eq!(fixture_orientation(FurnitureKind::Sink, Side::North), Orientation::N);
        assert_eq!(fixture_orientation(FurnitureKind::Sink, Side::South), Orientation::S);
    }

    #[test]
    fn furnished_bathroom_is_consistent() {
        let frame = bathroom();
        let mut rng = StdRng::seed_from_u64(42);
        let items = furnish_bathroom(&frame, 1, 1, 1, &mut rng).unwrap();
        let kinds: Vec<_> = items.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![FurnitureKind::Toilet, FurnitureKind::Shower, FurnitureKind::Sink]
        );
        for (i, a) in items.iter().enumerate() {
            assert!(frame.rect.inflate(1e-3).contains_rect(&a.rect));
            assert!(door_clear(&frame.door.rect, &a.rect, frame.clearance));
            for b in &items[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect));
            }
        }
    }
}
