//! Bedroom program: beds with a bedside table, and wardrobes.

use rand::Rng;

use super::{random_wall, retry, Placement, RoomFrame};
use crate::error::GenerationError;
use crate::geometry::Rect;
use crate::scene::{FurnitureKind, Orientation, Side};
use crate::solver::Problem;

/// Extent a wardrobe claims along its wall, in units.
const WARDROBE_EXTENT: f32 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BedKind {
    /// Wider than long: 5..6 by 2..3.
    Wide,
    /// Longer than wide: 2..3 by 5..6.
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BedPlan {
    kind: BedKind,
    wall: Side,
}

impl BedPlan {
    /// Bed plus bedside along the wall, in units.
    fn extent(&self) -> f32 {
        match (self.kind, self.wall.is_vertical()) {
            (BedKind::Wide, true) | (BedKind::Long, false) => 5.0,
            (BedKind::Wide, false) | (BedKind::Long, true) => 8.0,
        }
    }

    fn orientation<R: Rng>(&self, rng: &mut R) -> Orientation {
        let either = |rng: &mut R, a, b| if rng.gen_bool(0.5) { a } else { b };
        match (self.wall, self.kind) {
            (Side::West, BedKind::Wide) => Orientation::E,
            (Side::East, BedKind::Wide) => Orientation::W,
            (Side::North | Side::South, BedKind::Wide) => either(rng, Orientation::E, Orientation::W),
            (Side::West | Side::East, BedKind::Long) => either(rng, Orientation::N, Orientation::S),
            (Side::North, BedKind::Long) => Orientation::N,
            (Side::South, BedKind::Long) => Orientation::S,
        }
    }
}

/// Draw bed kinds and walls for beds and wardrobes until the requested
/// extent fits every wall.
fn plan_walls<R: Rng>(
    frame: &RoomFrame,
    beds: u32,
    wardrobes: u32,
    rng: &mut R,
) -> Option<(Vec<BedPlan>, Vec<Side>)> {
    for _ in 0..frame.max_attempts {
        let bed_plans: Vec<BedPlan> = (0..beds)
            .map(|_| BedPlan {
                kind: if rng.gen_bool(0.5) {
                    BedKind::Wide
                } else {
                    BedKind::Long
                },
                wall: random_wall(rng),
            })
            .collect();
        let wardrobe_walls: Vec<Side> = (0..wardrobes).map(|_| random_wall(rng)).collect();

        let fits = Side::ALL.iter().all(|&side| {
            let demand: f32 = bed_plans
                .iter()
                .filter(|b| b.wall == side)
                .map(BedPlan::extent)
                .sum::<f32>()
                + WARDROBE_EXTENT * wardrobe_walls.iter().filter(|&&w| w == side).count() as f32;
            frame.u(demand) <= frame.usable_wall(side)
        });
        if fits {
            return Some((bed_plans, wardrobe_walls));
        }
    }
    None
}

fn bed_size<R: Rng>(frame: &RoomFrame, kind: BedKind, rng: &mut R) -> (f32, f32) {
    match kind {
        BedKind::Long => {
            let w = frame.draw(rng, 2.0, 3.0);
            (w, w + frame.u(3.0))
        }
        BedKind::Wide => {
            let w = frame.draw(rng, 5.0, 6.0);
            (w, w - frame.u(3.0))
        }
    }
}

/// Square bedside flush with `wall`, just past or just before the bed.
fn bedside_rect<R: Rng>(frame: &RoomFrame, wall: Side, bed: &Rect, rng: &mut R) -> Rect {
    let s = frame.draw(rng, 1.5, 2.0);
    let after = rng.gen_bool(0.5);
    let along = match (wall.is_vertical(), after) {
        (true, true) => bed.max_y(),
        (true, false) => bed.y - s,
        (false, true) => bed.max_x(),
        (false, false) => bed.x - s,
    };
    frame.flush(wall, s, s, along)
}

fn wardrobe_rect<R: Rng>(frame: &RoomFrame, wall: Side, rng: &mut R) -> Rect {
    let depth = frame.draw(rng, 1.5, 2.0);
    let length = frame.draw(rng, 3.0, WARDROBE_EXTENT);
    if wall.is_vertical() {
        frame.random_flush(rng, wall, depth, length)
    } else {
        frame.random_flush(rng, wall, length, depth)
    }
}

/// Place `beds` beds, each with a bedside table, and `wardrobes` wardrobes.
pub fn furnish_bedroom<R: Rng>(
    frame: &RoomFrame,
    beds: u32,
    wardrobes: u32,
    rng: &mut R,
) -> Result<Vec<Placement>, GenerationError> {
    if beds == 0 && wardrobes == 0 {
        return Ok(Vec::new());
    }
    retry("bedroom", frame.max_attempts, || {
        let (bed_plans, wardrobe_walls) = plan_walls(frame, beds, wardrobes, rng)?;
        bedroom_attempt(frame, &bed_plans, &wardrobe_walls, rng)
    })
}

fn bedroom_attempt<R: Rng>(
    frame: &RoomFrame,
    bed_plans: &[BedPlan],
    wardrobe_walls: &[Side],
    rng: &mut R,
) -> Option<Vec<Placement>> {
    let mut problem: Problem<'_, R> = Problem::new();
    let mut items = Vec::new();
    let mut pairs = Vec::with_capacity(bed_plans.len());

    for plan in bed_plans {
        let f = *frame;
        let (kind, wall) = (plan.kind, plan.wall);
        let bed = problem.add_variable("bed", 0.0, move |rng: &mut R, _: &[Rect]| {
            let (w, h) = bed_size(&f, kind, rng);
            f.random_flush(rng, wall, w, h)
        });
        let bedside = problem.add_variable("bedside", 0.0, move |rng: &mut R, placed: &[Rect]| {
            bedside_rect(&f, wall, &placed[bed], rng)
        });
        items.extend([bed, bedside]);
        pairs.push((bed, bedside));
    }
    let mut wardrobe_ids = Vec::with_capacity(wardrobe_walls.len());
    for &wall in wardrobe_walls {
        let f = *frame;
        let id = problem.add_variable("wardrobe", 0.0, move |rng: &mut R, _: &[Rect]| {
            wardrobe_rect(&f, wall, rng)
        });
        items.push(id);
        wardrobe_ids.push(id);
    }
    problem.all_apart(&items, 0.0);
    frame.bound_all(&mut problem, &items);

    let boxes = problem.solve(rng, &frame.budget)?;
    let mut out = Vec::with_capacity(pairs.len() + wardrobe_ids.len());
    for (plan, &(bed, bedside)) in bed_plans.iter().zip(&pairs) {
        let mut placement = Placement::new(FurnitureKind::Bed, boxes[bed], plan.orientation(rng));
        placement
            .children
            .push(Placement::new(FurnitureKind::Bedside, boxes[bedside], Orientation::S));
        out.push(placement);
    }
    for (&wall, &id) in wardrobe_walls.iter().zip(&wardrobe_ids) {
        let orientation = if wall.is_vertical() {
            Orientation::S
        } else {
            Orientation::E
        };
        out.push(Placement::new(FurnitureKind::Wardrobe, boxes[id], orientation));
    }
    Some(out)
}
