//! Kitchen program: corner desks and tables with chairs.
//!
//! Desks are assigned to corner "angles" numbered 1..=4:
//! 1 = (min x, max y), 2 = (max x, max y), 3 = (max x, min y),
//! 4 = (min x, min y). The two angles touching the door wall are closed.
//! An angle holds at most two desks; the second runs along the other wall
//! and starts one desk depth away from the corner.

use rand::Rng;

use super::{pick, retry, table_chairs, Placement, RoomFrame};
use crate::error::GenerationError;
use crate::geometry::Rect;
use crate::scene::{FurnitureKind, Orientation, Side};
use crate::solver::Problem;

const MAX_DESKS_PER_ANGLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DeskPlan {
    angle: u8,
    /// Runs along the x axis when true.
    horizontal: bool,
    /// Second desk of its angle.
    offset: bool,
}

fn angle_corner(angle: u8) -> (bool, bool) {
    // (at max x, at max y)
    match angle {
        1 => (false, true),
        2 => (true, true),
        3 => (true, false),
        _ => (false, false),
    }
}

/// Angles touching the wall that carries the door.
fn closed_angles(door: Side) -> [u8; 2] {
    match door {
        Side::West => [1, 4],
        Side::East => [2, 3],
        Side::South => [3, 4],
        Side::North => [1, 2],
    }
}

fn plan_desks<R: Rng>(rng: &mut R, desks: u32, door: Side) -> Option<Vec<DeskPlan>> {
    let closed = closed_angles(door);
    let open: Vec<u8> = (1..=4).filter(|a| !closed.contains(a)).collect();
    let mut first: [Option<bool>; 5] = [None; 5];
    let mut used = [0usize; 5];
    let mut plans = Vec::with_capacity(desks as usize);

    for _ in 0..desks {
        let free: Vec<u8> = open
            .iter()
            .copied()
            .filter(|&a| used[a as usize] < MAX_DESKS_PER_ANGLE)
            .collect();
        if free.is_empty() {
            return None;
        }
        let angle = free[rng.gen_range(0..free.len())];
        let slot = angle as usize;
        let plan = match first[slot] {
            None => {
                let horizontal = rng.gen_bool(0.5);
                first[slot] = Some(horizontal);
                DeskPlan {
                    angle,
                    horizontal,
                    offset: false,
                }
            }
            Some(h) => DeskPlan {
                angle,
                horizontal: !h,
                offset: true,
            },
        };
        used[slot] += 1;
        plans.push(plan);
    }
    Some(plans)
}

/// Walls that carry at least one desk.
fn desk_walls(plans: &[DeskPlan]) -> Vec<Side> {
    plans
        .iter()
        .map(|p| {
            let (max_x, max_y) = angle_corner(p.angle);
            match (p.horizontal, max_x, max_y) {
                (true, _, true) => Side::North,
                (true, _, false) => Side::South,
                (false, true, _) => Side::East,
                (false, false, _) => Side::West,
            }
        })
        .collect()
}

fn desk_rect<R: Rng>(rng: &mut R, frame: &RoomFrame, plan: DeskPlan, depth: f32) -> Rect {
    let r = &frame.rect;
    let (w, h) = if plan.horizontal {
        (pick(rng, 0.7 * r.width - depth, r.width - depth), depth)
    } else {
        (depth, pick(rng, 0.7 * r.height - depth, r.height - depth))
    };
    let (at_max_x, at_max_y) = angle_corner(plan.angle);
    let mut x = if at_max_x { r.max_x() - w } else { r.x };
    let mut y = if at_max_y { r.max_y() - h } else { r.y };
    if plan.offset {
        let shift = |v: f32, away_from_max: bool| if away_from_max { v - depth } else { v + depth };
        if plan.horizontal {
            x = shift(x, at_max_x);
        } else {
            y = shift(y, at_max_y);
        }
    }
    Rect::new(x, y, w, h)
}

/// Place `desks` corner desks and `tables` tables with four chairs each.
pub fn furnish_kitchen<R: Rng>(
    frame: &RoomFrame,
    desks: u32,
    tables: u32,
    rng: &mut R,
) -> Result<Vec<Placement>, GenerationError> {
    if desks == 0 && tables == 0 {
        return Ok(Vec::new());
    }
    retry("kitchen", frame.max_attempts, || {
        kitchen_attempt(frame, desks, tables, rng)
    })
}

fn kitchen_attempt<R: Rng>(
    frame: &RoomFrame,
    desks: u32,
    tables: u32,
    rng: &mut R,
) -> Option<Vec<Placement>> {
    let depth = frame.draw(rng, 1.5, 1.8);
    let chair = frame.draw(rng, 0.7, 1.0);
    let plans = plan_desks(rng, desks, frame.door.side)?;
    let walls = desk_walls(&plans);

    let inset = |side: Side| chair + if walls.contains(&side) { depth } else { 0.0 };
    let (inset_w, inset_e) = (inset(Side::West), inset(Side::East));
    let (inset_s, inset_n) = (inset(Side::South), inset(Side::North));

    let mut problem: Problem<'_, R> = Problem::new();
    let mut items = Vec::new();
    for &plan in &plans {
        let f = *frame;
        items.push(problem.add_variable("desk", 0.0, move |rng: &mut R, _: &[Rect]| {
            desk_rect(rng, &f, plan, depth)
        }));
    }
    let first_table = items.len();
    for _ in 0..tables {
        let r = frame.rect;
        items.push(problem.add_variable("table", chair, move |rng: &mut R, _: &[Rect]| {
            let w = pick(rng, r.width / 5.0, 3.0 * r.width / 10.0);
            let h = pick(rng, r.height / 5.0, 3.0 * r.height / 10.0);
            Rect::new(
                pick(rng, r.x + inset_w, r.max_x() - inset_e - w),
                pick(rng, r.y + inset_s, r.max_y() - inset_n - h),
                w,
                h,
            )
        }));
    }
    problem.all_apart(&items, 0.0);
    frame.bound_all(&mut problem, &items);

    let boxes = problem.solve(rng, &frame.budget)?;
    let mut out = Vec::with_capacity(boxes.len());
    for (plan, rect) in plans.iter().zip(&boxes) {
        let orientation = if plan.horizontal {
            Orientation::E
        } else {
            Orientation::S
        };
        out.push(Placement::new(FurnitureKind::Desk, *rect, orientation));
    }
    for rect in &boxes[first_table..] {
        let mut table = Placement::new(FurnitureKind::Table, *rect, Orientation::N);
        table.children = table_chairs(rect, chair);
        out.push(table);
    }
    Some(out)
}
