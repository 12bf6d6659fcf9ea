//! Hall program: tables with chairs, sofas and cupboards.
//!
//! Sofas keep `sofa_separation` from every other sofa, cupboard and table,
//! and tables keep it from cupboards and each other. Cupboards only need to
//! not overlap.

use rand::Rng;

use super::{pick, random_wall, retry, table_chairs, Placement, RoomFrame};
use crate::error::GenerationError;
use crate::geometry::Rect;
use crate::scene::{FurnitureKind, Orientation, Side};
use crate::solver::{Constraint, Problem};

/// Table sized within the side band and the area band.
fn table_size<R: Rng>(frame: &RoomFrame, rng: &mut R) -> (f32, f32) {
    let (min_area, max_area) = (frame.u(frame.u(8.0)), frame.u(frame.u(15.0)));
    let w = frame.draw(rng, 2.5, 6.0);
    let h = pick(
        rng,
        frame.u(2.5).max(min_area / w),
        frame.u(6.0).min(max_area / w),
    );
    (w, h)
}

fn table_rect<R: Rng>(frame: &RoomFrame, chair: f32, rng: &mut R) -> Rect {
    let r = &frame.rect;
    let (w, h) = table_size(frame, rng);
    Rect::new(
        pick(rng, r.x + chair, r.max_x() - chair - w),
        pick(rng, r.y + chair, r.max_y() - chair - h),
        w,
        h,
    )
}

fn cupboard_rect<R: Rng>(frame: &RoomFrame, wall: Side, rng: &mut R) -> Rect {
    let depth = frame.draw(rng, 1.5, 2.0);
    let length = frame.draw(rng, 3.0, 12.0);
    if wall.is_vertical() {
        frame.random_flush(rng, wall, depth, length)
    } else {
        frame.random_flush(rng, wall, length, depth)
    }
}

/// Sofa anywhere in the half of the room adjacent to `wall`, its long side
/// parallel to the wall.
fn sofa_rect<R: Rng>(frame: &RoomFrame, wall: Side, rng: &mut R) -> Rect {
    let r = &frame.rect;
    let depth = frame.draw(rng, 2.5, 3.0);
    let length = frame.draw(rng, 6.0, 8.0);
    let (w, h) = if wall.is_vertical() {
        (depth, length)
    } else {
        (length, depth)
    };
    let (mid_x, mid_y) = (r.x + r.width / 2.0, r.y + r.height / 2.0);
    let (x_lo, x_hi, y_lo, y_hi) = match wall {
        Side::West => (r.x, mid_x - w, r.y, r.max_y() - h),
        Side::East => (mid_x, r.max_x() - w, r.y, r.max_y() - h),
        Side::North => (r.x, r.max_x() - w, mid_y, r.max_y() - h),
        Side::South => (r.x, r.max_x() - w, r.y, mid_y - h),
    };
    Rect::new(pick(rng, x_lo, x_hi), pick(rng, y_lo, y_hi), w, h)
}

fn sofa_orientation(wall: Side) -> Orientation {
    match wall {
        Side::West => Orientation::E,
        Side::North => Orientation::N,
        Side::East => Orientation::W,
        Side::South => Orientation::S,
    }
}

/// Place tables (with four chairs), sofas on distinct walls and cupboards.
/// `sofa_separation` is in units.
pub fn furnish_hall<R: Rng>(
    frame: &RoomFrame,
    tables: u32,
    sofas: u32,
    cupboards: u32,
    sofa_separation: f32,
    rng: &mut R,
) -> Result<Vec<Placement>, GenerationError> {
    if tables == 0 && sofas == 0 && cupboards == 0 {
        return Ok(Vec::new());
    }
    // Sofas take distinct walls.
    if sofas as usize > Side::ALL.len() {
        return Err(GenerationError::InvalidPlan {
            room: "hall",
            item: "sofas",
            requested: sofas,
        });
    }
    let gap = frame.u(sofa_separation);

    retry("hall", frame.max_attempts, || {
        let chair = frame.draw(rng, 0.7, 1.0);
        let cupboard_walls: Vec<Side> = (0..cupboards).map(|_| random_wall(rng)).collect();
        let mut free_walls = Side::ALL.to_vec();
        let sofa_walls: Vec<Side> = (0..sofas)
            .map(|_| free_walls.remove(rng.gen_range(0..free_walls.len())))
            .collect();

        let mut problem: Problem<'_, R> = Problem::new();
        let f = *frame;
        let table_ids: Vec<usize> = (0..tables)
            .map(|_| {
                problem.add_variable("table", chair, move |rng: &mut R, _: &[Rect]| {
                    table_rect(&f, chair, rng)
                })
            })
            .collect();
        let sofa_ids: Vec<usize> = sofa_walls
            .iter()
            .map(|&wall| {
                problem.add_variable("sofa", 0.0, move |rng: &mut R, _: &[Rect]| {
                    sofa_rect(&f, wall, rng)
                })
            })
            .collect();
        let cupboard_ids: Vec<usize> = cupboard_walls
            .iter()
            .map(|&wall| {
                problem.add_variable("cupboard", 0.0, move |rng: &mut R, _: &[Rect]| {
                    cupboard_rect(&f, wall, rng)
                })
            })
            .collect();

        problem.all_apart(&table_ids, gap);
        problem.all_apart(&sofa_ids, gap);
        problem.all_apart(&cupboard_ids, 0.0);
        for &a in &sofa_ids {
            for &b in table_ids.iter().chain(&cupboard_ids) {
                problem.constrain(Constraint::Apart { a, b, gap });
            }
        }
        for &a in &cupboard_ids {
            for &b in &table_ids {
                problem.constrain(Constraint::Apart { a, b, gap });
            }
        }
        let all: Vec<usize> = (0..problem.len()).collect();
        frame.bound_all(&mut problem, &all);

        let boxes = problem.solve(rng, &frame.budget)?;
        let mut out = Vec::with_capacity(boxes.len());
        for &id in &table_ids {
            let mut table = Placement::new(FurnitureKind::Table, boxes[id], Orientation::N);
            table.children = table_chairs(&boxes[id], chair);
            out.push(table);
        }
        for (&id, &wall) in sofa_ids.iter().zip(&sofa_walls) {
            out.push(Placement::new(FurnitureKind::Sofa, boxes[id], sofa_orientation(wall)));
        }
        for (&id, &wall) in cupboard_ids.iter().zip(&cupboard_walls) {
            let orientation = if wall.is_vertical() {
                Orientation::S
            } else {
                Orientation::E
            };
            out.push(Placement::new(FurnitureKind::Cupboard, boxes[id], orientation));
        }
        Some(out)
    })
}
