//! Procedural floor-plan generation.
//!
//! Generation runs in two phases:
//!
//! 1. **Shell**: room boxes are solved as one constraint problem (pairwise
//!    clearance, compactness around the centroid), then the floor hub and
//!    one door per room are derived from the room barycenter.
//! 2. **Furnishing**: each room runs its own constraint program
//!    ([`kitchen`], [`bedroom`], [`bathroom`], [`hall`]).
//!
//! Every sub-problem is retried with fresh random draws up to
//! `LayoutConfig::max_attempts` times before surfacing
//! [`GenerationError::Unsatisfiable`].

pub mod bathroom;
pub mod bedroom;
pub mod hall;
pub mod kitchen;
pub mod rooms;

use rand::Rng;

use crate::config::{validate_config, ConfigError, LayoutConfig, SearchBudget};
use crate::error::GenerationError;
use crate::geometry::Rect;
use crate::scene::{Door, FurnitureKind, Orientation, Room, RoomType, Scene, Side};
use crate::solver::{Constraint, Problem};

pub use bathroom::furnish_bathroom;
pub use bedroom::furnish_bedroom;
pub use hall::furnish_hall;
pub use kitchen::furnish_kitchen;
pub use rooms::{make_barycenter, make_doors, make_floor, place_rooms};

/// What a room is and how much furniture it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPlan {
    Bedroom { beds: u32, wardrobes: u32 },
    Bathroom { toilets: u32, showers: u32, sinks: u32 },
    Kitchen { desks: u32, tables: u32 },
    Hall { tables: u32, sofas: u32, cupboards: u32 },
}

impl RoomPlan {
    pub fn room_type(&self) -> RoomType {
        match self {
            RoomPlan::Bedroom { .. } => RoomType::Bedroom,
            RoomPlan::Bathroom { .. } => RoomType::Bathroom,
            RoomPlan::Kitchen { .. } => RoomType::Kitchen,
            RoomPlan::Hall { .. } => RoomType::Hall,
        }
    }
}

/// A solved furniture item, with its sub-items.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: FurnitureKind,
    pub rect: Rect,
    pub orientation: Orientation,
    pub children: Vec<Placement>,
}

impl Placement {
    pub fn new(kind: FurnitureKind, rect: Rect, orientation: Orientation) -> Self {
        Self {
            kind,
            rect,
            orientation,
            children: Vec::new(),
        }
    }
}

/// Everything a furniture program needs to know about its room.
#[derive(Debug, Clone, Copy)]
pub struct RoomFrame {
    pub rect: Rect,
    pub door: Door,
    pub multiplier: f32,
    /// Door clearance in world units.
    pub clearance: f32,
    pub budget: SearchBudget,
    pub max_attempts: u32,
}

impl RoomFrame {
    pub fn new(room: &Room, config: &LayoutConfig) -> Self {
        Self {
            rect: room.rect,
            door: room.door,
            multiplier: config.multiplier,
            clearance: config.world(config.door_clearance),
            budget: config.search,
            max_attempts: config.max_attempts,
        }
    }

    /// Units to world units.
    pub fn u(&self, units: f32) -> f32 {
        units * self.multiplier
    }

    /// Uniform draw in `[lo, hi)` units, scaled to world units.
    pub fn draw<R: Rng>(&self, rng: &mut R, lo: f32, hi: f32) -> f32 {
        pick(rng, self.u(lo), self.u(hi))
    }

    /// A `w`×`h` box flush against `side`, `along` being its free coordinate.
    pub fn flush(&self, side: Side, w: f32, h: f32, along: f32) -> Rect {
        let r = &self.rect;
        match side {
            Side::West => Rect::new(r.x, along, w, h),
            Side::East => Rect::new(r.max_x() - w, along, w, h),
            Side::South => Rect::new(along, r.y, w, h),
            Side::North => Rect::new(along, r.max_y() - h, w, h),
        }
    }

    /// Like [`RoomFrame::flush`] with the free coordinate drawn across the wall.
    pub fn random_flush<R: Rng>(&self, rng: &mut R, side: Side, w: f32, h: f32) -> Rect {
        let r = &self.rect;
        let along = if side.is_vertical() {
            pick(rng, r.y, r.max_y() - h)
        } else {
            pick(rng, r.x, r.max_x() - w)
        };
        self.flush(side, w, h, along)
    }

    /// Room containment and door clearance for each item.
    pub fn bound_all<R: Rng>(&self, problem: &mut Problem<'_, R>, items: &[usize]) {
        for &item in items {
            problem.constrain(Constraint::Inside {
                item,
                bounds: self.rect,
            });
            problem.constrain(Constraint::DoorClear {
                item,
                door: self.door.rect,
                margin: self.clearance,
            });
        }
    }

    /// Length of the wall on `side`, or of its longer segment beside the
    /// door when the door sits on that wall.
    pub fn usable_wall(&self, side: Side) -> f32 {
        let r = &self.rect;
        let d = &self.door.rect;
        if side == self.door.side {
            if side.is_vertical() {
                (d.y - r.y).max(r.max_y() - d.max_y())
            } else {
                (d.x - r.x).max(r.max_x() - d.max_x())
            }
        } else if side.is_vertical() {
            r.height
        } else {
            r.width
        }
    }
}

/// Uniform draw in `[lo, hi)`, collapsing to `lo` for an empty range.
pub fn pick<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

pub fn random_wall<R: Rng>(rng: &mut R) -> Side {
    Side::from_wall(rng.gen_range(1..=4))
}

/// Run `attempt` until it yields a value, at most `max_attempts` times.
pub fn retry<T>(
    stage: &'static str,
    max_attempts: u32,
    mut attempt: impl FnMut() -> Option<T>,
) -> Result<T, GenerationError> {
    for n in 1..=max_attempts {
        if let Some(value) = attempt() {
            if n > 1 {
                log::debug!("{} placement solved on attempt {}", stage, n);
            }
            return Ok(value);
        }
    }
    log::warn!("{} placement gave up after {} attempts", stage, max_attempts);
    Err(GenerationError::Unsatisfiable {
        stage,
        attempts: max_attempts,
    })
}

/// Draw furniture counts for every room, in bedroom, bathroom, kitchen,
/// hall order.
pub fn draw_room_plans<R: Rng>(config: &LayoutConfig, rng: &mut R) -> Vec<RoomPlan> {
    let f = &config.furniture;
    let mut plans = Vec::with_capacity(config.room_count() as usize);
    for _ in 0..config.bedrooms {
        plans.push(RoomPlan::Bedroom {
            beds: rng.gen_range(0..=f.beds),
            wardrobes: rng.gen_range(0..=f.wardrobes),
        });
    }
    for _ in 0..config.bathrooms {
        plans.push(RoomPlan::Bathroom {
            toilets: rng.gen_range(0..=f.toilets),
            showers: rng.gen_range(0..=f.showers),
            sinks: rng.gen_range(0..=f.sinks),
        });
    }
    for _ in 0..config.kitchens {
        plans.push(RoomPlan::Kitchen {
            desks: rng.gen_range(0..=f.desks),
            tables: rng.gen_range(0..=f.kitchen_tables),
        });
    }
    for _ in 0..config.halls {
        plans.push(RoomPlan::Hall {
            tables: rng.gen_range(0..=f.hall_tables),
            sofas: rng.gen_range(0..=f.sofas),
            cupboards: rng.gen_range(0..=f.cupboards),
        });
    }
    plans
}

/// Generate a complete scene for the room counts in `config`.
pub fn generate_scene<R: Rng>(config: &LayoutConfig, rng: &mut R) -> Result<Scene, GenerationError> {
    let errors = validate_config(config);
    if !errors.is_empty() {
        return Err(GenerationError::InvalidConfig(errors));
    }
    let plans = draw_room_plans(config, rng);
    generate_from_plans(config, &plans, rng)
}

/// [`generate_scene`] with the rng taken from `config.seed`.
pub fn generate_seeded(config: &LayoutConfig) -> Result<Scene, GenerationError> {
    let mut rng = config.rng();
    generate_scene(config, &mut rng)
}

struct Shell {
    rooms: Vec<Rect>,
    floor: Rect,
    doors: Vec<Door>,
}

fn build_shell<R: Rng>(
    config: &LayoutConfig,
    types: &[RoomType],
    env_width: f32,
    env_height: f32,
    rng: &mut R,
) -> Option<Shell> {
    let rooms = place_rooms(config, types, env_width, env_height, rng)?;
    let barycenter = make_barycenter(&rooms)?;
    let floor_pos: f32 = rng.gen();
    let floor = make_floor(&rooms, barycenter, floor_pos, config.multiplier);
    let doors = make_doors(&rooms, barycenter, &floor, config, rng)?;
    Some(Shell {
        rooms,
        floor,
        doors,
    })
}

/// Generate a scene from explicit room plans.
pub fn generate_from_plans<R: Rng>(
    config: &LayoutConfig,
    plans: &[RoomPlan],
    rng: &mut R,
) -> Result<Scene, GenerationError> {
    let mut errors = validate_config(config);
    errors.retain(|e| !matches!(e, ConfigError::NoRooms | ConfigError::TooManyRooms { .. }));
    if plans.is_empty() {
        errors.push(ConfigError::NoRooms);
    }
    if !errors.is_empty() {
        return Err(GenerationError::InvalidConfig(errors));
    }

    let n = plans.len() as f32;
    let env_width = config.world(config.env_width + 8.0 * n);
    let env_height = config.world(config.env_height + 8.0 * n);
    let types: Vec<RoomType> = plans.iter().map(RoomPlan::room_type).collect();

    let shell = retry("room", config.max_attempts, || {
        build_shell(config, &types, env_width, env_height, rng)
    })?;

    let mut scene = Scene::new(
        env_width,
        env_height,
        config.multiplier,
        config.world(config.door_thickness),
    );
    scene.floor = shell.floor;
    for (index, (rect, door)) in shell.rooms.into_iter().zip(shell.doors).enumerate() {
        scene.rooms.push(Room {
            index,
            room_type: types[index],
            rect,
            door,
            furniture: Vec::new(),
        });
    }

    for (index, plan) in plans.iter().enumerate() {
        let frame = RoomFrame::new(&scene.rooms[index], config);
        let placements = match *plan {
            RoomPlan::Bedroom { beds, wardrobes } => furnish_bedroom(&frame, beds, wardrobes, rng)?,
            RoomPlan::Bathroom {
                toilets,
                showers,
                sinks,
            } => furnish_bathroom(&frame, toilets, showers, sinks, rng)?,
            RoomPlan::Kitchen { desks, tables } => furnish_kitchen(&frame, desks, tables, rng)?,
            RoomPlan::Hall {
                tables,
                sofas,
                cupboards,
            } => furnish_hall(&frame, tables, sofas, cupboards, config.sofa_separation, rng)?,
        };
        for placement in placements {
            let id = scene.add_object(index, None, placement.kind, placement.rect, placement.orientation);
            for child in placement.children {
                scene.add_object(index, Some(id), child.kind, child.rect, child.orientation);
            }
        }
    }

    log::info!(
        "generated {} rooms with {} objects in {:.0}x{:.0}",
        scene.rooms.len(),
        scene.objects.len(),
        scene.env_width,
        scene.env_height
    );
    Ok(scene)
}

/// Four chairs around a table: south, east, north, west of it.
pub fn table_chairs(table: &Rect, chair: f32) -> Vec<Placement> {
    let Rect {
        x,
        y,
        width: w,
        height: h,
    } = *table;
    vec![
        Placement::new(
            FurnitureKind::Chair,
            Rect::new(x + (w - chair) / 2.0, y + h, chair, chair),
            Orientation::S,
        ),
        Placement::new(
            FurnitureKind::Chair,
            Rect::new(x + w, y + (h - chair) / 2.0, chair, chair),
            Orientation::E,
        ),
        Placement::new(
            FurnitureKind::Chair,
            Rect::new(x + (w - chair) / 2.0, y - chair, chair, chair),
            Orientation::N,
        ),
        Placement::new(
            FurnitureKind::Chair,
            Rect::new(x - chair, y + (h - chair) / 2.0, chair, chair),
            Orientation::W,
        ),
    ]
}
