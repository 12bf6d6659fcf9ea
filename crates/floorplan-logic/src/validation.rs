//! Scene validation for generated and loaded floor plans.
//!
//! Pure checks over a [`Scene`]; each returns the problems it finds. Used by
//! the headless harness after generation and after loading from disk.

use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::scene::{Door, Scene};
use crate::solver::door_clear;

/// Slack for boxes placed flush against a wall.
const TOLERANCE: f32 = 1e-3;

/// A scene validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── Rooms ───────────────────────────────────────────────────────────────

pub fn check_room_dimensions(scene: &Scene) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for room in &scene.rooms {
        if room.rect.width <= 0.0 || room.rect.height <= 0.0 {
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!(
                    "Room #{} has non-positive dimensions: {}×{}",
                    room.index, room.rect.width, room.rect.height
                ),
            });
        }
    }
    errors
}

/// Every pair of rooms keeps `gap` world units of clearance on one axis.
pub fn check_room_separation(scene: &Scene, gap: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (i, a) in scene.rooms.iter().enumerate() {
        for b in &scene.rooms[i + 1..] {
            if a.rect.overlaps(&b.rect) {
                errors.push(ValidationError {
                    category: "room_layout",
                    severity: Severity::Error,
                    message: format!("Rooms #{} and #{} overlap", a.index, b.index),
                });
            } else if !a.rect.separated_by(&b.rect, gap - TOLERANCE) {
                errors.push(ValidationError {
                    category: "room_layout",
                    severity: Severity::Warning,
                    message: format!(
                        "Rooms #{} and #{} are closer than {:.1}",
                        a.index, b.index, gap
                    ),
                });
            }
        }
    }
    errors
}

// ── Furniture ───────────────────────────────────────────────────────────

fn room_boxes(scene: &Scene, room: usize) -> Vec<(String, Rect)> {
    scene
        .furniture_tree(room)
        .into_iter()
        .map(|id| {
            let o = scene.object(id);
            (format!("{:?}#{}", o.kind, id.0), o.rect)
        })
        .collect()
}

/// No two furniture boxes of a room overlap. Touching is allowed.
pub fn check_furniture_overlaps(scene: &Scene) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for room in &scene.rooms {
        let boxes = room_boxes(scene, room.index);
        for (i, (name_a, a)) in boxes.iter().enumerate() {
            for (name_b, b) in &boxes[i + 1..] {
                if a.overlaps(b) {
                    errors.push(ValidationError {
                        category: "furniture",
                        severity: Severity::Error,
                        message: format!("{} overlaps {} in room #{}", name_a, name_b, room.index),
                    });
                }
            }
        }
    }
    errors
}

pub fn check_furniture_inside_rooms(scene: &Scene) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for room in &scene.rooms {
        let bounds = room.rect.inflate(TOLERANCE);
        for (name, rect) in room_boxes(scene, room.index) {
            if !bounds.contains_rect(&rect) {
                errors.push(ValidationError {
                    category: "furniture",
                    severity: Severity::Error,
                    message: format!("{} extends outside room #{}", name, room.index),
                });
            }
        }
    }
    errors
}

/// Every furniture box keeps `clearance` world units from its room's door.
pub fn check_door_clearance(scene: &Scene, clearance: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for room in &scene.rooms {
        for (name, rect) in room_boxes(scene, room.index) {
            if !door_clear(&room.door.rect, &rect, clearance - TOLERANCE) {
                errors.push(ValidationError {
                    category: "door_clearance",
                    severity: Severity::Error,
                    message: format!("{} blocks the door of room #{}", name, room.index),
                });
            }
        }
    }
    errors
}

// ── Doors ───────────────────────────────────────────────────────────────

/// Doors are wall-mounted: one zero dimension, lying on the recorded wall.
pub fn check_doors_on_walls(scene: &Scene) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for room in &scene.rooms {
        let door = &room.door;
        match Door::side_on(&room.rect, &door.rect) {
            Some(side) if side == door.side => {}
            Some(side) => errors.push(ValidationError {
                category: "door",
                severity: Severity::Error,
                message: format!(
                    "Door of room #{} sits on the {:?} wall but is recorded as {:?}",
                    room.index, side, door.side
                ),
            }),
            None => errors.push(ValidationError {
                category: "door",
                severity: Severity::Error,
                message: format!(
                    "Door of room #{} is not a wall segment: ({:.1},{:.1}) {}×{}",
                    room.index, door.rect.x, door.rect.y, door.rect.width, door.rect.height
                ),
            }),
        }
        let along = if door.side.is_vertical() {
            door.rect.y >= room.rect.y - TOLERANCE && door.rect.max_y() <= room.rect.max_y() + TOLERANCE
        } else {
            door.rect.x >= room.rect.x - TOLERANCE && door.rect.max_x() <= room.rect.max_x() + TOLERANCE
        };
        if !along {
            errors.push(ValidationError {
                category: "door",
                severity: Severity::Error,
                message: format!("Door of room #{} runs past its wall", room.index),
            });
        }
    }
    errors
}

/// Doors open onto the floor hub.
pub fn check_doors_within_floor(scene: &Scene) -> Vec<ValidationError> {
    let floor = scene.floor.inflate(TOLERANCE);
    scene
        .rooms
        .iter()
        .filter(|room| !floor.contains_rect(&room.door.rect))
        .map(|room| ValidationError {
            category: "door",
            severity: Severity::Warning,
            message: format!("Door of room #{} lies outside the floor", room.index),
        })
        .collect()
}

// ── Master validation ───────────────────────────────────────────────────

/// Run all scene validations. Margins come from `config` in units and are
/// scaled by the scene's own multiplier.
pub fn validate_scene(scene: &Scene, config: &LayoutConfig) -> Vec<ValidationError> {
    let m = scene.multiplier;
    let mut all = Vec::new();
    all.extend(check_room_dimensions(scene));
    all.extend(check_room_separation(scene, config.room_gap * m));
    all.extend(check_furniture_overlaps(scene));
    all.extend(check_furniture_inside_rooms(scene));
    all.extend(check_door_clearance(scene, config.door_clearance * m));
    all.extend(check_doors_on_walls(scene));
    all.extend(check_doors_within_floor(scene));
    all
}

/// Only the errors, dropping warnings.
pub fn errors_only(all: Vec<ValidationError>) -> Vec<ValidationError> {
    all.into_iter()
        .filter(|e| e.severity == Severity::Error)
        .collect()
}
