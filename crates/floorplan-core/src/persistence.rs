//! Save/Load for scenes and training runs
//!
//! Scenes use the JSON environment format shared with map tooling: a
//! `roomNumber`, a `floor` box and one `R<i>` object per room holding its
//! box, type, door and a two-level furniture tree. Run checkpoints are
//! small bincode records carrying a format version.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use floorplan_logic::config::LayoutConfig;
use floorplan_logic::geometry::Rect;
use floorplan_logic::scene::{Door, FurnitureKind, Orientation, Room, RoomType, Scene};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Version number for checkpoint format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Environment growth per room, in units.
const GROWTH_PER_ROOM: f32 = 8.0;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneFile {
    room_number: usize,
    floor: Rect,
    #[serde(flatten)]
    rooms: BTreeMap<String, RoomEntry>,
}

#[derive(Serialize, Deserialize)]
struct RoomEntry {
    #[serde(flatten)]
    rect: Rect,
    #[serde(rename = "type")]
    room_type: RoomType,
    door: Rect,
    children: Vec<ItemEntry>,
}

#[derive(Serialize, Deserialize)]
struct ItemEntry {
    #[serde(flatten)]
    rect: Rect,
    #[serde(rename = "type")]
    kind: String,
    orientation: Orientation,
    /// Present on top-level items only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<ItemEntry>>,
}

fn room_key(index: usize) -> String {
    format!("R{}", index)
}

/// Furniture type name. Hall tables are written as `hall_table`.
fn kind_name(kind: FurnitureKind, room: RoomType) -> &'static str {
    match kind {
        FurnitureKind::Bed => "bed",
        FurnitureKind::Bedside => "bedside",
        FurnitureKind::Wardrobe => "wardrobe",
        FurnitureKind::Desk => "desk",
        FurnitureKind::Table if room == RoomType::Hall => "hall_table",
        FurnitureKind::Table => "table",
        FurnitureKind::Chair => "chair",
        FurnitureKind::Sofa => "sofa",
        FurnitureKind::Cupboard => "cupboard",
        FurnitureKind::Toilet => "toilet",
        FurnitureKind::Shower => "shower",
        FurnitureKind::Sink => "sink",
    }
}

fn parse_kind(name: &str) -> Option<FurnitureKind> {
    let kind = match name {
        "bed" => FurnitureKind::Bed,
        "bedside" => FurnitureKind::Bedside,
        "wardrobe" => FurnitureKind::Wardrobe,
        "desk" => FurnitureKind::Desk,
        "table" | "hall_table" => FurnitureKind::Table,
        "chair" => FurnitureKind::Chair,
        "sofa" => FurnitureKind::Sofa,
        "cupboard" => FurnitureKind::Cupboard,
        "toilet" => FurnitureKind::Toilet,
        "shower" => FurnitureKind::Shower,
        "sink" => FurnitureKind::Sink,
        _ => return None,
    };
    Some(kind)
}

fn to_file(scene: &Scene) -> SceneFile {
    let rooms = scene
        .rooms
        .iter()
        .map(|room| {
            let entry = |kind: FurnitureKind, rect: Rect, orientation: Orientation| ItemEntry {
                rect,
                kind: kind_name(kind, room.room_type).to_string(),
                orientation,
                children: None,
            };
            let children = room
                .furniture
                .iter()
                .map(|&id| {
                    let item = scene.object(id);
                    let subs = scene
                        .children(id)
                        .map(|sub| entry(sub.kind, sub.rect, sub.orientation))
                        .collect();
                    ItemEntry {
                        children: Some(subs),
                        ..entry(item.kind, item.rect, item.orientation)
                    }
                })
                .collect();
            (
                room_key(room.index),
                RoomEntry {
                    rect: room.rect,
                    room_type: room.room_type,
                    door: room.door.rect,
                    children,
                },
            )
        })
        .collect();
    SceneFile {
        room_number: scene.rooms.len(),
        floor: scene.floor,
        rooms,
    }
}

fn from_file(mut file: SceneFile, config: &LayoutConfig) -> Result<Scene, SimError> {
    let extra = file.rooms.len().saturating_sub(file.room_number);
    if extra > 0 {
        return Err(SimError::MalformedScene(format!(
            "{} room entries beyond roomNumber {}",
            extra, file.room_number
        )));
    }
    let growth = GROWTH_PER_ROOM * file.room_number as f32 * config.multiplier;
    let mut scene = Scene::new(
        file.floor.width + growth,
        file.floor.height + growth,
        config.multiplier,
        config.world(config.door_thickness),
    );
    scene.floor = file.floor;

    for index in 0..file.room_number {
        let key = room_key(index);
        let entry = file
            .rooms
            .remove(&key)
            .ok_or_else(|| SimError::MalformedScene(format!("missing room {}", key)))?;
        let side = Door::side_on(&entry.rect, &entry.door).ok_or_else(|| {
            SimError::MalformedScene(format!("door of {} is not on one of its walls", key))
        })?;
        scene.rooms.push(Room {
            index,
            room_type: entry.room_type,
            rect: entry.rect,
            door: Door {
                rect: entry.door,
                side,
            },
            furniture: Vec::new(),
        });

        for item in entry.children {
            let kind = parse_kind(&item.kind).ok_or_else(|| {
                SimError::MalformedScene(format!("unknown furniture {:?} in {}", item.kind, key))
            })?;
            let id = scene.add_object(index, None, kind, item.rect, item.orientation);
            for sub in item.children.unwrap_or_default() {
                let sub_kind = parse_kind(&sub.kind).ok_or_else(|| {
                    SimError::MalformedScene(format!("unknown furniture {:?} in {}", sub.kind, key))
                })?;
                scene.add_object(index, Some(id), sub_kind, sub.rect, sub.orientation);
            }
        }
    }
    Ok(scene)
}

/// Serialize a scene to the JSON environment format.
pub fn scene_to_json(scene: &Scene) -> Result<String, SimError> {
    Ok(serde_json::to_string(&to_file(scene))?)
}

/// Parse a JSON environment. Multiplier and door thickness come from
/// `config`; the environment is the floor grown by 8 units per room.
pub fn scene_from_json(json: &str, config: &LayoutConfig) -> Result<Scene, SimError> {
    let file: SceneFile = serde_json::from_str(json)?;
    from_file(file, config)
}

pub fn save_scene<W: Write>(writer: W, scene: &Scene) -> Result<(), SimError> {
    serde_json::to_writer_pretty(writer, &to_file(scene))?;
    Ok(())
}

pub fn load_scene<R: Read>(reader: R, config: &LayoutConfig) -> Result<Scene, SimError> {
    let file: SceneFile = serde_json::from_reader(reader)?;
    let scene = from_file(file, config)?;
    log::info!("loaded scene with {} rooms", scene.rooms.len());
    Ok(scene)
}

/// Progress of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    /// Save format version
    pub version: u32,
    /// First episode still to run
    pub next_episode: u32,
    /// Policy exploration rate after the last replay
    pub exploration: f32,
    pub best_score: u32,
    pub total_score: u64,
}

impl RunCheckpoint {
    pub fn new(next_episode: u32, exploration: f32, best_score: u32, total_score: u64) -> Self {
        Self {
            version: SAVE_VERSION,
            next_episode,
            exploration,
            best_score,
            total_score,
        }
    }
}

pub fn save_checkpoint<W: Write>(writer: W, checkpoint: &RunCheckpoint) -> Result<(), SimError> {
    bincode::serialize_into(writer, checkpoint)?;
    Ok(())
}

pub fn load_checkpoint<R: Read>(reader: R) -> Result<RunCheckpoint, SimError> {
    let checkpoint: RunCheckpoint = bincode::deserialize_from(reader)?;
    if checkpoint.version != SAVE_VERSION {
        return Err(SimError::VersionMismatch {
            expected: SAVE_VERSION,
            found: checkpoint.version,
        });
    }
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_logic::scene::Side;
    use std::io::Cursor;

    fn sample_scene() -> Scene {
        let config = LayoutConfig::default();
        let mut scene = Scene::new(0.0, 0.0, 8.5, 8.5);
        scene.floor = Rect::new(10.0, 10.0, 250.0, 120.0);
        scene.rooms.push(Room {
            index: 0,
            room_type: RoomType::Hall,
            rect: Rect::new(10.0, 10.0, 100.0, 120.0),
            door: Door {
                rect: Rect::new(110.0, 50.0, 0.0, 21.25),
                side: Side::East,
            },
            furniture: Vec::new(),
        });
        let table = scene.add_object(
            0,
            None,
            FurnitureKind::Table,
            Rect::new(40.0, 40.0, 30.0, 25.5),
            Orientation::N,
        );
        scene.add_object(
            0,
            Some(table),
            FurnitureKind::Chair,
            Rect::new(50.0, 65.5, 7.0, 7.0),
            Orientation::S,
        );
        let growth = 8.0 * config.multiplier;
        scene.env_width = scene.floor.width + growth;
        scene.env_height = scene.floor.height + growth;
        scene
    }

    #[test]
    fn json_uses_flat_room_keys() {
        let json = scene_to_json(&sample_scene()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["roomNumber"], 1);
        assert_eq!(value["R0"]["type"], "hall");
        assert_eq!(value["R0"]["door"]["width"], 0.0);
        let table = &value["R0"]["children"][0];
        assert_eq!(table["type"], "hall_table");
        assert_eq!(table["orientation"], "N");
        assert_eq!(table["children"][0]["type"], "chair");
        assert!(table["children"][0].get("children").is_none());
    }

    #[test]
    fn scene_round_trips() {
        let scene = sample_scene();
        let json = scene_to_json(&scene).unwrap();
        let back = scene_from_json(&json, &LayoutConfig::default()).unwrap();
        assert_eq!(back, scene);
    }

    #[test]
    fn missing_room_is_malformed() {
        let json = r#"{"roomNumber": 2, "floor": {"x": 0, "y": 0, "width": 10, "height": 10},
            "R0": {"x": 0, "y": 0, "width": 10, "height": 10, "type": "hall",
                   "door": {"x": 10, "y": 2, "width": 0, "height": 3}, "children": []}}"#;
        let err = scene_from_json(json, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::MalformedScene(ref m) if m.contains("R1")));
    }

    #[test]
    fn door_off_the_wall_is_malformed() {
        let json = r#"{"roomNumber": 1, "floor": {"x": 0, "y": 0, "width": 10, "height": 10},
            "R0": {"x": 0, "y": 0, "width": 10, "height": 10, "type": "hall",
                   "door": {"x": 5, "y": 2, "width": 0, "height": 3}, "children": []}}"#;
        assert!(matches!(
            scene_from_json(json, &LayoutConfig::default()),
            Err(SimError::MalformedScene(_))
        ));
    }

    #[test]
    fn unknown_furniture_is_malformed() {
        let json = r#"{"roomNumber": 1, "floor": {"x": 0, "y": 0, "width": 10, "height": 10},
            "R0": {"x": 0, "y": 0, "width": 10, "height": 10, "type": "hall",
                   "door": {"x": 0, "y": 2, "width": 0, "height": 3},
                   "children": [{"x": 1, "y": 1, "width": 2, "height": 2,
                                 "type": "piano", "orientation": "N", "children": []}]}}"#;
        assert!(matches!(
            scene_from_json(json, &LayoutConfig::default()),
            Err(SimError::MalformedScene(_))
        ));
    }

    #[test]
    fn missing_fields_fail_fast() {
        let json = r#"{"roomNumber": 1}"#;
        assert!(matches!(
            scene_from_json(json, &LayoutConfig::default()),
            Err(SimError::Json(_))
        ));
    }

    #[test]
    fn writer_and_reader_agree() {
        let scene = sample_scene();
        let mut buffer = Vec::new();
        save_scene(&mut buffer, &scene).unwrap();
        let back = load_scene(Cursor::new(buffer), &LayoutConfig::default()).unwrap();
        assert_eq!(back, scene);
    }

    #[test]
    fn checkpoint_round_trip() {
        let checkpoint = RunCheckpoint::new(42, 0.37, 5, 120);
        let mut buffer = Vec::new();
        save_checkpoint(&mut buffer, &checkpoint).unwrap();
        assert_eq!(load_checkpoint(Cursor::new(buffer)).unwrap(), checkpoint);
    }

    #[test]
    fn checkpoint_version_is_checked() {
        let checkpoint = RunCheckpoint {
            version: 99,
            ..RunCheckpoint::new(1, 1.0, 0, 0)
        };
        let mut buffer = Vec::new();
        save_checkpoint(&mut buffer, &checkpoint).unwrap();
        assert!(matches!(
            load_checkpoint(Cursor::new(buffer)),
            Err(SimError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }
}
