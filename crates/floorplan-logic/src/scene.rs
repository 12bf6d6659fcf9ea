//! Scene model: rooms, doors, floor and an arena of furniture.
//!
//! Furniture lives in a flat `Vec<SceneObject>` and refers to its parent
//! and children by [`ObjectId`]. A room lists only its top-level items; a
//! table owns its chairs and a bed owns its bedside through `children`.

use serde::{Deserialize, Serialize};

use crate::geometry::{box_contains_point, point_distance, Rect, Vertex};

/// Index into [`Scene::objects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Bedroom,
    Bathroom,
    Kitchen,
    Hall,
}

impl RoomType {
    pub fn name(self) -> &'static str {
        match self {
            RoomType::Bedroom => "bedroom",
            RoomType::Bathroom => "bathroom",
            RoomType::Kitchen => "kitchen",
            RoomType::Hall => "hall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FurnitureKind {
    Bed,
    Bedside,
    Wardrobe,
    Desk,
    Table,
    Chair,
    Sofa,
    Cupboard,
    Toilet,
    Shower,
    Sink,
}

/// Facing of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    N,
    E,
    S,
    W,
}

/// A room wall. `North` is the `y + height` edge, `South` the `y` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    West,
    North,
    East,
    South,
}

impl Side {
    /// All walls in door-selection order.
    pub const ALL: [Side; 4] = [Side::West, Side::North, Side::East, Side::South];

    /// Walls numbered 1..=4 as the furniture programs count them.
    pub fn from_wall(wall: u8) -> Side {
        match wall {
            1 => Side::West,
            2 => Side::North,
            3 => Side::East,
            _ => Side::South,
        }
    }

    pub fn wall_number(self) -> u8 {
        match self {
            Side::West => 1,
            Side::North => 2,
            Side::East => 3,
            Side::South => 4,
        }
    }

    /// West and east walls run along the y axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Side::West | Side::East)
    }
}

/// Wall-mounted door. Exactly one of `rect.width` / `rect.height` is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Door {
    pub rect: Rect,
    pub side: Side,
}

impl Door {
    /// The door box widened across its wall, `thickness` in total.
    pub fn opening(&self, thickness: f32) -> Rect {
        if self.side.is_vertical() {
            self.rect.inflate_xy(thickness / 2.0, 0.0)
        } else {
            self.rect.inflate_xy(0.0, thickness / 2.0)
        }
    }

    /// Infer which wall of `room` carries a door box, from the zero
    /// dimension and the coordinate it sits on.
    pub fn side_on(room: &Rect, door: &Rect) -> Option<Side> {
        let near = |a: f32, b: f32| (a - b).abs() <= 1e-3;
        if door.width == 0.0 && door.height > 0.0 {
            if near(door.x, room.x) {
                Some(Side::West)
            } else if near(door.x, room.max_x()) {
                Some(Side::East)
            } else {
                None
            }
        } else if door.height == 0.0 && door.width > 0.0 {
            if near(door.y, room.y) {
                Some(Side::South)
            } else if near(door.y, room.max_y()) {
                Some(Side::North)
            } else {
                None
            }
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub index: usize,
    pub room_type: RoomType,
    pub rect: Rect,
    pub door: Door,
    /// Top-level furniture, in placement order.
    pub furniture: Vec<ObjectId>,
}

impl Room {
    /// Corners `v1..v4`: (x, y+h), (x+w, y+h), (x+w, y), (x, y).
    pub fn vertices(&self) -> [Vertex; 4] {
        let r = &self.rect;
        [
            Vertex::new(r.x, r.max_y()),
            Vertex::new(r.max_x(), r.max_y()),
            Vertex::new(r.max_x(), r.y),
            Vertex::new(r.x, r.y),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub kind: FurnitureKind,
    pub rect: Rect,
    pub orientation: Orientation,
    pub room: usize,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
}

/// A generated (or loaded) floor plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub rooms: Vec<Room>,
    pub objects: Vec<SceneObject>,
    pub floor: Rect,
    pub env_width: f32,
    pub env_height: f32,
    pub multiplier: f32,
    /// Door thickness in world units.
    pub door_thickness: f32,
}

impl Scene {
    pub fn new(env_width: f32, env_height: f32, multiplier: f32, door_thickness: f32) -> Self {
        Self {
            rooms: Vec::new(),
            objects: Vec::new(),
            floor: Rect::default(),
            env_width,
            env_height,
            multiplier,
            door_thickness,
        }
    }

    /// Append an object to the arena and link it to its room or parent.
    ///
    /// Panics if `room` or `parent` does not exist; both come from the
    /// generator or loader that owns the scene.
    pub fn add_object(
        &mut self,
        room: usize,
        parent: Option<ObjectId>,
        kind: FurnitureKind,
        rect: Rect,
        orientation: Orientation,
    ) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(SceneObject {
            kind,
            rect,
            orientation,
            room,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.objects[p.0].children.push(id),
            None => self.rooms[room].furniture.push(id),
        }
        id
    }

    pub fn object(&self, id: ObjectId) -> &SceneObject {
        &self.objects[id.0]
    }

    /// Top-level furniture of a room.
    pub fn furniture(&self, room: usize) -> impl Iterator<Item = &SceneObject> + '_ {
        self.rooms[room].furniture.iter().map(|id| self.object(*id))
    }

    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = &SceneObject> + '_ {
        self.object(id).children.iter().map(|c| self.object(*c))
    }

    /// Every object of a room, each item followed by its sub-items.
    pub fn furniture_tree(&self, room: usize) -> Vec<ObjectId> {
        let mut out = Vec::new();
        for &id in &self.rooms[room].furniture {
            out.push(id);
            out.extend(self.object(id).children.iter().copied());
        }
        out
    }

    /// Boxes of every furniture item and sub-item in the scene.
    pub fn solid_boxes(&self) -> impl Iterator<Item = Rect> + '_ {
        self.objects.iter().map(|o| o.rect)
    }

    /// First room whose interior strictly contains `p`.
    pub fn room_containing(&self, p: Vertex) -> Option<usize> {
        self.rooms.iter().position(|r| {
            r.rect.x < p.x && p.x < r.rect.max_x() && r.rect.y < p.y && p.y < r.rect.max_y()
        })
    }

    /// Any room containing `p`, boundary included.
    pub fn any_room_contains(&self, p: Vertex) -> bool {
        self.rooms.iter().any(|r| box_contains_point(&r.rect, p))
    }

    /// Centroid of room centers. `None` for an empty scene.
    pub fn barycenter(&self) -> Option<Vertex> {
        barycenter_of(self.rooms.iter().map(|r| r.rect))
    }

    pub fn door_opening(&self, room: usize) -> Rect {
        self.rooms[room].door.opening(self.door_thickness)
    }
}

/// Centroid of the centers of `rects`.
pub fn barycenter_of(rects: impl Iterator<Item = Rect>) -> Option<Vertex> {
    let (mut sx, mut sy, mut n) = (0.0f32, 0.0f32, 0usize);
    for r in rects {
        let c = r.center();
        sx += c.x;
        sy += c.y;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(Vertex::new(sx / n as f32, sy / n as f32))
    }
}

/// Index of the candidate nearest `target`, first one on ties.
pub(crate) fn nearest_index(target: Vertex, candidates: &[Vertex]) -> usize {
    let mut best = 0;
    let mut best_d = f32::INFINITY;
    for (i, c) in candidates.iter().enumerate() {
        let d = point_distance(target, *c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}
