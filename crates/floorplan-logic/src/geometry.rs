//! Geometry kernel: points, segments, axis-aligned boxes and the
//! intersection queries the perception fan is built on.
//!
//! Screen convention throughout: `y` grows downward, a box's origin is its
//! top-left corner. Every query is total. Parallel or collinear segments are
//! not an error, they simply produce no hit.

use serde::{Deserialize, Serialize};

/// A point in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A closed line segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vertex,
    pub end: Vertex,
}

impl Segment {
    pub const fn new(start: Vertex, end: Vertex) -> Self {
        Self { start, end }
    }

    pub fn midpoint(&self) -> Vertex {
        Vertex::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
}

/// Axis-aligned box used for every placement and collision query.
///
/// A zero `width` or `height` is valid and marks a wall-mounted door.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vertex {
        Vertex::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// The four edges in fixed west, north, east, south order.
    ///
    /// "North" is the `y + height` edge and "south" the `y` edge, matching
    /// the wall numbering used by the layout programs.
    pub fn edges(&self) -> [Segment; 4] {
        let (x0, y0, x1, y1) = (self.x, self.y, self.max_x(), self.max_y());
        [
            Segment::new(Vertex::new(x0, y0), Vertex::new(x0, y1)),
            Segment::new(Vertex::new(x0, y1), Vertex::new(x1, y1)),
            Segment::new(Vertex::new(x1, y1), Vertex::new(x1, y0)),
            Segment::new(Vertex::new(x0, y0), Vertex::new(x1, y0)),
        ]
    }

    /// Interiors intersect. Boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    /// `other` lies inside `self`, boundaries included.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Grow by `pad` on every side.
    pub fn inflate(&self, pad: f32) -> Rect {
        self.inflate_xy(pad, pad)
    }

    /// Grow by `dx` left and right, `dy` above and below.
    pub fn inflate_xy(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2.0 * dx,
            self.height + 2.0 * dy,
        )
    }

    /// At least `gap` of clearance between the boxes along one axis.
    pub fn separated_by(&self, other: &Rect, gap: f32) -> bool {
        self.max_x() + gap <= other.x
            || other.max_x() + gap <= self.x
            || self.max_y() + gap <= other.y
            || other.max_y() + gap <= self.y
    }
}

/// Parametric segment/segment intersection.
///
/// Returns the crossing point when both segment parameters fall inside
/// `[0, 1]`. The returned coordinates are truncated toward zero so that ray
/// distances snap to whole world units.
pub fn segment_intersect(a: &Segment, b: &Segment) -> Option<Vertex> {
    let (x1, y1, x2, y2) = (a.start.x, a.start.y, a.end.x, a.end.y);
    let (x3, y3, x4, y4) = (b.start.x, b.start.y, b.end.x, b.end.y);

    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if denom == 0.0 {
        // parallel or collinear
        return None;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(Vertex::new(
            (x1 + ua * (x2 - x1)).trunc(),
            (y1 + ua * (y2 - y1)).trunc(),
        ))
    } else {
        None
    }
}

/// Every hit of `segment` against the box edges, in west, north, east,
/// south order.
pub fn segment_box_intersections(segment: &Segment, rect: &Rect) -> Vec<Vertex> {
    rect.edges()
        .iter()
        .filter_map(|edge| segment_intersect(segment, edge))
        .collect()
}

/// Point closest to `origin`. Ties go to the earliest candidate.
pub fn nearest_point(origin: Vertex, points: &[Vertex]) -> Option<Vertex> {
    let mut best: Option<(Vertex, f32)> = None;
    for &p in points {
        let d = point_distance(origin, p);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((p, d)),
        }
    }
    best.map(|(p, _)| p)
}

pub fn closest_box_intersection(segment: &Segment, rect: &Rect) -> Option<Vertex> {
    nearest_point(segment.start, &segment_box_intersections(segment, rect))
}

/// Like [`closest_box_intersection`], but wall hits inside the door
/// opening are dropped so rays pass through doors.
pub fn closest_room_intersection(
    segment: &Segment,
    room: &Rect,
    door_opening: &Rect,
) -> Option<Vertex> {
    let hits: Vec<Vertex> = segment_box_intersections(segment, room)
        .into_iter()
        .filter(|p| !box_contains_point(door_opening, *p))
        .collect();
    nearest_point(segment.start, &hits)
}

pub fn point_distance(a: Vertex, b: Vertex) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Inclusive containment: points on the boundary count as inside.
pub fn box_contains_point(rect: &Rect, p: Vertex) -> bool {
    p.x >= rect.x && p.x <= rect.max_x() && p.y >= rect.y && p.y <= rect.max_y()
}
