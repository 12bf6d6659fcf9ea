//! Box-placement constraint problems.
//!
//! A [`Problem`] is built fresh for every placement query: one variable per
//! box, each with a sampler that draws a candidate from its domain, plus a
//! list of inequality constraints between boxes. [`Problem::solve`] runs a
//! randomized backtracking search and commits to the first complete
//! assignment it finds. Nothing is shared between problems.
//!
//! Samplers see the boxes already placed, so a derived item (a bedside next
//! to its bed, a second desk along a corner) is declared after the item it
//! depends on.

use rand::Rng;

use crate::config::SearchBudget;
use crate::geometry::Rect;
use crate::scene::barycenter_of;

/// Containment slack for boxes placed flush against a wall.
const EPSILON: f32 = 1e-3;

type Sampler<'a, R> = Box<dyn Fn(&mut R, &[Rect]) -> Rect + 'a>;

struct Variable<'a, R> {
    label: &'static str,
    /// Footprint ring around the box (a table's chairs).
    pad: f32,
    sample: Sampler<'a, R>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Footprints of `a` and `b` at least `gap` apart along one axis.
    Apart { a: usize, b: usize, gap: f32 },
    /// Footprint of `item` inside `bounds`.
    Inside { item: usize, bounds: Rect },
    /// Footprint of `item` keeps `margin` from the door along the axis
    /// crossing the door's wall.
    DoorClear { item: usize, door: Rect, margin: f32 },
    /// Every box center within `radius` of the centroid of all centers.
    Compact { radius: f32 },
}

impl Constraint {
    /// Highest variable index the constraint reads, `None` when it needs the
    /// full assignment.
    fn last_variable(&self) -> Option<usize> {
        match *self {
            Constraint::Apart { a, b, .. } => Some(a.max(b)),
            Constraint::Inside { item, .. } | Constraint::DoorClear { item, .. } => Some(item),
            Constraint::Compact { .. } => None,
        }
    }
}

pub struct Problem<'a, R> {
    vars: Vec<Variable<'a, R>>,
    constraints: Vec<Constraint>,
}

impl<'a, R: Rng> Default for Problem<'a, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R: Rng> Problem<'a, R> {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Declare a box variable. Returns its index.
    pub fn add_variable(
        &mut self,
        label: &'static str,
        pad: f32,
        sample: impl Fn(&mut R, &[Rect]) -> Rect + 'a,
    ) -> usize {
        self.vars.push(Variable {
            label,
            pad,
            sample: Box::new(sample),
        });
        self.vars.len() - 1
    }

    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Pairwise `Apart` over every pair in `items`.
    pub fn all_apart(&mut self, items: &[usize], gap: f32) {
        for (i, &a) in items.iter().enumerate() {
            for &b in &items[i + 1..] {
                self.constrain(Constraint::Apart { a, b, gap });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Box plus its pad ring.
    pub fn footprint(&self, index: usize, rect: &Rect) -> Rect {
        rect.inflate(self.vars[index].pad)
    }

    /// Search for an assignment. Returns the first one found.
    ///
    /// Each variable gets `samples_per_variable` draws; when they run out the
    /// search backtracks to the previous variable. `max_steps` bounds the
    /// total number of draws.
    pub fn solve(&self, rng: &mut R, budget: &SearchBudget) -> Option<Vec<Rect>> {
        let n = self.vars.len();
        if n == 0 {
            return self.globals_hold(&[]).then(Vec::new);
        }

        let mut placed: Vec<Rect> = Vec::with_capacity(n);
        let mut tries = vec![0u32; n];
        let mut steps = 0u32;

        loop {
            if placed.len() == n {
                if self.globals_hold(&placed) {
                    return Some(placed);
                }
                // Redraw the last box.
                placed.pop();
                continue;
            }

            let level = placed.len();
            if tries[level] >= budget.samples_per_variable {
                tries[level] = 0;
                placed.pop()?;
                continue;
            }
            if steps >= budget.max_steps {
                log::debug!(
                    "search budget spent at '{}' ({} of {} placed)",
                    self.vars[level].label,
                    level,
                    n
                );
                return None;
            }
            tries[level] += 1;
            steps += 1;

            let candidate = (self.vars[level].sample)(rng, &placed);
            if self.consistent(level, &candidate, &placed) {
                placed.push(candidate);
            }
        }
    }

    fn consistent(&self, level: usize, candidate: &Rect, placed: &[Rect]) -> bool {
        let rect_at = |i: usize| if i == level { candidate } else { &placed[i] };
        self.constraints
            .iter()
            .filter(|c| c.last_variable() == Some(level))
            .all(|c| match *c {
                Constraint::Apart { a, b, gap } => self
                    .footprint(a, rect_at(a))
                    .separated_by(&self.footprint(b, rect_at(b)), gap),
                Constraint::Inside { item, bounds } => {
                    bounds
                        .inflate(EPSILON)
                        .contains_rect(&self.footprint(item, rect_at(item)))
                }
                Constraint::DoorClear { item, door, margin } => {
                    door_clear(&door, &self.footprint(item, rect_at(item)), margin)
                }
                Constraint::Compact { .. } => true,
            })
    }

    fn globals_hold(&self, placed: &[Rect]) -> bool {
        self.constraints.iter().all(|c| match *c {
            Constraint::Compact { radius } => compact(placed, radius),
            _ => true,
        })
    }
}

/// Door clearance inequality.
///
/// For a door on a west/east wall (zero width) the item must keep `margin`
/// on the x axis or not overlap the door span on the y axis; transposed for
/// a door on a north/south wall.
pub fn door_clear(door: &Rect, item: &Rect, margin: f32) -> bool {
    if door.width == 0.0 {
        (door.x + margin <= item.x || item.max_x() <= door.x - margin)
            || (door.max_y() <= item.y || item.max_y() <= door.y)
    } else {
        (door.y + margin <= item.y || item.max_y() <= door.y - margin)
            || (door.max_x() <= item.x || item.max_x() <= door.x)
    }
}

fn compact(rects: &[Rect], radius: f32) -> bool {
    let Some(centroid) = barycenter_of(rects.iter().copied()) else {
        return true;
    };
    rects.iter().all(|r| {
        let c = r.center();
        ((c.x - centroid.x).powi(2) + (c.y - centroid.y).powi(2)).sqrt() <= radius
    })
}
