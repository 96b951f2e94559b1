//! Collision-aware extension of a window towards its neighbours.
//!
//! All bounds are expressed in layout coordinates: a window placed at
//! `x = left` with `width = right - left` (and likewise vertically) fits
//! exactly between its obstacles, borders included.

use crate::geometry::Geometry;

/// A window as seen by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    pub id: u32,
    pub geometry: Geometry,
    pub border_width: i32,
}

impl Obstacle {
    pub fn new(id: u32, geometry: Geometry, border_width: i32) -> Self {
        Self { id, geometry, border_width }
    }

    fn outer(&self) -> Geometry {
        self.geometry.outer(self.border_width)
    }

    fn with_geometry(&self, geometry: Geometry) -> Self {
        Self { geometry, ..*self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Largest bounds `subject` could occupy inside `screen` without running
/// into any of `others`.
///
/// `screen` is expected to already have the configured gap removed.
/// Neighbours overlapping the subject are ignored, as is the subject itself
/// when it appears in `others`.
pub fn collisions(subject: &Obstacle, others: &[Obstacle], screen: Geometry) -> Bounds {
    let bw2 = 2 * subject.border_width;
    let s = subject.outer();

    let mut bounds = Bounds {
        left: screen.x,
        top: screen.y,
        right: screen.right() - bw2,
        bottom: screen.bottom() - bw2,
    };

    for other in others.iter().filter(|o| o.id != subject.id) {
        let o = other.outer();
        if o.overlaps(&s) {
            continue;
        }

        let shares_rows = o.y < s.bottom() && s.y < o.bottom();
        if shares_rows {
            if o.right() <= s.x {
                bounds.left = bounds.left.max(o.right());
            }
            if o.x >= s.right() {
                bounds.right = bounds.right.min(o.x - bw2);
            }
        }

        let shares_columns = o.x < s.right() && s.x < o.right();
        if shares_columns {
            if o.bottom() <= s.y {
                bounds.top = bounds.top.max(o.bottom());
            }
            if o.y >= s.bottom() {
                bounds.bottom = bounds.bottom.min(o.y - bw2);
            }
        }
    }

    bounds
}

/// How close a rectangle is to a square, in `[0, 1]`.
fn squareness(width: i32, height: i32) -> f64 {
    let (w, h) = (width as f64, height as f64);
    let max = w.max(h);
    if max <= 0.0 {
        return 0.0;
    }
    w.min(h) / max
}

/// Best collision-free rectangle around `subject`.
///
/// Two candidates are computed: one expanding horizontally first and then
/// vertically, one the other way around. The more square one wins; on a
/// tie the horizontal-first candidate is kept.
pub fn calculate_fill(subject: &Obstacle, others: &[Obstacle], screen: Geometry) -> Geometry {
    let initial = collisions(subject, others, screen);
    let g = subject.geometry;

    let wide = subject.with_geometry(Geometry { x: initial.left, width: initial.width(), ..g });
    let vertical = collisions(&wide, others, screen);
    let first = Geometry::new(initial.left, vertical.top, initial.width(), vertical.height());

    let tall = subject.with_geometry(Geometry { y: initial.top, height: initial.height(), ..g });
    let horizontal = collisions(&tall, others, screen);
    let second = Geometry::new(horizontal.left, initial.top, horizontal.width(), initial.height());

    if squareness(second.width, second.height) > squareness(first.width, first.height) {
        second
    } else {
        first
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Extends the edge facing `self` up to its bound, keeping the
    /// opposite edge in place.
    pub fn fill(self, g: Geometry, bounds: &Bounds) -> Geometry {
        match self {
            Direction::Up => Geometry { y: bounds.top, height: g.height + g.y - bounds.top, ..g },
            Direction::Down => Geometry { height: bounds.bottom - g.y, ..g },
            Direction::Left => Geometry { x: bounds.left, width: g.width + g.x - bounds.left, ..g },
            Direction::Right => Geometry { width: bounds.right - g.x, ..g },
        }
    }

    /// Moves the window flush against its bound in this direction.
    pub fn push(self, g: Geometry, bounds: &Bounds) -> Geometry {
        match self {
            Direction::Up => Geometry { y: bounds.top, ..g },
            Direction::Down => Geometry { y: bounds.bottom - g.height, ..g },
            Direction::Left => Geometry { x: bounds.left, ..g },
            Direction::Right => Geometry { x: bounds.right - g.width, ..g },
        }
    }
}
