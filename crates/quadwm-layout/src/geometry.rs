/// A point in root window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen-edge insets that fill and maximize never cover (status bars etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gap {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Position and size of a window, excluding its border.
///
/// As in the core protocol, `x`/`y` name the outer top-left corner of the
/// border while `width`/`height` exclude it. The outer extent of a window
/// with border width `bw` is therefore `width + 2 * bw` by `height + 2 * bw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn subtract_gap(self, gap: &Gap) -> Self {
        Self {
            x: self.x + gap.left,
            y: self.y + gap.top,
            width: self.width - (gap.left + gap.right),
            height: self.height - (gap.top + gap.bottom),
        }
    }

    /// Inclusive on every edge, so the pixel just past the right/bottom
    /// edge still counts. Screen lookups rely on this to catch the pointer
    /// sitting on the last column of a monitor.
    pub fn contains(&self, p: Point) -> bool {
        !(p.x < self.x || p.x > self.x + self.width || p.y < self.y || p.y > self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// The rectangle covered including a border of `border_width` on each side.
    pub fn outer(&self, border_width: i32) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width + 2 * border_width,
            height: self.height + 2 * border_width,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Strict overlap: rectangles that merely share an edge do not overlap.
    pub fn overlaps(&self, other: &Geometry) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }
}

/// Returns the screen containing `p`, falling back to the last screen when
/// the point lies outside every screen.
pub fn screen_for_point(screens: &[Geometry], p: Point) -> Option<Geometry> {
    screens
        .iter()
        .find(|s| s.contains(p))
        .or_else(|| screens.last())
        .copied()
}

/// Offset needed to snap an interval `[n0, n1]` flush against `[e0, e1]`.
///
/// Each end is considered independently; if both ends are within
/// `snap_dist` the smaller adjustment wins. Returns 0 when neither snaps.
pub fn snap_offset(n0: i32, n1: i32, e0: i32, e1: i32, snap_dist: i32) -> i32 {
    let s0 = if (e0 - n0).abs() <= snap_dist { e0 - n0 } else { 0 };
    let s1 = if (e1 - n1).abs() <= snap_dist { e1 - n1 } else { 0 };

    match (s0, s1) {
        (0, 0) => 0,
        (s0, 0) => s0,
        (0, s1) => s1,
        (s0, s1) if s0.abs() < s1.abs() => s0,
        (_, s1) => s1,
    }
}
