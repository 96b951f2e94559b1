//! ICCCM size hints and the interactive resize step.

use bitflags::bitflags;

use crate::geometry::{Geometry, Point};

bitflags! {
    /// `WM_NORMAL_HINTS.flags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HintFlags: u32 {
        const US_POSITION = 1 << 0;
        const US_SIZE = 1 << 1;
        const P_POSITION = 1 << 2;
        const P_SIZE = 1 << 3;
        const P_MIN_SIZE = 1 << 4;
        const P_MAX_SIZE = 1 << 5;
        const P_RESIZE_INC = 1 << 6;
        const P_ASPECT = 1 << 7;
        const P_BASE_SIZE = 1 << 8;
        const P_WIN_GRAVITY = 1 << 9;
    }
}

bitflags! {
    /// Edges that follow the pointer during a resize.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Corner: u8 {
        const N = 1;
        const W = 2;
        const S = 4;
        const E = 8;
        const NW = Self::N.bits() | Self::W.bits();
        const NE = Self::N.bits() | Self::E.bits();
        const SW = Self::S.bits() | Self::W.bits();
        const SE = Self::S.bits() | Self::E.bits();
    }
}

impl Corner {
    /// Picks the corner nearest to a point given relative to the window,
    /// the way a resize grab decides which edges to drag.
    pub fn nearest(event: Point, width: i32, height: i32) -> Corner {
        let (ex, ey) = (event.x.max(0), event.y.max(0));
        let horizontal = if ex > width / 2 { Corner::E } else { Corner::W };
        let vertical = if ey > height / 2 { Corner::S } else { Corner::N };
        horizontal | vertical
    }

    /// `_NET_WM_MOVERESIZE` direction codes 0 (top-left) through 7 (left).
    pub fn from_net_direction(direction: u32) -> Option<Corner> {
        Some(match direction {
            0 => Corner::NW,
            1 => Corner::N,
            2 => Corner::NE,
            3 => Corner::E,
            4 => Corner::SE,
            5 => Corner::S,
            6 => Corner::SW,
            7 => Corner::W,
            _ => return None,
        })
    }

    /// Offset inside a `width` x `height` window where the pointer sits
    /// when grabbing this corner.
    pub fn anchor(self, width: i32, height: i32) -> Point {
        let x = if self.contains(Corner::E) {
            width
        } else if self.contains(Corner::W) {
            0
        } else {
            width / 2
        };
        let y = if self.contains(Corner::S) {
            height
        } else if self.contains(Corner::N) {
            0
        } else {
            height / 2
        };
        Point::new(x, y)
    }
}

/// Sanitized `WM_NORMAL_HINTS`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeHints {
    pub flags: HintFlags,
    pub min: (i32, i32),
    pub max: Option<(i32, i32)>,
    pub base: (i32, i32),
    pub increment: (i32, i32),
    /// `(min, max)` width/height ratios.
    pub aspect: Option<(f64, f64)>,
}

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            flags: HintFlags::empty(),
            min: (1, 1),
            max: None,
            base: (0, 0),
            increment: (0, 0),
            aspect: None,
        }
    }
}

fn dim(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

impl SizeHints {
    /// Decodes the raw 32-bit property words. Short or garbled input
    /// yields the defaults for whatever is missing.
    pub fn from_raw(data: &[u32]) -> Self {
        let mut hints = SizeHints::default();
        let Some(&flags) = data.first() else {
            return hints;
        };
        hints.flags = HintFlags::from_bits_truncate(flags);
        let word = |i: usize| data.get(i).copied();

        if hints.flags.contains(HintFlags::P_BASE_SIZE) {
            if let (Some(w), Some(h)) = (word(15), word(16)) {
                hints.base = (dim(w), dim(h));
                hints.min = (dim(w), dim(h));
            }
        }
        if hints.flags.contains(HintFlags::P_MIN_SIZE) {
            if let (Some(w), Some(h)) = (word(5), word(6)) {
                hints.min = (dim(w), dim(h));
            }
        }
        hints.min = (hints.min.0.max(1), hints.min.1.max(1));

        if hints.flags.contains(HintFlags::P_MAX_SIZE) {
            if let (Some(w), Some(h)) = (word(7), word(8)) {
                // zero means "unbounded" on that axis
                let bound = |v: u32, min: i32| if v == 0 { i32::MAX } else { dim(v).max(min) };
                hints.max = Some((bound(w, hints.min.0), bound(h, hints.min.1)));
            }
        }
        if hints.flags.contains(HintFlags::P_RESIZE_INC) {
            if let (Some(w), Some(h)) = (word(9), word(10)) {
                hints.increment = (dim(w), dim(h));
            }
        }
        if hints.flags.contains(HintFlags::P_ASPECT) {
            if let [min_num, min_den, max_num, max_den] = data.get(11..15).unwrap_or_default() {
                if *min_den != 0 && *max_den != 0 {
                    let min = *min_num as f64 / *min_den as f64;
                    let max = *max_num as f64 / *max_den as f64;
                    if min > 0.0 && max >= min {
                        hints.aspect = Some((min, max));
                    }
                }
            }
        }
        hints
    }

    /// Whether the client asked for its own position (user or program).
    pub fn has_position(&self) -> bool {
        self.flags.intersects(HintFlags::US_POSITION | HintFlags::P_POSITION)
    }

    fn clamp(&self, width: i32, height: i32) -> (i32, i32) {
        let (mut w, mut h) = (width.max(self.min.0), height.max(self.min.1));
        if let Some((max_w, max_h)) = self.max {
            w = w.min(max_w);
            h = h.min(max_h);
        }
        (w.max(1), h.max(1))
    }
}

/// Truncates `delta` toward zero to a multiple of `increment`.
pub fn round_to_increment(delta: i32, increment: i32) -> i32 {
    if increment <= 0 {
        return delta;
    }
    delta - delta % increment
}

/// One pointer-driven resize step.
///
/// `pointer` is in root coordinates; `border_width` is subtracted from it
/// so the pointer lands on the outer corner of the border. The edges
/// opposite to `corner` stay fixed.
pub fn resize_step(
    current: Geometry,
    border_width: i32,
    corner: Corner,
    pointer: Point,
    hints: &SizeHints,
) -> Geometry {
    let px = pointer.x - border_width;
    let py = pointer.y - border_width;
    let (inc_w, inc_h) = hints.increment;

    let mut dw = 0;
    let mut dh = 0;
    if corner.contains(Corner::W) {
        dw = round_to_increment(current.x - px, inc_w);
    } else if corner.contains(Corner::E) {
        dw = round_to_increment(px - current.right(), inc_w);
    }
    if corner.contains(Corner::N) {
        dh = round_to_increment(current.y - py, inc_h);
    } else if corner.contains(Corner::S) {
        dh = round_to_increment(py - current.bottom(), inc_h);
    }

    let mut width = current.width + dw;
    let height = current.height + dh;

    if let Some((min_aspect, max_aspect)) = hints.aspect {
        let w = width - hints.base.0;
        let h = height - hints.base.1;
        if h > 0 {
            let aspect = w as f64 / h as f64;
            if aspect > max_aspect {
                width = (h as f64 * max_aspect) as i32 + hints.base.0;
            } else if aspect < min_aspect {
                width = (h as f64 * min_aspect) as i32 + hints.base.0;
            }
        }
    }

    let (width, height) = hints.clamp(width, height);
    let x = if corner.contains(Corner::W) { current.right() - width } else { current.x };
    let y = if corner.contains(Corner::N) { current.bottom() - height } else { current.y };
    Geometry::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_hints(flags: HintFlags, set: &[(usize, u32)]) -> Vec<u32> {
        let mut data = vec![0u32; 18];
        data[0] = flags.bits();
        for &(i, v) in set {
            data[i] = v;
        }
        data
    }

    #[test]
    fn test_round_to_increment() {
        assert_eq!(round_to_increment(27, 10), 20);
        assert_eq!(round_to_increment(-27, 10), -20);
        assert_eq!(round_to_increment(27, 0), 27);
        assert_eq!(round_to_increment(9, 10), 0);
    }

    #[test]
    fn test_resize_with_increment() {
        let hints = SizeHints { increment: (10, 10), ..SizeHints::default() };
        let g = Geometry::new(0, 0, 100, 100);
        let out = resize_step(g, 0, Corner::SE, Point::new(127, 100), &hints);
        assert_eq!(out, Geometry::new(0, 0, 120, 100));
    }

    #[test]
    fn test_resize_clamps_to_max() {
        let hints = SizeHints { max: Some((110, 500)), ..SizeHints::default() };
        let g = Geometry::new(0, 0, 100, 100);
        let out = resize_step(g, 0, Corner::SE, Point::new(300, 300), &hints);
        assert_eq!(out, Geometry::new(0, 0, 110, 300));
    }

    #[test]
    fn test_resize_never_below_min() {
        let hints = SizeHints::default();
        let g = Geometry::new(100, 100, 50, 50);
        let out = resize_step(g, 0, Corner::SE, Point::new(0, 0), &hints);
        assert_eq!(out, Geometry::new(100, 100, 1, 1));
    }

    #[test]
    fn test_resize_north_west_keeps_opposite_edges() {
        let hints = SizeHints { min: (40, 40), ..SizeHints::default() };
        let g = Geometry::new(100, 100, 50, 50);
        let out = resize_step(g, 0, Corner::NW, Point::new(80, 140), &hints);
        // width grows by 20, height would shrink to 10 and is clamped
        assert_eq!(out, Geometry::new(80, 110, 70, 40));
        assert_eq!(out.right(), g.right());
        assert_eq!(out.bottom(), g.bottom());
    }

    #[test]
    fn test_resize_border_offset() {
        let hints = SizeHints::default();
        let g = Geometry::new(0, 0, 100, 100);
        let out = resize_step(g, 2, Corner::E, Point::new(152, 999), &hints);
        assert_eq!(out, Geometry::new(0, 0, 150, 100));
    }

    #[test]
    fn test_resize_aspect() {
        let hints = SizeHints { aspect: Some((1.0, 1.0)), ..SizeHints::default() };
        let g = Geometry::new(0, 0, 100, 100);
        let out = resize_step(g, 0, Corner::SE, Point::new(300, 150), &hints);
        assert_eq!(out, Geometry::new(0, 0, 150, 150));
    }

    #[test]
    fn test_from_raw_defaults() {
        assert_eq!(SizeHints::from_raw(&[]), SizeHints::default());
        let hints = SizeHints::from_raw(&[0]);
        assert_eq!(hints.min, (1, 1));
        assert_eq!(hints.max, None);
        assert!(!hints.has_position());
    }

    #[test]
    fn test_from_raw_fields() {
        let flags = HintFlags::P_MIN_SIZE
            | HintFlags::P_MAX_SIZE
            | HintFlags::P_RESIZE_INC
            | HintFlags::P_BASE_SIZE
            | HintFlags::P_POSITION;
        let data = raw_hints(
            flags,
            &[(5, 20), (6, 30), (7, 0), (8, 400), (9, 7), (10, 14), (15, 4), (16, 2)],
        );
        let hints = SizeHints::from_raw(&data);
        assert_eq!(hints.min, (20, 30));
        assert_eq!(hints.max, Some((i32::MAX, 400)));
        assert_eq!(hints.increment, (7, 14));
        assert_eq!(hints.base, (4, 2));
        assert!(hints.has_position());
    }

    #[test]
    fn test_from_raw_base_is_min_fallback() {
        let data = raw_hints(HintFlags::P_BASE_SIZE, &[(15, 10), (16, 0)]);
        let hints = SizeHints::from_raw(&data);
        assert_eq!(hints.min, (10, 1));
    }

    #[test]
    fn test_from_raw_zero_aspect_denominator() {
        let data = raw_hints(HintFlags::P_ASPECT, &[(11, 1), (12, 0), (13, 2), (14, 1)]);
        assert_eq!(SizeHints::from_raw(&data).aspect, None);

        let data = raw_hints(HintFlags::P_ASPECT, &[(11, 1), (12, 2), (13, 2), (14, 1)]);
        assert_eq!(SizeHints::from_raw(&data).aspect, Some((0.5, 2.0)));
    }

    #[test]
    fn test_corner_helpers() {
        assert_eq!(Corner::nearest(Point::new(90, 10), 100, 100), Corner::NE);
        assert_eq!(Corner::nearest(Point::new(-5, 60), 100, 100), Corner::SW);
        assert_eq!(Corner::from_net_direction(3), Some(Corner::E));
        assert_eq!(Corner::from_net_direction(8), None);
        assert_eq!(Corner::SE.anchor(100, 50), Point::new(100, 50));
        assert_eq!(Corner::N.anchor(100, 50), Point::new(50, 0));
    }
}
