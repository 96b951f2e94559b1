//! Region quadtree mapping screen areas to an owner id.
//!
//! The tree is rebuilt for every visibility query: windows are painted
//! back to front with their own id, after which a window is visible iff
//! some leaf under its region still carries that id.

use crate::geometry::Geometry;

/// Half-open rectangle `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    fn is_within(&self, outer: &Region) -> bool {
        self.x >= outer.x
            && self.y >= outer.y
            && self.x + self.width <= outer.x + outer.width
            && self.y + self.height <= outer.y + outer.height
    }
}

impl From<Geometry> for Region {
    fn from(g: Geometry) -> Self {
        Region::new(g.x, g.y, g.width, g.height)
    }
}

/// Smallest power of two that is `>= n`; 0 and 1 both yield 1.
pub fn round_up_to_power_of_two(n: u32) -> u32 {
    n.max(1).next_power_of_two()
}

#[derive(Debug, Clone)]
pub struct Node {
    region: Region,
    value: u32,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    /// Creates a root covering `[0, 0, size, size]` where `size` is
    /// `target_size` rounded up to a power of two.
    pub fn new(target_size: u32) -> Self {
        let size = round_up_to_power_of_two(target_size) as i32;
        Self::leaf(Region::new(0, 0, size, size), 0)
    }

    fn leaf(region: Region, value: u32) -> Self {
        Self { region, value, children: None }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn size(&self) -> i32 {
        self.region.width
    }

    pub fn is_split(&self) -> bool {
        self.children.is_some()
    }

    /// Paints `region` with `value`.
    pub fn set(&mut self, region: Region, value: u32) {
        if region.width <= 0 || region.height <= 0 {
            return;
        }
        if self.children.is_none() {
            if self.region.is_within(&region) || self.region.width <= 1 {
                self.value = value;
                return;
            }
            self.split();
        }

        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                if child.region.overlaps(&region) {
                    child.set(region, value);
                }
            }
        }
    }

    /// Value of the leaf containing `(x, y)`.
    pub fn get(&self, x: i32, y: i32) -> u32 {
        let mut node = self;
        while let Some(children) = node.children.as_ref() {
            node = &children[node.quadrant(x, y)];
        }
        node.value
    }

    /// True iff any leaf overlapping `region` carries `value`.
    pub fn has_value(&self, region: Region, value: u32) -> bool {
        match self.children.as_ref() {
            None => self.value == value && self.region.overlaps(&region),
            Some(children) => children
                .iter()
                .filter(|child| child.region.overlaps(&region))
                .any(|child| child.has_value(region, value)),
        }
    }

    /// Leaf regions with their values, in depth-first NW, NE, SW, SE order.
    pub fn leaves(&self) -> Vec<(Region, u32)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<(Region, u32)>) {
        match self.children.as_ref() {
            None => out.push((self.region, self.value)),
            Some(children) => children.iter().for_each(|c| c.collect_leaves(out)),
        }
    }

    fn quadrant(&self, x: i32, y: i32) -> usize {
        let half = self.region.width / 2;
        let mut quadrant = 0;
        if x >= self.region.x + half {
            quadrant += 1;
        }
        if y >= self.region.y + half {
            quadrant += 2;
        }
        quadrant
    }

    fn split(&mut self) {
        let Region { x, y, width, .. } = self.region;
        let half = width / 2;
        let v = self.value;
        self.children = Some(Box::new([
            Node::leaf(Region::new(x, y, half, half), v),
            Node::leaf(Region::new(x + half, y, half, half), v),
            Node::leaf(Region::new(x, y + half, half, half), v),
            Node::leaf(Region::new(x + half, y + half, half, half), v),
        ]));
    }
}

/// Paints `stack` (bottom to top) into a fresh tree of `size` and returns the
/// ids that still own at least one leaf inside their own region.
///
/// Ids must be non-zero; 0 is the unpainted background.
pub fn visible(size: u32, stack: &[(u32, Region)]) -> Vec<u32> {
    let mut tree = Node::new(size);
    for &(id, region) in stack {
        tree.set(region, id);
    }
    stack
        .iter()
        .filter(|(id, region)| tree.has_value(*region, *id))
        .map(|(id, _)| *id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_fully_covered_window() {
        let stack = [
            (1, Region::new(100, 100, 200, 200)),
            (2, Region::new(50, 50, 400, 400)),
        ];
        assert_eq!(visible(1920, &stack), vec![2]);
    }

    #[test]
    fn test_visible_single_uncovered_pixel() {
        let stack = [
            (1, Region::new(100, 100, 200, 200)),
            (2, Region::new(100, 100, 200, 199)),
        ];
        // the bottom row of window 1 is still exposed
        assert_eq!(visible(1920, &stack), vec![1, 2]);
    }

    #[test]
    fn test_visible_exposed_corner_not_at_centre() {
        // centre of window 1 is covered, only its top-left corner shows
        let stack = [
            (1, Region::new(0, 0, 100, 100)),
            (2, Region::new(10, 10, 200, 200)),
        ];
        assert_eq!(visible(512, &stack), vec![1, 2]);
    }

    #[test]
    fn test_visible_offscreen_window() {
        let stack = [(1, Region::new(-500, -500, 100, 100)), (2, Region::new(0, 0, 10, 10))];
        assert_eq!(visible(512, &stack), vec![2]);
    }

    #[test]
    fn test_round() {
        for (input, expected) in [(2, 2), (4, 4), (7, 8), (1920, 2048), (1, 1), (0, 1), (3840, 4096)] {
            assert_eq!(round_up_to_power_of_two(input), expected, "round({})", input);
        }
    }

    #[test]
    fn test_round_properties() {
        for n in 1..5000u32 {
            let r = round_up_to_power_of_two(n);
            assert!(r >= n);
            assert!(r.is_power_of_two());
            assert!(n == 1 || r / 2 < n);
        }
    }

    #[test]
    fn test_tree() {
        let mut q = Node::new(1920);
        assert_eq!(q.size(), 2048);

        q.set(Region::new(9, 9, 9, 9), 70);
        q.set(Region::new(400, 400, 50, 50), 999);
        q.set(Region::new(360, 360, 360, 360), 123);
        q.set(Region::new(300, 300, 360, 360), 50);

        assert_eq!(q.get(9, 9), 70);
        assert_eq!(q.get(13, 10), 70);
        assert_eq!(q.get(400, 400), 50);
        assert_eq!(q.get(700, 700), 123);
        assert_eq!(q.get(8, 8), 0);
        assert_eq!(q.get(18, 18), 0);

        assert!(!q.has_value(Region::new(425, 425, 25, 25), 999));
        assert!(q.has_value(Region::new(425, 425, 25, 25), 50));
    }

    #[test]
    fn test_fully_covered_root_does_not_split() {
        let mut q = Node::new(1024);
        q.set(Region::new(-10, -10, 2000, 2000), 7);
        assert!(!q.is_split());
        assert_eq!(q.get(512, 512), 7);
    }

    #[test]
    fn test_split_children_inherit_value() {
        let mut q = Node::new(16);
        q.set(Region::new(0, 0, 16, 16), 1);
        q.set(Region::new(0, 0, 1, 1), 2);
        assert!(q.is_split());
        assert_eq!(q.get(0, 0), 2);
        assert_eq!(q.get(1, 0), 1);
        assert_eq!(q.get(15, 15), 1);
    }

    #[test]
    fn test_centre_tie_goes_to_higher_quadrant() {
        let mut q = Node::new(8);
        q.set(Region::new(4, 4, 4, 4), 3);
        assert_eq!(q.get(4, 4), 3);
        assert_eq!(q.get(3, 4), 0);
        assert_eq!(q.get(4, 3), 0);
    }

    #[test]
    fn test_leaves_cover_tree() {
        let mut q = Node::new(64);
        q.set(Region::new(5, 7, 20, 11), 9);
        let area: i32 = q.leaves().iter().map(|(r, _)| r.width * r.height).sum();
        assert_eq!(area, 64 * 64);
        let painted: i32 = q
            .leaves()
            .iter()
            .filter(|(_, v)| *v == 9)
            .map(|(r, _)| r.width * r.height)
            .sum();
        assert_eq!(painted, 20 * 11);
    }

    #[test]
    fn test_zero_area_set_is_noop() {
        let mut q = Node::new(64);
        q.set(Region::new(10, 10, 0, 5), 4);
        assert!(!q.has_value(Region::new(0, 0, 64, 64), 4));
    }
}
