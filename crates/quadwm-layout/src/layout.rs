use std::collections::VecDeque;

use bitflags::bitflags;

use crate::geometry::Geometry;

bitflags! {
    /// Maximization state of a window.
    ///
    /// `FULLSCREEN` is a marker of its own and is never combined with the
    /// maximize bits; a fullscreen layout compares equal to exactly
    /// `MaximizedState::FULLSCREEN`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaximizedState: u8 {
        const HORIZONTAL = 1;
        const VERTICAL = 2;
        const FULL = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
        const FULLSCREEN = 4;
    }
}

impl Default for MaximizedState {
    fn default() -> Self {
        Self::empty()
    }
}

impl MaximizedState {
    pub fn is_fullscreen(self) -> bool {
        self == MaximizedState::FULLSCREEN
    }

    /// Drops the "fully maximized" and fullscreen markers after a direct
    /// geometry change. A lone horizontal or vertical bit survives.
    pub fn reset(&mut self) {
        if self.contains(MaximizedState::FULL) {
            self.remove(MaximizedState::FULL);
        }
        self.remove(MaximizedState::FULLSCREEN);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
    pub geometry: Geometry,
    pub state: MaximizedState,
}

impl Layout {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry, state: MaximizedState::empty() }
    }
}

/// Bounded undo history of layouts, oldest first.
#[derive(Debug, Clone, Default)]
pub struct LayoutStack {
    entries: VecDeque<Layout>,
}

impl LayoutStack {
    pub const MAX_DEPTH: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `layout` unless it equals the current top. Evicts the oldest
    /// entry past [`Self::MAX_DEPTH`].
    pub fn push(&mut self, layout: Layout) {
        if self.entries.back() == Some(&layout) {
            return;
        }
        self.entries.push_back(layout);
        if self.entries.len() > Self::MAX_DEPTH {
            self.entries.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<Layout> {
        self.entries.pop_back()
    }

    pub fn top(&self) -> Option<&Layout> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layout> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout(x: i32) -> Layout {
        Layout::new(Geometry::new(x, 0, 100, 100))
    }

    #[test]
    fn test_push_keeps_last_ten() {
        let mut stack = LayoutStack::new();
        for i in 0..11 {
            stack.push(layout(i));
        }
        assert_eq!(stack.len(), 10);
        assert_eq!(stack.iter().next(), Some(&layout(1)));
        assert_eq!(stack.top(), Some(&layout(10)));
    }

    #[test]
    fn test_push_identical_is_noop() {
        let mut stack = LayoutStack::new();
        stack.push(layout(5));
        stack.push(layout(5));
        assert_eq!(stack.len(), 1);

        // same geometry with a different state is a different layout
        let mut maximized = layout(5);
        maximized.state = MaximizedState::HORIZONTAL;
        stack.push(maximized);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_pop_order_and_empty() {
        let mut stack = LayoutStack::new();
        assert_eq!(stack.pop(), None);
        stack.push(layout(1));
        stack.push(layout(2));
        assert_eq!(stack.pop(), Some(layout(2)));
        assert_eq!(stack.pop(), Some(layout(1)));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_reset_state() {
        let mut state = MaximizedState::FULL;
        state.reset();
        assert_eq!(state, MaximizedState::empty());

        let mut state = MaximizedState::VERTICAL;
        state.reset();
        assert_eq!(state, MaximizedState::VERTICAL);

        let mut state = MaximizedState::FULLSCREEN;
        assert!(state.is_fullscreen());
        state.reset();
        assert!(!state.is_fullscreen());
    }
}
