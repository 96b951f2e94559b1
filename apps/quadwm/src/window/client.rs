use quadwm_layout::{Corner, Geometry, Layout, LayoutStack, MaximizedState, Obstacle, Point, SizeHints};

use crate::backend::{IcccmState, WindowId};
use crate::window::Layer;

/// Geometry and layer captured before going fullscreen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub geometry: Geometry,
    pub layer: Layer,
}

/// State of an interactive move or resize, alive from begin to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drag {
    /// Pointer position when the drag started.
    pub pointer: Point,
    /// Window origin when the drag started.
    pub start: Point,
    /// Root coordinates of the button press.
    pub offset: Point,
    /// The corner being dragged; `None` for moves.
    pub corner: Option<Corner>,
}

/// A managed top-level window.
#[derive(Debug, Clone)]
pub struct Window {
    pub id: WindowId,
    pub state: IcccmState,
    pub layer: Layer,
    pub mapped: bool,
    pub border_width: i32,
    pub layout: Layout,
    pub layout_stack: LayoutStack,
    pub drag: Option<Drag>,
    pub frozen: bool,
    pub unfullscreen: Option<Snapshot>,
    pub unmaximize: Option<Layout>,
    pub overlay: Option<WindowId>,
    pub group: Option<u32>,
    pub ignored: bool,
    pub name: String,
    pub class: String,
    pub hints: SizeHints,
}

impl Window {
    pub fn new(id: WindowId, border_width: i32) -> Self {
        Self {
            id,
            state: IcccmState::Withdrawn,
            layer: Layer::Normal,
            mapped: false,
            border_width,
            layout: Layout::default(),
            layout_stack: LayoutStack::new(),
            drag: None,
            frozen: false,
            unfullscreen: None,
            unmaximize: None,
            overlay: None,
            group: None,
            ignored: false,
            name: String::new(),
            class: String::new(),
            hints: SizeHints::default(),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.layout.geometry
    }

    pub fn center(&self) -> Point {
        self.layout.geometry.center()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.layout.geometry.contains(p)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.layout.state.is_fullscreen()
    }

    /// Direct moves and resizes leave such a window where it is.
    pub fn is_pinned(&self) -> bool {
        self.frozen || self.is_fullscreen()
    }

    /// Drops the unmaximize snapshot once no maximized axis is left.
    pub fn forget_stale_unmaximize(&mut self) {
        if !self.layout.state.intersects(MaximizedState::FULL) {
            self.unmaximize = None;
        }
    }

    /// Saves the current layout unless it is already on top of the stack.
    pub fn push_layout(&mut self) {
        self.layout_stack.push(self.layout);
    }

    pub fn obstacle(&self) -> Obstacle {
        Obstacle::new(self.id, self.layout.geometry, self.border_width)
    }
}
