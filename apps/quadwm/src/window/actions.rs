//! Geometry and stacking operations on managed windows.
//!
//! Everything here updates the in-memory layout first and then tells the
//! server; a failed request is logged and the local model is kept.

use quadwm_layout::{
    collisions, visible, Direction, Gap, Geometry, Layout, MaximizedState, Obstacle, Point, Region,
};
use tracing::{debug, info};

use crate::backend::{Backend, IcccmState, NetState, Protocol, WindowId};
use crate::window::client::Snapshot;
use crate::window::error::{log_warn, ErrorCategory};
use crate::window::manager::WindowManager;
use crate::window::Layer;

impl<B: Backend> WindowManager<B> {
    pub fn gap(&self) -> Gap {
        let gap = self.config.gap;
        Gap { top: gap.top, bottom: gap.bottom, left: gap.left, right: gap.right }
    }

    /// The screen holding the centre of `id`.
    pub fn screen_of(&self, id: WindowId) -> Geometry {
        let center = self.windows.get(&id).map(|w| w.center()).unwrap_or_default();
        self.screen_at(center)
    }

    fn apply_geometry(&mut self, id: WindowId, geometry: Geometry, reset: bool) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if reset && win.is_pinned() {
            debug!(window = id, "Ignoring move of a frozen window");
            return;
        }
        win.layout.geometry = geometry;
        if reset {
            win.layout.state.reset();
            win.forget_stale_unmaximize();
        }
        self.error_tracker.warn_if_failed(
            self.backend.move_resize(id, geometry),
            "move/resize window",
            ErrorCategory::X11,
        );
        if reset {
            self.sync_net_state(id);
        }
    }

    pub fn move_to(&mut self, id: WindowId, to: Point) {
        let Some(g) = self.windows.get(&id).map(|w| w.geometry()) else {
            return;
        };
        self.apply_geometry(id, Geometry { x: to.x, y: to.y, ..g }, true);
    }

    pub fn resize_to(&mut self, id: WindowId, width: i32, height: i32) {
        let Some(g) = self.windows.get(&id).map(|w| w.geometry()) else {
            return;
        };
        self.apply_geometry(id, Geometry { width, height, ..g }, true);
    }

    pub fn move_resize_to(&mut self, id: WindowId, geometry: Geometry) {
        self.apply_geometry(id, geometry, true);
    }

    /// Moves without touching the maximized state.
    pub fn move_to_no_reset(&mut self, id: WindowId, to: Point) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        win.layout.geometry.x = to.x;
        win.layout.geometry.y = to.y;
        self.error_tracker.warn_if_failed(self.backend.move_to(id, to), "move window", ErrorCategory::X11);
    }

    pub fn move_resize_to_no_reset(&mut self, id: WindowId, geometry: Geometry) {
        self.apply_geometry(id, geometry, false);
    }

    /// Publishes the window's layout and layer as `_NET_WM_STATE`.
    pub fn sync_net_state(&mut self, id: WindowId) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let state = win.layout.state;
        let mut atoms = Vec::new();
        if state.contains(MaximizedState::HORIZONTAL) {
            atoms.push(NetState::MaximizedHorz);
        }
        if state.contains(MaximizedState::VERTICAL) {
            atoms.push(NetState::MaximizedVert);
        }
        if state.is_fullscreen() {
            atoms.push(NetState::Fullscreen);
        }
        match win.layer {
            Layer::Above => atoms.push(NetState::Above),
            Layer::Below => atoms.push(NetState::Below),
            Layer::Desktop | Layer::Normal => {}
        }
        log_warn(self.backend.set_net_wm_state(id, &atoms), "set _NET_WM_STATE");
    }

    pub fn push_layout(&mut self, id: WindowId) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.push_layout();
        }
    }

    pub fn pop_layout(&mut self, id: WindowId) {
        let Some(layout) = self.windows.get_mut(&id).and_then(|w| w.layout_stack.pop()) else {
            return;
        };
        self.apply_layout(id, layout);
        self.center_pointer(id);
    }

    fn apply_layout(&mut self, id: WindowId, layout: Layout) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.layout.state = layout.state;
            win.forget_stale_unmaximize();
        }
        self.move_resize_to_no_reset(id, layout.geometry);
        self.sync_net_state(id);
    }

    pub fn fullscreen(&mut self, id: WindowId) {
        let screen = self.screen_of(id);
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if win.is_fullscreen() {
            return;
        }
        debug!(window = id, "Fullscreen");
        win.unfullscreen = Some(Snapshot { geometry: win.geometry(), layer: win.layer });
        win.border_width = 0;
        log_warn(self.backend.set_border_width(id, 0), "set border width");
        self.move_resize_to_no_reset(id, screen);

        if let Some(win) = self.windows.get_mut(&id) {
            win.layout.state = MaximizedState::FULLSCREEN;
            win.frozen = true;
        }
        self.set_layer(id, Layer::Above);
        self.raise(id);
        self.sync_net_state(id);
    }

    pub fn unfullscreen(&mut self, id: WindowId) {
        let border_width = self.config.border_width;
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if !win.is_fullscreen() {
            return;
        }
        debug!(window = id, "Unfullscreen");
        let snapshot = win.unfullscreen.take();
        let geometry = snapshot.map_or(win.geometry(), |s| s.geometry);
        let layer = snapshot.map_or(Layer::Normal, |s| s.layer);
        win.border_width = if win.ignored { 0 } else { border_width };
        let bw = win.border_width;
        log_warn(self.backend.set_border_width(id, bw), "set border width");
        self.move_resize_to_no_reset(id, geometry);

        if let Some(win) = self.windows.get_mut(&id) {
            win.layout.state = MaximizedState::empty();
            win.frozen = false;
        }
        self.set_layer(id, layer);
        self.sync_net_state(id);
    }

    pub fn toggle_fullscreen(&mut self, id: WindowId) {
        if self.windows.get(&id).is_some_and(|w| w.is_fullscreen()) {
            self.unfullscreen(id);
        } else {
            self.fullscreen(id);
        }
    }

    /// Extends the window across its screen along the axes in `state`.
    pub fn maximize(&mut self, id: WindowId, state: MaximizedState) {
        let screen = self.screen_of(id).subtract_gap(&self.gap());
        let border_width = self.config.border_width;
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if win.is_fullscreen() {
            return;
        }
        win.push_layout();
        if win.unmaximize.is_none() || !win.layout.state.intersects(MaximizedState::FULL) {
            win.unmaximize = Some(win.layout);
        }

        let mut g = win.geometry();
        if state.contains(MaximizedState::HORIZONTAL) {
            g.x = screen.x;
            g.width = screen.width - 2 * border_width;
        }
        if state.contains(MaximizedState::VERTICAL) {
            g.y = screen.y;
            g.height = screen.height - 2 * border_width;
        }
        self.move_resize_to_no_reset(id, g);
        if let Some(win) = self.windows.get_mut(&id) {
            win.layout.state |= state;
        }
        self.sync_net_state(id);
    }

    /// Restores the layout from before the first maximize.
    pub fn unmaximize(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if win.is_fullscreen() {
            return;
        }
        match win.unmaximize.take() {
            Some(layout) => {
                win.push_layout();
                self.apply_layout(id, layout);
            }
            None => {
                win.layout.state.remove(MaximizedState::FULL);
                self.sync_net_state(id);
            }
        }
    }

    /// Drops one maximized axis, restoring its extent from the snapshot.
    pub fn unmaximize_axis(&mut self, id: WindowId, axis: MaximizedState) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        if !win.layout.state.contains(axis) {
            return;
        }
        let remaining = win.layout.state.difference(axis) & MaximizedState::FULL;
        let Some(snapshot) = win.unmaximize else {
            if let Some(win) = self.windows.get_mut(&id) {
                win.layout.state.remove(axis);
            }
            self.sync_net_state(id);
            return;
        };
        if remaining.is_empty() {
            self.unmaximize(id);
            return;
        }

        let mut g = win.geometry();
        let old = snapshot.geometry;
        if axis.contains(MaximizedState::HORIZONTAL) {
            g.x = old.x;
            g.width = old.width;
        }
        if axis.contains(MaximizedState::VERTICAL) {
            g.y = old.y;
            g.height = old.height;
        }
        self.move_resize_to_no_reset(id, g);
        if let Some(win) = self.windows.get_mut(&id) {
            win.layout.state.remove(axis);
        }
        self.sync_net_state(id);
    }

    /// Windows in the Normal state that are not completely covered, bottom
    /// to top. The tree spans `[0, extent)` of the screens, so only the
    /// part of a window at non-negative coordinates counts.
    pub fn visible_windows(&self) -> Vec<WindowId> {
        let stack: Vec<(u32, Region)> = self
            .mapped_windows()
            .into_iter()
            .filter_map(|id| self.windows.get(&id).map(|w| (id, Region::from(w.geometry()))))
            .collect();
        let size = self
            .screens()
            .iter()
            .map(|s| (s.right().max(s.bottom())).max(1) as u32)
            .max()
            .unwrap_or(1);
        visible(size, &stack)
    }

    fn obstacles(&self, ids: Vec<WindowId>) -> Vec<Obstacle> {
        ids.into_iter().filter_map(|id| self.windows.get(&id).map(|w| w.obstacle())).collect()
    }

    /// Grows the window into the free space around it, staying clear of
    /// every visible window.
    pub fn fill(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        win.push_layout();
        let subject = win.obstacle();
        let others = self.obstacles(self.visible_windows());
        let screen = self.screen_of(id).subtract_gap(&self.gap());
        let g = quadwm_layout::calculate_fill(&subject, &others, screen);
        debug!(window = id, ?g, "Fill");
        self.move_resize_to_no_reset(id, g);
    }

    /// Extends one edge up to the nearest window or screen edge.
    pub fn fill_direction(&mut self, id: WindowId, direction: Direction) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let subject = win.obstacle();
        let screen = self.screen_of(id).subtract_gap(&self.gap());
        let bounds = collisions(&subject, &self.obstacles(self.mapped_windows()), screen);
        let g = direction.fill(subject.geometry, &bounds);
        self.push_layout(id);
        self.move_resize_to_no_reset(id, g);
    }

    /// Moves the window flush against whatever is next to it, taking the
    /// pointer along.
    pub fn push_direction(&mut self, id: WindowId, direction: Direction) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let subject = win.obstacle();
        let screen = self.screen_of(id).subtract_gap(&self.gap());
        let bounds = collisions(&subject, &self.obstacles(self.mapped_windows()), screen);
        let old = subject.geometry;
        let g = direction.push(old, &bounds);
        self.push_layout(id);
        log_warn(self.backend.warp_pointer_by(g.x - old.x, g.y - old.y), "warp pointer");
        self.move_to_no_reset(id, Point::new(g.x, g.y));
    }

    /// Keyboard move by `move_amount` steps.
    pub fn move_by(&mut self, id: WindowId, xf: i32, yf: i32) {
        let Some(g) = self.windows.get(&id).filter(|w| !w.is_pinned()).map(|w| w.geometry()) else {
            return;
        };
        let (dx, dy) = (xf * self.config.move_amount, yf * self.config.move_amount);
        self.push_layout(id);
        self.move_to(id, Point::new(g.x + dx, g.y + dy));
        log_warn(self.backend.warp_pointer_by(dx, dy), "warp pointer");
    }

    pub fn center_pointer(&self, id: WindowId) {
        if let Some(win) = self.windows.get(&id) {
            log_warn(self.backend.warp_pointer(win.center()), "warp pointer");
        }
    }

    pub fn activate(&mut self, id: WindowId) {
        self.raise(id);
        self.center_pointer(id);
    }

    pub fn toggle_freeze(&mut self, id: WindowId) {
        if let Some(win) = self.windows.get_mut(&id) {
            win.frozen = !win.frozen;
            debug!(window = id, frozen = win.frozen, "Freeze toggled");
        }
    }

    /// Puts `id` on top of its layer.
    pub fn raise(&mut self, id: WindowId) {
        self.restack_with(id, true);
    }

    /// Puts `id` at the bottom of its layer.
    pub fn lower(&mut self, id: WindowId) {
        self.restack_with(id, false);
    }

    fn restack_with(&mut self, id: WindowId, on_top: bool) {
        let Some(layer) = self.windows.get(&id).map(|w| w.layer) else {
            return;
        };
        let root = self.backend.root();
        let mut others: Vec<WindowId> =
            self.mapped_windows().into_iter().filter(|w| *w != id && *w != root).collect();
        // the window itself may not count as mapped yet
        if on_top {
            others.push(id);
        } else {
            others.insert(0, id);
        }
        let order = self.order_by_layer(&others, Some((id, layer)));
        self.error_tracker.warn_if_failed(self.backend.restack(&order), "restack", ErrorCategory::X11);
    }

    pub fn set_layer(&mut self, id: WindowId, layer: Layer) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        win.layer = layer;
        self.sync_net_state(id);
        let order = self.order_by_layer(&self.mapped_windows(), None);
        self.error_tracker.warn_if_failed(self.backend.restack(&order), "restack", ErrorCategory::X11);
    }

    pub fn toggle_layer(&mut self, id: WindowId, layer: Layer) {
        let Some(current) = self.windows.get(&id).map(|w| w.layer) else {
            return;
        };
        self.set_layer(id, if current == layer { Layer::Normal } else { layer });
    }

    /// Stable sort of `ids` by layer, lowest first.
    fn order_by_layer(&self, ids: &[WindowId], known: Option<(WindowId, Layer)>) -> Vec<WindowId> {
        let layer_of = |id: WindowId| match known {
            Some((k, layer)) if k == id => layer,
            _ => self.windows.get(&id).map_or(Layer::Normal, |w| w.layer),
        };
        Layer::ALL
            .iter()
            .flat_map(|layer| ids.iter().copied().filter(move |id| layer_of(*id) == *layer))
            .collect()
    }

    /// Asks the client to close, killing it if it does not speak
    /// `WM_DELETE_WINDOW`.
    pub fn delete(&mut self, id: WindowId) {
        let supported = self.backend.protocols(id).is_ok_and(|p| p.contains(&Protocol::DeleteWindow));
        let result = if supported {
            debug!(window = id, "Sending WM_DELETE_WINDOW");
            self.backend.send_protocol(id, Protocol::DeleteWindow)
        } else {
            debug!(window = id, "Killing client");
            self.backend.kill(id)
        };
        self.error_tracker.warn_if_failed(result, "delete window", ErrorCategory::Window);
    }

    /// Swaps every window between two side-by-side screens.
    pub fn cycle_screens(&mut self) {
        let screens = self.screens();
        if screens.len() != 2 {
            return;
        }
        let total: i32 = screens.iter().map(|s| s.width).sum();
        if total <= 0 {
            return;
        }
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            let Some(g) = self.windows.get(&id).map(|w| w.geometry()) else {
                continue;
            };
            let width = self.screen_of(id).width;
            self.move_to(id, Point::new((g.x + width).rem_euclid(total), g.y));
        }
    }

    pub fn debug_dump(&self) {
        let mapped = self.windows.values().filter(|w| w.state == IcccmState::Normal && w.mapped).count();
        info!(managed = self.windows.len(), mapped, current = ?self.current, "Window manager state");
        for win in self.windows.values() {
            info!(
                window = win.id,
                name = %win.name,
                class = %win.class,
                group = ?win.group,
                layer = ?win.layer,
                geometry = ?win.geometry(),
                state = ?win.layout.state,
                "Managed window"
            );
        }
    }
}
