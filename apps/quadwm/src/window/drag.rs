//! Interactive move and resize.
//!
//! A drag runs `*_begin` on the button press (or `_NET_WM_MOVERESIZE`
//! request), `*_step` for every motion event while the pointer is grabbed,
//! and [`WindowManager::end_drag`] on release.

use quadwm_layout::{resize_step, snap_offset, Corner, Point};
use tracing::debug;

use crate::backend::{Backend, CursorShape, TextRow, WindowId};
use crate::window::client::Drag;
use crate::window::error::{log_and_ignore, log_warn, ErrorCategory};
use crate::window::manager::WindowManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Moving(WindowId),
    Resizing(WindowId),
}

impl DragPhase {
    pub fn window(self) -> Option<WindowId> {
        match self {
            DragPhase::Idle => None,
            DragPhase::Moving(id) | DragPhase::Resizing(id) => Some(id),
        }
    }
}

/// Whether a drag started and which cursor to show while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragDecision {
    pub proceed: bool,
    pub cursor: CursorShape,
}

impl DragDecision {
    fn refuse() -> Self {
        Self { proceed: false, cursor: CursorShape::Normal }
    }
}

impl<B: Backend> WindowManager<B> {
    pub fn move_begin(&mut self, id: WindowId, root: Point) -> DragDecision {
        if !self.windows.contains_key(&id) || self.drag != DragPhase::Idle {
            return DragDecision::refuse();
        }
        let pointer = self.pointer();
        self.raise(id);
        let Some(win) = self.windows.get_mut(&id) else {
            return DragDecision::refuse();
        };
        win.push_layout();
        let g = win.geometry();
        win.drag = Some(Drag { pointer, start: Point::new(g.x, g.y), offset: root, corner: None });
        self.drag = DragPhase::Moving(id);
        debug!(window = id, "Move begin");
        DragDecision { proceed: true, cursor: CursorShape::Move }
    }

    pub fn move_step(&mut self, root: Point) {
        let DragPhase::Moving(id) = self.drag else {
            return;
        };
        let gap = self.gap();
        let snap = self.config.snap_dist;
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let Some(drag) = win.drag.filter(|_| !win.frozen) else {
            return;
        };

        let mut g = win.geometry();
        g.x = drag.start.x + root.x - drag.offset.x;
        g.y = drag.start.y + root.y - drag.offset.y;

        let screen = self.screen_at(g.center()).subtract_gap(&gap);
        let outer = g.outer(win.border_width);
        g.x += snap_offset(g.x, g.x + outer.width, screen.x, screen.right(), snap);
        g.y += snap_offset(g.y, g.y + outer.height, screen.y, screen.bottom(), snap);

        self.move_to_no_reset(id, Point::new(g.x, g.y));
    }

    pub fn resize_begin(
        &mut self,
        id: WindowId,
        root: Point,
        event: Point,
        corner: Option<Corner>,
    ) -> DragDecision {
        if !self.windows.contains_key(&id) || self.drag != DragPhase::Idle {
            return DragDecision::refuse();
        }
        let pointer = self.pointer();
        let hints = self.backend.normal_hints(id).unwrap_or_default();
        let Some(win) = self.windows.get_mut(&id) else {
            return DragDecision::refuse();
        };
        win.push_layout();
        win.hints = hints;

        let g = win.geometry();
        let corner = corner.unwrap_or_else(|| Corner::nearest(event, g.width, g.height));
        win.drag = Some(Drag { pointer, start: Point::new(g.x, g.y), offset: root, corner: Some(corner) });
        let anchor = corner.anchor(g.width, g.height);
        let to = Point::new(g.x + win.border_width + anchor.x, g.y + win.border_width + anchor.y);
        self.drag = DragPhase::Resizing(id);
        debug!(window = id, ?corner, "Resize begin");

        log_warn(self.backend.warp_pointer(to), "warp pointer");
        self.show_overlay(id);
        DragDecision { proceed: true, cursor: CursorShape::Resize(corner) }
    }

    pub fn resize_step(&mut self, root: Point) {
        let DragPhase::Resizing(id) = self.drag else {
            return;
        };
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let Some(corner) = win.drag.filter(|_| !win.frozen).and_then(|d| d.corner) else {
            return;
        };
        let g = resize_step(win.geometry(), win.border_width, corner, root, &win.hints);
        self.move_resize_to_no_reset(id, g);
        self.write_overlay(id);
    }

    pub fn drag_step(&mut self, root: Point) {
        match self.drag {
            DragPhase::Idle => {}
            DragPhase::Moving(_) => self.move_step(root),
            DragPhase::Resizing(_) => self.resize_step(root),
        }
    }

    /// Finishes the current drag. The maximized state is only dropped when
    /// the drag actually changed the geometry.
    pub fn end_drag(&mut self, root: Point) {
        let phase = std::mem::take(&mut self.drag);
        log_warn(self.backend.ungrab_pointer(), "ungrab pointer");
        let Some(id) = phase.window() else {
            return;
        };
        let Some(drag) = self.windows.get_mut(&id).and_then(|w| w.drag.take()) else {
            return;
        };

        if let DragPhase::Resizing(_) = phase {
            self.hide_overlay(id);
            if let Some(win) = self.windows.get(&id) {
                if win.contains(drag.pointer) {
                    log_warn(self.backend.warp_pointer(drag.pointer), "warp pointer");
                } else if !win.contains(root) {
                    self.center_pointer(id);
                }
            }
        }

        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        let changed = win.layout_stack.top().is_some_and(|l| l.geometry != win.layout.geometry);
        if changed {
            win.layout.state.reset();
            win.forget_stale_unmaximize();
            self.sync_net_state(id);
        }
        debug!(window = id, changed, "Drag end");
    }

    pub(crate) fn grab_for_drag(&mut self, decision: DragDecision) {
        if !decision.proceed {
            return;
        }
        let Some(id) = self.drag.window() else {
            return;
        };
        let grabbed = self.error_tracker.warn_if_failed(
            self.backend.grab_pointer(id, decision.cursor),
            "grab pointer",
            ErrorCategory::X11,
        );
        if grabbed != Some(true) {
            debug!(window = id, "Pointer grab refused, abandoning drag");
            let pointer = self.pointer();
            self.end_drag(pointer);
        }
    }

    fn show_overlay(&mut self, id: WindowId) {
        let Some(overlay) = self.windows.get(&id).and_then(|w| w.overlay) else {
            return;
        };
        log_warn(self.backend.map(overlay), "map overlay");
        self.write_overlay(id);
    }

    fn hide_overlay(&mut self, id: WindowId) {
        if let Some(overlay) = self.windows.get(&id).and_then(|w| w.overlay) {
            log_and_ignore(self.backend.unmap(overlay), "unmap overlay");
        }
    }

    fn write_overlay(&mut self, id: WindowId) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let Some(overlay) = win.overlay else {
            return;
        };
        let g = win.geometry();
        let text = format!("{} × {}", g.width, g.height);
        if let Some((width, height)) = log_warn(self.backend.draw_text(overlay, &[TextRow::plain(text)]), "draw overlay")
        {
            log_warn(
                self.backend.move_resize(overlay, quadwm_layout::Geometry::new(0, 0, width.max(1), height.max(1))),
                "resize overlay",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Call, RecordingBackend};
    use crate::backend::WmEvent;
    use pretty_assertions::assert_eq;
    use quadwm_config::Config;
    use quadwm_layout::{Geometry, MaximizedState};

    fn wm_with(id: WindowId, g: Geometry) -> WindowManager<RecordingBackend> {
        let mut wm = WindowManager::new(RecordingBackend::new(), Config::default());
        wm.backend.add_mapped_window(id, g);
        wm.manage(id);
        wm.init_window(id);
        wm
    }

    #[test]
    fn test_move_drag_follows_pointer() {
        let mut wm = wm_with(1, Geometry::new(100, 100, 200, 200));
        let decision = wm.move_begin(1, Point::new(150, 150));
        assert_eq!(decision, DragDecision { proceed: true, cursor: CursorShape::Move });
        assert_eq!(wm.drag, DragPhase::Moving(1));

        wm.drag_step(Point::new(180, 130));
        assert_eq!(wm.windows[&1].geometry(), Geometry::new(130, 80, 200, 200));
        wm.end_drag(Point::new(180, 130));

        assert_eq!(wm.drag, DragPhase::Idle);
        assert!(wm.windows[&1].drag.is_none());
        assert_eq!(wm.windows[&1].layout_stack.top().map(|l| l.geometry), Some(Geometry::new(100, 100, 200, 200)));
    }

    #[test]
    fn test_move_snaps_to_screen_edge() {
        let mut wm = wm_with(1, Geometry::new(100, 100, 200, 200));
        wm.config.snap_dist = 10;
        wm.move_begin(1, Point::new(150, 150));
        wm.drag_step(Point::new(58, 150));
        assert_eq!(wm.windows[&1].geometry().x, 0);
    }

    #[test]
    fn test_frozen_window_does_not_move() {
        let mut wm = wm_with(1, Geometry::new(100, 100, 200, 200));
        wm.windows.get_mut(&1).unwrap().frozen = true;
        wm.move_begin(1, Point::new(150, 150));
        wm.drag_step(Point::new(300, 300));
        assert_eq!(wm.windows[&1].geometry(), Geometry::new(100, 100, 200, 200));
    }

    #[test]
    fn test_resize_drag_from_bottom_right() {
        let mut wm = wm_with(1, Geometry::new(100, 100, 200, 200));
        let decision = wm.resize_begin(1, Point::new(290, 290), Point::new(190, 190), None);
        assert_eq!(decision.cursor, CursorShape::Resize(Corner::SE));
        // pointer jumps onto the corner
        assert_eq!(wm.backend.pointer_position(), Point::new(301, 301));
        let overlay = wm.windows[&1].overlay.unwrap();
        assert!(wm.backend.calls().contains(&Call::Map(overlay)));

        wm.drag_step(Point::new(351, 401));
        assert_eq!(wm.windows[&1].geometry(), Geometry::new(100, 100, 250, 300));
        assert_eq!(wm.backend.text_of(overlay), vec![TextRow::plain("250 × 300")]);

        wm.end_drag(Point::new(351, 401));
        assert!(wm.backend.calls().contains(&Call::Unmap(overlay)));
    }

    #[test]
    fn test_drag_end_resets_state_only_after_change() {
        let mut wm = wm_with(1, Geometry::new(0, 0, 200, 200));
        wm.windows.get_mut(&1).unwrap().layout.state = MaximizedState::FULL;

        wm.move_begin(1, Point::new(10, 10));
        wm.end_drag(Point::new(10, 10));
        assert_eq!(wm.windows[&1].layout.state, MaximizedState::FULL);

        wm.move_begin(1, Point::new(10, 10));
        // moving a maximized window mid-drag keeps its bits until release
        wm.drag_step(Point::new(40, 10));
        assert_eq!(wm.windows[&1].layout.state, MaximizedState::FULL);
        wm.end_drag(Point::new(40, 10));
        assert_eq!(wm.windows[&1].layout.state, MaximizedState::empty());
    }

    #[test]
    fn test_button_release_ends_drag_and_ungrabs() {
        let mut wm = wm_with(1, Geometry::new(0, 0, 200, 200));
        wm.move_begin(1, Point::new(10, 10));
        wm.handle_event(WmEvent::ButtonRelease { window: 1, button: 1, root: Point::new(10, 10) }).unwrap();
        assert_eq!(wm.drag, DragPhase::Idle);
        assert!(wm.backend.calls().contains(&Call::UngrabPointer));
    }

    #[test]
    fn test_second_drag_is_refused() {
        let mut wm = wm_with(1, Geometry::new(0, 0, 200, 200));
        assert!(wm.move_begin(1, Point::new(10, 10)).proceed);
        assert!(!wm.resize_begin(1, Point::new(10, 10), Point::new(10, 10), None).proceed);
        assert_eq!(wm.drag, DragPhase::Moving(1));
    }
}
