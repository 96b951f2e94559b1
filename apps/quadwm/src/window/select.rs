//! `fillsel`: pick a spot with the pointer and fill the window out from
//! there, with a live outline of the result.

use std::time::{Duration, Instant};

use quadwm_layout::{calculate_fill, Geometry, Obstacle, Point};
use tracing::{debug, warn};

use crate::backend::{Backend, CursorShape, WindowId};
use crate::window::error::{log_and_ignore, log_warn, ErrorCategory};
use crate::window::manager::WindowManager;

const FRAME_PIXEL: u32 = 0x00ff00;
const FRAME_THICKNESS: i32 = 5;
const MOTION_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct FillSelect {
    pub window: WindowId,
    pub frame: WindowId,
    last_preview: Option<Geometry>,
    last_motion: Instant,
}

impl<B: Backend> WindowManager<B> {
    pub fn fill_select_begin(&mut self, id: WindowId) {
        if self.fill_select.is_some() || !self.windows.contains_key(&id) {
            return;
        }
        let Some(frame) =
            self.error_tracker.warn_if_failed(self.backend.create_frame_window(FRAME_PIXEL), "create frame", ErrorCategory::X11)
        else {
            return;
        };
        log_warn(self.backend.map(frame), "map frame");

        let grabbed = log_warn(self.backend.grab_pointer(frame, CursorShape::Normal), "grab pointer");
        if grabbed != Some(true) {
            warn!("Could not grab the pointer for fill select");
            log_and_ignore(self.backend.destroy_window(frame), "destroy frame");
            return;
        }
        if let Some(win) = self.windows.get_mut(&id) {
            win.push_layout();
        }
        // Escape needs to reach us wherever the pointer is
        log_warn(self.backend.grab_keyboard(frame), "grab keyboard");

        self.fill_select = Some(FillSelect { window: id, frame, last_preview: None, last_motion: Instant::now() });
        debug!(window = id, frame, "Fill select begin");
        let pointer = self.pointer();
        self.fill_select_preview(pointer);
    }

    pub fn fill_select_motion(&mut self, root: Point) {
        let Some(select) = self.fill_select.as_mut() else {
            return;
        };
        if select.last_motion.elapsed() < MOTION_INTERVAL {
            return;
        }
        select.last_motion = Instant::now();
        self.fill_select_preview(root);
    }

    fn fill_select_preview(&mut self, at: Point) {
        let Some((window, frame)) = self.fill_select.as_ref().map(|s| (s.window, s.frame)) else {
            return;
        };
        let Some(border_width) = self.windows.get(&window).map(|w| w.border_width) else {
            return;
        };
        let g = self.fill_geometry_from(window, at);
        if self.fill_select.as_ref().and_then(|s| s.last_preview) == Some(g) {
            return;
        }
        log_warn(self.backend.shape_frame(frame, g.outer(border_width), FRAME_THICKNESS), "shape frame");
        if let Some(select) = self.fill_select.as_mut() {
            select.last_preview = Some(g);
        }
    }

    pub fn fill_select_click(&mut self, root: Point) {
        let Some(window) = self.fill_select_cleanup() else {
            return;
        };
        let g = self.fill_geometry_from(window, root);
        debug!(window, ?g, "Fill select");
        self.move_resize_to_no_reset(window, g);
    }

    pub fn fill_select_cancel(&mut self) {
        if let Some(window) = self.fill_select_cleanup() {
            debug!(window, "Fill select cancelled");
        }
    }

    fn fill_select_cleanup(&mut self) -> Option<WindowId> {
        let select = self.fill_select.take()?;
        log_warn(self.backend.ungrab_pointer(), "ungrab pointer");
        log_warn(self.backend.ungrab_keyboard(), "ungrab keyboard");
        log_and_ignore(self.backend.destroy_window(select.frame), "destroy frame");
        Some(select.window)
    }

    /// Fill result for a 1x1 window at `at`, against the visible windows.
    fn fill_geometry_from(&self, window: WindowId, at: Point) -> Geometry {
        let border_width = self.windows.get(&window).map_or(0, |w| w.border_width);
        let seed = Obstacle::new(window, Geometry::new(at.x, at.y, 1, 1), border_width);
        let obstacles: Vec<Obstacle> = self
            .visible_windows()
            .into_iter()
            .filter(|id| *id != window)
            .filter_map(|id| self.windows.get(&id).map(|w| w.obstacle()))
            .collect();
        let screen = self.screen_at(at).subtract_gap(&self.gap());
        calculate_fill(&seed, &obstacles, screen)
    }
}
