use std::time::Duration;

use quadwm_layout::{Geometry, Point};
use quadwm_menu::{Entry, Filter, Key, LaunchHandle, Launcher, Selection};
use tracing::{debug, warn};

use crate::backend::{Backend, TextRow, WindowId};
use crate::window::error::{log_and_ignore, log_warn, ErrorCategory};
use crate::window::manager::WindowManager;

const KEYBOARD_GRAB_ATTEMPTS: usize = 500;
const MAX_LINES: usize = 128;

/// What to do with a launcher's answer.
pub type Continuation<B> = Box<dyn FnOnce(&mut WindowManager<B>, Selection)>;

/// The launcher currently on screen.
pub struct ActiveLauncher {
    pub window: WindowId,
    launcher: Launcher,
    origin: Point,
    min_y: i32,
    max_height: i32,
}

/// A launcher whose answer has not been acted on yet.
pub struct PendingLaunch<B: Backend> {
    handle: LaunchHandle,
    then: Continuation<B>,
}

impl<B: Backend> WindowManager<B> {
    /// Opens a launcher at the pointer. `then` runs from the deferred queue
    /// once the user picks an entry or cancels.
    pub fn show_launcher(
        &mut self,
        title: &str,
        entries: Vec<Entry>,
        filter: Filter,
        then: impl FnOnce(&mut WindowManager<B>, Selection) + 'static,
    ) {
        if self.launcher.is_some() {
            debug!("Launcher already open");
            return;
        }
        let origin = self.pointer();
        let screen = self.screen_at(origin).subtract_gap(&self.gap());
        let pixel = self.color("activeborder");
        let Some(window) = self.error_tracker.warn_if_failed(
            self.backend.create_menu_window(origin, self.config.border_width, pixel),
            "create launcher window",
            ErrorCategory::Launcher,
        ) else {
            return;
        };

        let (launcher, handle) = Launcher::show(title, entries, filter);
        self.pending.push(PendingLaunch { handle, then: Box::new(then) });
        self.launcher = Some(ActiveLauncher {
            window,
            launcher,
            origin,
            min_y: screen.y,
            max_height: screen.height - 2 * self.config.border_width,
        });

        log_warn(self.backend.map(window), "map launcher");
        if !self.grab_launcher_keyboard(window) {
            self.error_tracker.record(ErrorCategory::Launcher, "grab keyboard", "keyboard is grabbed elsewhere");
            self.close_launcher();
            return;
        }
        self.redraw_launcher();
    }

    fn grab_launcher_keyboard(&self, window: WindowId) -> bool {
        for _ in 0..KEYBOARD_GRAB_ATTEMPTS {
            if let Ok(true) = self.backend.grab_keyboard(window) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    pub(crate) fn launcher_key(&mut self, key: Key) {
        let Some(active) = self.launcher.as_mut() else {
            return;
        };
        let redraw = active.launcher.handle_key(key);
        if active.launcher.is_finished() {
            self.close_launcher();
        } else if redraw {
            self.redraw_launcher();
        }
    }

    pub(crate) fn redraw_launcher(&mut self) {
        let Some(active) = self.launcher.as_ref() else {
            return;
        };
        let menu = active.launcher.menu();
        let mut rows = vec![TextRow::plain(menu.prompt())];
        rows.extend(menu.lines(MAX_LINES).into_iter().enumerate().map(|(i, line)| {
            if i == 0 {
                TextRow::inverted(line)
            } else {
                TextRow::plain(line)
            }
        }));

        let Some((width, height)) = self.error_tracker.warn_if_failed(
            self.backend.draw_text(active.window, &rows),
            "draw launcher",
            ErrorCategory::Launcher,
        ) else {
            return;
        };
        let g = place_menu(active.origin, width, height, active.min_y, active.max_height);
        log_warn(self.backend.move_resize(active.window, g), "place launcher");
    }

    fn close_launcher(&mut self) {
        let Some(mut active) = self.launcher.take() else {
            return;
        };
        // dropping an unanswered launcher resolves it as cancelled
        active.launcher.cancel();
        log_warn(self.backend.ungrab_keyboard(), "ungrab keyboard");
        log_and_ignore(self.backend.destroy_window(active.window), "destroy launcher");
    }

    /// Moves resolved launchers' continuations onto the deferred queue.
    pub(crate) fn poll_launches(&mut self) {
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for mut pending in std::mem::take(&mut self.pending) {
            match pending.handle.try_wait() {
                Some(selection) => {
                    debug!(accepted = selection.accepted, "Launcher resolved");
                    let then = pending.then;
                    self.defer(move |wm| then(wm, selection));
                }
                None => still_pending.push(pending),
            }
        }
        self.pending = still_pending;
    }
}

/// Places a `width` x `height` menu at `origin`, shrinking it to the
/// screen height and sliding it up so it stays on screen.
fn place_menu(origin: Point, width: i32, height: i32, min_y: i32, max_height: i32) -> Geometry {
    let height = height.min(max_height).max(1);
    let mut y = origin.y;
    if y + height > max_height + min_y {
        y = max_height + min_y - height;
    }
    if height == max_height {
        y = min_y;
    }
    if y < min_y {
        warn!("Launcher does not fit on screen");
        y = min_y;
    }
    Geometry::new(origin.x, y, width.max(1), height)
}
