use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use quadwm_config::Config;
use quadwm_layout::{screen_for_point, Geometry, Point};
use tracing::{debug, info, warn};

use crate::backend::{
    Backend, ClientMessage, ConfigureRequest, IcccmState, NetState, Protocol, WindowId, WmEvent,
    NET_WM_MOVERESIZE_CANCEL, NET_WM_MOVERESIZE_MOVE, NET_WM_MOVERESIZE_MOVE_KEYBOARD,
    NET_WM_MOVERESIZE_SIZE_KEYBOARD,
};
use crate::window::client::Window;
use crate::window::drag::DragPhase;
use crate::window::error::{log_warn, ErrorCategory, ErrorTracker};
use crate::window::keys;
use crate::window::launcher::{ActiveLauncher, PendingLaunch};
use crate::window::select::FillSelect;
use crate::window::Layer;

/// Work queued to run on the next pass of the event loop.
pub type Deferred<B> = Box<dyn FnOnce(&mut WindowManager<B>)>;

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    Restart,
    /// Another window manager took the selection.
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Move,
    Resize,
    Lower,
}

impl MouseAction {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "window_move" => MouseAction::Move,
            "window_resize" => MouseAction::Resize,
            "window_lower" => MouseAction::Lower,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MouseBinding {
    button: u8,
    modifiers: u16,
    action: MouseAction,
}

pub struct WindowManager<B: Backend> {
    pub backend: B,
    pub config: Config,
    pub windows: HashMap<WindowId, Window>,
    pub current: Option<WindowId>,
    pub error_tracker: ErrorTracker,
    pub(crate) drag: DragPhase,
    pub(crate) fill_select: Option<FillSelect>,
    pub(crate) launcher: Option<ActiveLauncher>,
    pub(crate) pending: Vec<PendingLaunch<B>>,
    pub(crate) deferred: VecDeque<Deferred<B>>,
    pub(crate) exit: Option<Exit>,
    colors: HashMap<String, u32>,
    key_bindings: HashMap<(u32, u16), String>,
    mouse_bindings: Vec<MouseBinding>,
}

impl<B: Backend> WindowManager<B> {
    pub fn new(backend: B, config: Config) -> Self {
        Self {
            backend,
            config,
            windows: HashMap::new(),
            current: None,
            error_tracker: ErrorTracker::new(),
            drag: DragPhase::Idle,
            fill_select: None,
            launcher: None,
            pending: Vec::new(),
            deferred: VecDeque::new(),
            exit: None,
            colors: HashMap::new(),
            key_bindings: HashMap::new(),
            mouse_bindings: Vec::new(),
        }
    }

    /// Installs the bindings and adopts the windows that are already on
    /// screen.
    pub fn start(&mut self) -> Result<()> {
        self.grab_bindings();
        self.scan_windows()
    }

    fn grab_bindings(&mut self) {
        let binds: Vec<_> = self.config.binds.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (spec, command) in binds {
            let Some(keysym) = keys::keysym_from_name(&spec.key) else {
                warn!("Unknown key {:?} in binding {}", spec.key, spec);
                continue;
            };
            let modifiers = keys::modifier_mask(&spec);
            self.error_tracker.warn_if_failed(
                self.backend.grab_key(keysym, modifiers),
                "grab key",
                ErrorCategory::X11,
            );
            self.key_bindings.insert((keysym, modifiers), command);
        }

        for (spec, action) in &self.config.mouse_binds {
            let (Some(button), Some(action)) = (keys::button_from_name(&spec.key), MouseAction::parse(action))
            else {
                warn!("Ignoring mouse binding {} = {}", spec, action);
                continue;
            };
            self.mouse_bindings.push(MouseBinding { button, modifiers: keys::modifier_mask(spec), action });
        }
        debug!(keys = self.key_bindings.len(), buttons = self.mouse_bindings.len(), "Bindings installed");
    }

    pub fn scan_windows(&mut self) -> Result<()> {
        let pointer = self.pointer();
        let mut to_mark = None;
        for id in self.backend.stacking_order()? {
            let Ok(attrs) = self.backend.attributes(id) else {
                continue;
            };
            if attrs.override_redirect || !attrs.viewable {
                continue;
            }
            self.manage(id);
            self.init_window(id);
            if self.windows.get(&id).is_some_and(|w| w.contains(pointer)) {
                to_mark = Some(id);
            }
        }
        info!("Adopted {} existing windows", self.windows.len());
        if let Some(id) = to_mark {
            self.mark_active(id);
        }
        Ok(())
    }

    /// Registers `id` unless it is known already.
    pub fn manage(&mut self, id: WindowId) {
        if self.windows.contains_key(&id) {
            return;
        }
        debug!(window = id, "Managing window");

        let mut win = Window::new(id, self.config.border_width);
        if let Some(attrs) =
            self.error_tracker.warn_if_failed(self.backend.attributes(id), "get window attributes", ErrorCategory::X11)
        {
            if attrs.mapped {
                win.mapped = true;
                win.state = IcccmState::Normal;
            }
        }
        if let Ok(geometry) = self.backend.geometry(id) {
            win.layout.geometry = geometry;
        }

        let (instance, class) = self.backend.class(id).unwrap_or_default();
        win.name = self.backend.name(id).ok().filter(|n| !n.is_empty()).unwrap_or_else(|| instance.clone());
        win.group = self.config.group_for(&instance, &class);
        win.ignored = self.config.is_ignored(&win.name);
        win.class = class;

        log_warn(self.backend.select_client_events(id), "select client events");
        self.windows.insert(id, win);
    }

    /// Applies borders, reads the window's geometry and hints, and sets up
    /// its mouse bindings and resize overlay.
    pub fn init_window(&mut self, id: WindowId) {
        debug!(window = id, "Initializing");
        let inactive = self.color("inactiveborder");
        let border_width = match self.windows.get(&id) {
            Some(win) if win.ignored => 0,
            Some(_) => self.config.border_width,
            None => return,
        };
        log_warn(self.backend.set_border_width(id, border_width), "set border width");
        log_warn(self.backend.set_border_color(id, inactive), "set border color");

        let geometry = self.backend.geometry(id).ok();
        let hints = self.backend.normal_hints(id).unwrap_or_default();
        let screen = self.screen_at(geometry.map(|g| g.center()).unwrap_or_default());
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        win.border_width = border_width;
        win.hints = hints;
        if let Some(geometry) = geometry {
            win.layout.geometry = geometry;
        }
        if win.layout.geometry.y > screen.bottom() {
            win.layout.geometry.y = screen.bottom() - win.layout.geometry.height;
        }

        if let Ok(states) = self.backend.net_wm_state(id) {
            for state in states {
                self.add_state(id, state);
            }
        }

        for binding in &self.mouse_bindings {
            self.error_tracker.warn_if_failed(
                self.backend.grab_button(id, binding.button, binding.modifiers),
                "grab button",
                ErrorCategory::X11,
            );
        }

        let overlay = self.error_tracker.warn_if_failed(
            self.backend.create_overlay(id),
            "create overlay",
            ErrorCategory::Window,
        );
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if let Some(old) = std::mem::replace(&mut win.overlay, overlay) {
            log_warn(self.backend.destroy_window(old), "destroy stale overlay");
        }
        log_warn(self.backend.set_wm_state(id, win.state), "set WM_STATE");
    }

    pub fn handle_event(&mut self, event: WmEvent) -> Result<()> {
        match event {
            WmEvent::MapRequest { window } => self.map_request(window),
            WmEvent::ConfigureRequest { window, request } => self.configure_request(window, request),
            WmEvent::UnmapNotify { window } => self.unmap_notify(window),
            WmEvent::DestroyNotify { window } => self.destroy_notify(window),
            WmEvent::EnterNotify { window } => {
                if self.windows.contains_key(&window) {
                    debug!(window, "Enter");
                    self.mark_active(window);
                }
            }
            WmEvent::ClientMessage { window, message } => self.client_message(window, message),
            WmEvent::ButtonPress { window, button, state, root, event } => {
                if self.fill_select.as_ref().is_some_and(|s| s.frame == window) {
                    if button == 1 {
                        self.fill_select_click(root);
                    }
                } else {
                    self.button_press(window, button, state, root, event);
                }
            }
            WmEvent::ButtonRelease { root, .. } => {
                if self.drag != DragPhase::Idle {
                    self.end_drag(root);
                }
            }
            WmEvent::MotionNotify { root, .. } => {
                if self.drag != DragPhase::Idle {
                    self.drag_step(root);
                } else if self.fill_select.is_some() {
                    self.fill_select_motion(root);
                }
            }
            WmEvent::KeyPress { window, keysym, shifted, state } => {
                self.key_press(window, keysym, shifted, state);
            }
            WmEvent::Expose { window } => {
                if self.launcher.as_ref().is_some_and(|l| l.window == window) {
                    self.redraw_launcher();
                }
            }
            WmEvent::SelectionClear => {
                info!("A different WM is replacing us");
                self.exit = Some(Exit::Replaced);
            }
        }
        Ok(())
    }

    fn map_request(&mut self, id: WindowId) {
        self.manage(id);
        if self.windows.get(&id).is_some_and(|w| w.mapped) {
            debug!(window = id, "Not mapping already mapped window");
            return;
        }
        debug!(window = id, "Mapping");

        let hints = self.backend.wm_hints(id).unwrap_or_default();
        self.init_window(id);
        let pointer = self.pointer();

        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if !win.hints.has_position() && win.layout.state.is_empty() {
            let g = &mut win.layout.geometry;
            g.x = pointer.x - g.width / 2;
            g.y = pointer.y - g.height / 2;
        }
        let geometry = win.layout.geometry;
        let border_width = win.border_width;
        let state = hints.initial_state.unwrap_or(IcccmState::Normal);
        win.state = state;

        log_warn(self.backend.move_to(id, Point::new(geometry.x, geometry.y)), "move window");
        self.error_tracker.warn_if_failed(self.backend.map(id), "map window", ErrorCategory::X11);
        self.raise(id);
        self.center_pointer(id);
        log_warn(self.backend.set_wm_state(id, state), "set WM_STATE");
        log_warn(self.backend.send_configure_notify(id, geometry, border_width), "send configure notify");

        if let Some(win) = self.windows.get_mut(&id) {
            win.mapped = true;
        }
    }

    fn configure_request(&mut self, id: WindowId, request: ConfigureRequest) {
        self.manage(id);
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if win.drag.is_some() {
            debug!(window = id, "Ignoring configure request because we are in a drag");
            return;
        }

        let g = &mut win.layout.geometry;
        if let Some(width) = request.width {
            g.width = width;
        }
        if let Some(height) = request.height {
            g.height = height;
        }
        if let Some(x) = request.x {
            g.x = x;
        }
        if let Some(y) = request.y {
            g.y = y;
        }
        g.x = g.x.max(0);
        g.y = g.y.max(0);

        let (geometry, border_width) = (*g, win.border_width);
        self.error_tracker.warn_if_failed(
            self.backend.move_resize(id, geometry),
            "configure window",
            ErrorCategory::X11,
        );
        log_warn(self.backend.send_configure_notify(id, geometry, border_width), "send configure notify");
    }

    fn unmap_notify(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        debug!(window = id, "Unmapping");
        win.mapped = false;
        win.state = IcccmState::Withdrawn;
        log_warn(self.backend.set_wm_state(id, IcccmState::Withdrawn), "set WM_STATE");
    }

    fn destroy_notify(&mut self, id: WindowId) {
        if self.windows.remove(&id).is_none() {
            return;
        }
        // the overlay is a child and goes down with its parent
        debug!(window = id, "Destroying");
        if self.current == Some(id) {
            self.current = None;
        }
        if self.drag.window() == Some(id) {
            self.drag = DragPhase::Idle;
            log_warn(self.backend.ungrab_pointer(), "ungrab pointer");
        }
        if self.fill_select.as_ref().is_some_and(|s| s.window == id) {
            self.fill_select_cancel();
        }
    }

    fn client_message(&mut self, id: WindowId, message: ClientMessage) {
        if !self.windows.contains_key(&id) {
            return;
        }
        match message {
            ClientMessage::NetWmState { action, states } => {
                for state in states.into_iter().flatten() {
                    match action {
                        0 => self.remove_state(id, state),
                        1 => self.add_state(id, state),
                        2 => self.toggle_state(id, state),
                        _ => debug!(window = id, action, "Unknown _NET_WM_STATE action"),
                    }
                }
            }
            ClientMessage::CloseWindow => self.delete(id),
            ClientMessage::MoveResize { root, direction, .. } => {
                let origin = self.windows[&id].geometry();
                let event = Point::new(root.x - origin.x, root.y - origin.y);
                match direction {
                    NET_WM_MOVERESIZE_MOVE => {
                        let decision = self.move_begin(id, root);
                        self.grab_for_drag(decision);
                    }
                    NET_WM_MOVERESIZE_SIZE_KEYBOARD | NET_WM_MOVERESIZE_MOVE_KEYBOARD => {}
                    NET_WM_MOVERESIZE_CANCEL => {
                        if self.drag.window() == Some(id) {
                            self.end_drag(root);
                        }
                    }
                    direction => {
                        let corner = quadwm_layout::Corner::from_net_direction(direction);
                        let decision = self.resize_begin(id, root, event, corner);
                        self.grab_for_drag(decision);
                    }
                }
            }
            ClientMessage::Other(atom) => debug!(window = id, atom, "Unknown ClientMessage"),
        }
    }

    pub fn add_state(&mut self, id: WindowId, state: NetState) {
        match state {
            NetState::Fullscreen => self.fullscreen(id),
            NetState::MaximizedHorz => self.maximize(id, quadwm_layout::MaximizedState::HORIZONTAL),
            NetState::MaximizedVert => self.maximize(id, quadwm_layout::MaximizedState::VERTICAL),
            NetState::Above => self.set_layer(id, Layer::Above),
            NetState::Below => self.set_layer(id, Layer::Below),
        }
    }

    pub fn remove_state(&mut self, id: WindowId, state: NetState) {
        match state {
            NetState::Fullscreen => self.unfullscreen(id),
            NetState::MaximizedHorz => self.unmaximize_axis(id, quadwm_layout::MaximizedState::HORIZONTAL),
            NetState::MaximizedVert => self.unmaximize_axis(id, quadwm_layout::MaximizedState::VERTICAL),
            NetState::Above | NetState::Below => self.set_layer(id, Layer::Normal),
        }
    }

    pub fn toggle_state(&mut self, id: WindowId, state: NetState) {
        let Some(win) = self.windows.get(&id) else {
            return;
        };
        let (layer, maximized) = (win.layer, win.layout.state);
        match state {
            NetState::Fullscreen => self.toggle_fullscreen(id),
            NetState::MaximizedHorz | NetState::MaximizedVert => {
                let bit = if state == NetState::MaximizedHorz {
                    quadwm_layout::MaximizedState::HORIZONTAL
                } else {
                    quadwm_layout::MaximizedState::VERTICAL
                };
                if maximized.contains(bit) {
                    self.unmaximize_axis(id, bit);
                } else {
                    self.maximize(id, bit);
                }
            }
            NetState::Above => self.set_layer(id, if layer == Layer::Above { Layer::Normal } else { Layer::Above }),
            // checks Above rather than Below, so toggling Below on an Above
            // window drops it to Normal
            NetState::Below => self.set_layer(id, if layer == Layer::Above { Layer::Normal } else { Layer::Below }),
        }
    }

    fn button_press(&mut self, id: WindowId, button: u8, state: u16, root: Point, event: Point) {
        if !self.windows.contains_key(&id) {
            return;
        }
        let modifiers = keys::clean(state);
        let Some(binding) =
            self.mouse_bindings.iter().find(|b| b.button == button && b.modifiers == modifiers).copied()
        else {
            return;
        };
        match binding.action {
            MouseAction::Move => {
                let decision = self.move_begin(id, root);
                self.grab_for_drag(decision);
            }
            MouseAction::Resize => {
                let decision = self.resize_begin(id, root, event, None);
                self.grab_for_drag(decision);
            }
            MouseAction::Lower => self.lower(id),
        }
    }

    fn key_press(&mut self, window: WindowId, keysym: u32, shifted: u32, state: u16) {
        if self.fill_select.is_some() {
            if keysym == keys::XK_ESCAPE {
                self.fill_select_cancel();
            }
            return;
        }
        if self.launcher.as_ref().is_some_and(|l| l.window == window) {
            if let Some(key) = keys::menu_key(keysym, shifted, state) {
                self.launcher_key(key);
            }
            return;
        }
        let modifiers = keys::clean(state);
        if let Some(command) = self.key_bindings.get(&(keysym, modifiers)).cloned() {
            debug!(command = %command, "Key binding");
            self.run_command(&command);
        }
    }

    /// Gives focus and the active border to `id`, if it accepts focus.
    pub fn mark_active(&mut self, id: WindowId) {
        if self.current == Some(id) || !self.windows.contains_key(&id) {
            return;
        }
        if !self.focusable(id) {
            debug!(window = id, "Not focusable, skipping");
            return;
        }
        let active = self.color("activeborder");
        let inactive = self.color("inactiveborder");
        log_warn(self.backend.set_border_color(id, active), "set border color");
        self.error_tracker.warn_if_failed(self.backend.focus(id), "focus window", ErrorCategory::X11);
        if let Some(previous) = self.current.filter(|p| self.windows.contains_key(p)) {
            log_warn(self.backend.set_border_color(previous, inactive), "set border color");
        }
        self.current = Some(id);
    }

    fn focusable(&self, id: WindowId) -> bool {
        let Ok(hints) = self.backend.wm_hints(id) else {
            return true;
        };
        hints.input != Some(false)
            || self.backend.protocols(id).is_ok_and(|p| p.contains(&Protocol::TakeFocus))
    }

    /// Pixel value for a colour option, memoised by colour spec.
    pub fn color(&mut self, option: &str) -> u32 {
        let spec = self.config.color(option).unwrap_or("black").to_string();
        if let Some(pixel) = self.colors.get(&spec) {
            return *pixel;
        }
        let pixel = match spec.strip_prefix('#') {
            Some(hex) => u32::from_str_radix(hex, 16).unwrap_or(0),
            None => self
                .error_tracker
                .warn_if_failed(self.backend.lookup_color(&spec), "lookup color", ErrorCategory::X11)
                .unwrap_or(0),
        };
        self.colors.insert(spec, pixel);
        pixel
    }

    pub fn pointer(&self) -> Point {
        log_warn(self.backend.pointer(), "query pointer").unwrap_or_default()
    }

    pub fn screens(&self) -> Vec<Geometry> {
        self.error_tracker
            .warn_if_failed(self.backend.screens(), "query screens", ErrorCategory::X11)
            .unwrap_or_default()
    }

    pub fn screen_at(&self, p: Point) -> Geometry {
        screen_for_point(&self.screens(), p).unwrap_or_default()
    }

    /// Managed windows in the Normal state, bottom to top.
    pub fn mapped_windows(&self) -> Vec<WindowId> {
        self.backend
            .stacking_order()
            .unwrap_or_default()
            .into_iter()
            .filter(|id| {
                self.windows.get(id).is_some_and(|w| w.mapped && w.state == IcccmState::Normal)
            })
            .collect()
    }

    /// Runs queued work, including any resolved launcher continuations.
    pub fn process_pending(&mut self) {
        self.poll_launches();
        while let Some(work) = self.deferred.pop_front() {
            work(self);
        }
    }

    pub fn defer(&mut self, work: impl FnOnce(&mut WindowManager<B>) + 'static) {
        self.deferred.push_back(Box::new(work));
    }

    pub fn run(&mut self) -> Result<Exit> {
        loop {
            self.backend.flush()?;

            let event = self.backend.wait_event()?;
            if let Err(e) = self.handle_event(event) {
                self.error_tracker.record(ErrorCategory::Window, "handle event", e);
            }
            // drain the rest before running deferred work
            while let Some(event) = self.backend.poll_event()? {
                if let Err(e) = self.handle_event(event) {
                    self.error_tracker.record(ErrorCategory::Window, "handle event", e);
                }
            }

            self.process_pending();

            if let Some(exit) = self.exit.take() {
                self.backend.flush()?;
                return Ok(exit);
            }

            if let Some(health) = self.error_tracker.newly_degraded() {
                warn!(
                    "System health degraded: X11 errors: {}, Window errors: {}, Launcher errors: {}",
                    health.x11_errors, health.window_errors, health.launcher_errors
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Call, RecordingBackend};
    use crate::backend::WmHints;
    use pretty_assertions::assert_eq;
    use quadwm_config::KeySpec;

    fn wm() -> WindowManager<RecordingBackend> {
        WindowManager::new(RecordingBackend::new(), Config::default())
    }

    #[test]
    fn test_map_request_centres_on_pointer() {
        let mut wm = wm();
        wm.backend.add_window(10, Geometry::new(0, 0, 200, 100));
        wm.backend.set_pointer(Point::new(500, 400));

        wm.handle_event(WmEvent::MapRequest { window: 10 }).unwrap();

        let win = &wm.windows[&10];
        assert_eq!(win.geometry(), Geometry::new(400, 350, 200, 100));
        assert_eq!(win.state, IcccmState::Normal);
        assert!(win.mapped);
        assert!(win.overlay.is_some());
        assert!(wm.backend.calls().contains(&Call::Map(10)));
        assert!(wm.backend.calls().contains(&Call::SetWmState(10, IcccmState::Normal)));
        assert!(wm.backend.calls().contains(&Call::ConfigureNotify(10, Geometry::new(400, 350, 200, 100), 1)));
        // pointer lands in the middle of the window
        assert_eq!(wm.backend.pointer_position(), Point::new(500, 400));
    }

    #[test]
    fn test_map_request_keeps_requested_position() {
        let mut wm = wm();
        wm.backend.add_window(10, Geometry::new(30, 40, 200, 100));
        wm.backend.set_normal_hints(10, &[1, 30, 40, 200, 100]);
        wm.backend.set_wm_hints(10, WmHints { input: None, initial_state: Some(IcccmState::Iconic) });

        wm.handle_event(WmEvent::MapRequest { window: 10 }).unwrap();
        let win = &wm.windows[&10];
        assert_eq!(win.geometry(), Geometry::new(30, 40, 200, 100));
        assert_eq!(win.state, IcccmState::Iconic);
    }

    #[test]
    fn test_configure_request_applies_and_clamps() {
        let mut wm = wm();
        wm.backend.add_window(10, Geometry::new(10, 10, 100, 100));
        let request = ConfigureRequest { x: Some(-20), width: Some(300), ..Default::default() };
        wm.handle_event(WmEvent::ConfigureRequest { window: 10, request }).unwrap();

        assert_eq!(wm.windows[&10].geometry(), Geometry::new(0, 10, 300, 100));
        assert!(wm.backend.calls().contains(&Call::MoveResize(10, Geometry::new(0, 10, 300, 100))));
    }

    #[test]
    fn test_configure_request_ignored_during_drag() {
        let mut wm = wm();
        wm.backend.add_mapped_window(10, Geometry::new(10, 10, 100, 100));
        wm.manage(10);
        wm.move_begin(10, Point::new(50, 50));
        wm.backend.clear_calls();

        let request = ConfigureRequest { width: Some(999), ..Default::default() };
        wm.handle_event(WmEvent::ConfigureRequest { window: 10, request }).unwrap();
        assert_eq!(wm.windows[&10].geometry().width, 100);
        assert!(wm.backend.calls().is_empty());
    }

    #[test]
    fn test_unmap_and_destroy() {
        let mut wm = wm();
        wm.backend.add_mapped_window(10, Geometry::new(0, 0, 100, 100));
        wm.manage(10);
        wm.mark_active(10);

        wm.handle_event(WmEvent::UnmapNotify { window: 10 }).unwrap();
        assert_eq!(wm.windows[&10].state, IcccmState::Withdrawn);
        assert!(wm.backend.calls().contains(&Call::SetWmState(10, IcccmState::Withdrawn)));

        wm.handle_event(WmEvent::DestroyNotify { window: 10 }).unwrap();
        assert!(wm.windows.is_empty());
        assert_eq!(wm.current, None);
    }

    #[test]
    fn test_focus_follows_pointer() {
        let mut wm = wm();
        wm.backend.add_mapped_window(1, Geometry::new(0, 0, 100, 100));
        wm.backend.add_mapped_window(2, Geometry::new(200, 0, 100, 100));
        wm.manage(1);
        wm.manage(2);

        wm.handle_event(WmEvent::EnterNotify { window: 1 }).unwrap();
        wm.handle_event(WmEvent::EnterNotify { window: 2 }).unwrap();
        assert_eq!(wm.current, Some(2));
        let calls = wm.backend.calls();
        assert!(calls.contains(&Call::Focus(2)));
        assert!(calls.contains(&Call::SetBorderColor(1, 0x666666)));
        assert!(calls.contains(&Call::SetBorderColor(2, 0xcccccc)));
    }

    #[test]
    fn test_unfocusable_window_is_skipped() {
        let mut wm = wm();
        wm.backend.add_mapped_window(1, Geometry::new(0, 0, 100, 100));
        wm.backend.set_wm_hints(1, WmHints { input: Some(false), initial_state: None });
        wm.manage(1);
        wm.mark_active(1);
        assert_eq!(wm.current, None);

        // WM_TAKE_FOCUS makes it focusable again
        wm.backend.set_protocols(1, vec![Protocol::TakeFocus]);
        wm.mark_active(1);
        assert_eq!(wm.current, Some(1));
    }

    #[test]
    fn test_color_memo_parses_hex_and_looks_up_names() {
        let mut wm = wm();
        wm.config.colors.insert("urgencyborder".into(), "red".into());
        assert_eq!(wm.color("activeborder"), 0xcccccc);
        assert_eq!(wm.color("urgencyborder"), 0xff0000);
        assert_eq!(wm.color("urgencyborder"), 0xff0000);
        let lookups = wm.backend.calls().iter().filter(|c| matches!(c, Call::LookupColor(_))).count();
        assert_eq!(lookups, 1);
    }

    #[test]
    fn test_net_wm_state_messages() {
        let mut wm = wm();
        wm.backend.add_mapped_window(1, Geometry::new(0, 0, 100, 100));
        wm.manage(1);

        let message = |action, state| WmEvent::ClientMessage {
            window: 1,
            message: ClientMessage::NetWmState { action, states: [Some(state), None] },
        };
        wm.handle_event(message(1, NetState::Above)).unwrap();
        assert_eq!(wm.windows[&1].layer, Layer::Above);
        assert!(wm.backend.net_state_of(1).contains(&NetState::Above));

        wm.handle_event(message(2, NetState::Below)).unwrap();
        assert_eq!(wm.windows[&1].layer, Layer::Normal);
        wm.handle_event(message(2, NetState::Below)).unwrap();
        assert_eq!(wm.windows[&1].layer, Layer::Below);
        wm.handle_event(message(0, NetState::Below)).unwrap();
        assert_eq!(wm.windows[&1].layer, Layer::Normal);

        wm.handle_event(message(2, NetState::Fullscreen)).unwrap();
        assert!(wm.windows[&1].is_fullscreen());
        wm.handle_event(message(0, NetState::Fullscreen)).unwrap();
        assert!(!wm.windows[&1].is_fullscreen());
    }

    #[test]
    fn test_key_binding_runs_command() {
        let mut config = Config::default();
        config.binds.insert(KeySpec::parse("CM-Return").unwrap(), "terminal".into());
        config.commands.insert("term".into(), "xterm".into());
        let mut wm = WindowManager::new(RecordingBackend::new(), config);
        wm.start().unwrap();
        assert!(wm.backend.calls().contains(&Call::GrabKey(keys::XK_RETURN, keys::CONTROL | keys::MOD1)));

        // Num Lock does not get in the way
        let state = keys::CONTROL | keys::MOD1 | keys::MOD2;
        wm.handle_event(WmEvent::KeyPress { window: 1, keysym: keys::XK_RETURN, shifted: keys::XK_RETURN, state })
            .unwrap();
        assert!(wm.backend.calls().contains(&Call::Spawn("xterm".into())));
    }

    #[test]
    fn test_selection_clear_stops_the_loop() {
        let mut wm = wm();
        wm.backend.push_event(WmEvent::SelectionClear);
        assert_eq!(wm.run().unwrap(), Exit::Replaced);
    }

    #[test]
    fn test_scan_adopts_viewable_windows_and_marks_pointer_window() {
        let mut wm = wm();
        wm.backend.add_mapped_window(1, Geometry::new(0, 0, 100, 100));
        wm.backend.add_mapped_window(2, Geometry::new(300, 300, 100, 100));
        wm.backend.add_override_redirect(3);
        wm.backend.set_pointer(Point::new(350, 350));

        wm.start().unwrap();
        let mut ids: Vec<_> = wm.windows.keys().copied().collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(wm.current, Some(2));
    }
}
