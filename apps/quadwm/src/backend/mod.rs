//! The seam between window management and the X server.
//!
//! [`WindowManager`](crate::window::manager::WindowManager) only talks to the
//! display through [`Backend`], so the whole state machine can be driven by
//! the recording fake in tests.

use anyhow::Result;
use quadwm_layout::{Corner, Geometry, Point, SizeHints};

#[cfg(test)]
pub mod recording;
pub mod x11;

pub type WindowId = u32;

/// ICCCM `WM_STATE` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IcccmState {
    #[default]
    Withdrawn = 0,
    Normal = 1,
    Zoomed = 2,
    Iconic = 3,
    Inactive = 4,
}

impl IcccmState {
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0 => IcccmState::Withdrawn,
            1 => IcccmState::Normal,
            2 => IcccmState::Zoomed,
            3 => IcccmState::Iconic,
            4 => IcccmState::Inactive,
            _ => return None,
        })
    }
}

/// The `_NET_WM_STATE` members quadwm understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetState {
    Fullscreen,
    MaximizedHorz,
    MaximizedVert,
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    DeleteWindow,
    TakeFocus,
}

const INPUT_HINT: u32 = 1 << 0;
const STATE_HINT: u32 = 1 << 1;

/// The parts of `WM_HINTS` that matter for focus and mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WmHints {
    pub input: Option<bool>,
    pub initial_state: Option<IcccmState>,
}

impl WmHints {
    pub fn from_raw(data: &[u32]) -> Self {
        let flags = data.first().copied().unwrap_or(0);
        let input = if flags & INPUT_HINT != 0 { data.get(1).map(|v| *v != 0) } else { None };
        let initial_state = if flags & STATE_HINT != 0 {
            data.get(2).and_then(|v| IcccmState::from_raw(*v))
        } else {
            None
        };
        Self { input, initial_state }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    pub override_redirect: bool,
    /// Map state is Viewable or Unviewable.
    pub mapped: bool,
    pub viewable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Normal,
    Move,
    Resize(Corner),
}

/// One line of text for a menu or overlay. Inverted rows are drawn white
/// on black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub text: String,
    pub inverted: bool,
}

impl TextRow {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), inverted: false }
    }

    pub fn inverted(text: impl Into<String>) -> Self {
        Self { text: text.into(), inverted: true }
    }
}

/// The fields a client asked to change in a ConfigureRequest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// `action` is 0 (remove), 1 (add) or 2 (toggle).
    NetWmState { action: u32, states: [Option<NetState>; 2] },
    CloseWindow,
    MoveResize { root: Point, direction: u32, button: u8 },
    Other(u32),
}

pub const NET_WM_MOVERESIZE_MOVE: u32 = 8;
pub const NET_WM_MOVERESIZE_SIZE_KEYBOARD: u32 = 9;
pub const NET_WM_MOVERESIZE_MOVE_KEYBOARD: u32 = 10;
pub const NET_WM_MOVERESIZE_CANCEL: u32 = 11;

/// Inbound events, already decoded from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    MapRequest { window: WindowId },
    ConfigureRequest { window: WindowId, request: ConfigureRequest },
    UnmapNotify { window: WindowId },
    DestroyNotify { window: WindowId },
    EnterNotify { window: WindowId },
    ClientMessage { window: WindowId, message: ClientMessage },
    ButtonPress { window: WindowId, button: u8, state: u16, root: Point, event: Point },
    ButtonRelease { window: WindowId, button: u8, root: Point },
    MotionNotify { window: WindowId, root: Point },
    /// `keysym` is the unshifted symbol used for bindings; `shifted`
    /// honours Shift and is what text input uses.
    KeyPress { window: WindowId, keysym: u32, shifted: u32, state: u16 },
    Expose { window: WindowId },
    SelectionClear,
}

/// Everything the window manager needs from the display server.
pub trait Backend: 'static {
    fn root(&self) -> WindowId;

    /// Monitor rectangles, falling back to the root window's geometry.
    fn screens(&self) -> Result<Vec<Geometry>>;
    /// Children of the root window, bottom to top.
    fn stacking_order(&self) -> Result<Vec<WindowId>>;
    fn attributes(&self, window: WindowId) -> Result<Attributes>;

    fn geometry(&self, window: WindowId) -> Result<Geometry>;
    fn move_resize(&self, window: WindowId, geometry: Geometry) -> Result<()>;
    fn move_to(&self, window: WindowId, position: Point) -> Result<()>;
    fn set_border_width(&self, window: WindowId, width: i32) -> Result<()>;
    fn set_border_color(&self, window: WindowId, pixel: u32) -> Result<()>;
    /// Stacks `windows[0]` below `windows[1]`, then every later window
    /// directly above its predecessor.
    fn restack(&self, windows: &[WindowId]) -> Result<()>;
    fn map(&self, window: WindowId) -> Result<()>;
    fn unmap(&self, window: WindowId) -> Result<()>;
    fn select_client_events(&self, window: WindowId) -> Result<()>;

    fn pointer(&self) -> Result<Point>;
    fn warp_pointer(&self, to: Point) -> Result<()>;
    fn warp_pointer_by(&self, dx: i32, dy: i32) -> Result<()>;

    fn set_wm_state(&self, window: WindowId, state: IcccmState) -> Result<()>;
    fn net_wm_state(&self, window: WindowId) -> Result<Vec<NetState>>;
    fn set_net_wm_state(&self, window: WindowId, states: &[NetState]) -> Result<()>;
    fn name(&self, window: WindowId) -> Result<String>;
    /// `WM_CLASS` as (instance, class).
    fn class(&self, window: WindowId) -> Result<(String, String)>;
    fn wm_hints(&self, window: WindowId) -> Result<WmHints>;
    fn normal_hints(&self, window: WindowId) -> Result<SizeHints>;
    fn protocols(&self, window: WindowId) -> Result<Vec<Protocol>>;
    fn send_protocol(&self, window: WindowId, protocol: Protocol) -> Result<()>;
    fn kill(&self, window: WindowId) -> Result<()>;
    /// Gives `window` the input focus and publishes `_NET_ACTIVE_WINDOW`.
    fn focus(&self, window: WindowId) -> Result<()>;
    fn send_configure_notify(&self, window: WindowId, geometry: Geometry, border_width: i32) -> Result<()>;
    fn lookup_color(&self, name: &str) -> Result<u32>;

    fn grab_key(&self, keysym: u32, modifiers: u16) -> Result<()>;
    fn grab_button(&self, window: WindowId, button: u8, modifiers: u16) -> Result<()>;
    fn grab_pointer(&self, window: WindowId, cursor: CursorShape) -> Result<bool>;
    fn ungrab_pointer(&self) -> Result<()>;
    fn grab_keyboard(&self, window: WindowId) -> Result<bool>;
    fn ungrab_keyboard(&self) -> Result<()>;

    /// An unmapped child of `parent` used to show the size during a resize.
    fn create_overlay(&self, parent: WindowId) -> Result<WindowId>;
    /// An unmapped override-redirect window listening for keys and exposes.
    fn create_menu_window(&self, at: Point, border_width: i32, border_pixel: u32) -> Result<WindowId>;
    /// A hollow rectangle, used to preview fill-select targets.
    fn create_frame_window(&self, pixel: u32) -> Result<WindowId>;
    /// Moves the frame over `geometry` and cuts out everything but a
    /// border of `thickness`.
    fn shape_frame(&self, window: WindowId, geometry: Geometry, thickness: i32) -> Result<()>;
    /// Clears `window` and draws `rows` top to bottom, returning the
    /// extent covered.
    fn draw_text(&self, window: WindowId, rows: &[TextRow]) -> Result<(i32, i32)>;
    fn destroy_window(&self, window: WindowId) -> Result<()>;

    /// Runs a shell command line detached from the window manager.
    fn spawn(&self, command_line: &str) -> Result<()>;

    fn flush(&self) -> Result<()>;
    fn wait_event(&self) -> Result<WmEvent>;
    fn poll_event(&self) -> Result<Option<WmEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wm_hints_from_raw() {
        assert_eq!(WmHints::from_raw(&[]), WmHints::default());
        assert_eq!(
            WmHints::from_raw(&[INPUT_HINT | STATE_HINT, 0, 3]),
            WmHints { input: Some(false), initial_state: Some(IcccmState::Iconic) }
        );
        // values without their flag are ignored
        assert_eq!(WmHints::from_raw(&[0, 1, 1]), WmHints::default());
        assert_eq!(WmHints::from_raw(&[STATE_HINT, 0, 42]).initial_state, None);
    }
}
