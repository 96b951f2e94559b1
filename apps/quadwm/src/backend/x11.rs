use std::cell::RefCell;

use anyhow::{anyhow, Result};
use quadwm_layout::{Geometry, Point, SizeHints};
use tracing::{debug, trace};
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent, ClipOrdering,
    ConfigWindow, ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt, CreateWindowAux, EventMask, Font,
    GrabMode, GrabStatus, InputFocus, MapState, ModMask, PropMode, Rectangle, StackMode, Window, WindowClass,
    CLIENT_MESSAGE_EVENT, CONFIGURE_NOTIFY_EVENT,
};
use x11rb::protocol::Event;
use x11rb::wrapper::ConnectionExt as _;

use crate::backend::{
    Attributes, Backend, ClientMessage, ConfigureRequest, CursorShape, IcccmState, NetState, Protocol, TextRow,
    WindowId, WmEvent, WmHints,
};
use crate::core::context::Context;
use crate::core::spawn;
use crate::window::cursors::Cursors;
use crate::window::draw::{self, GcCache, BLACK, WHITE};
use crate::window::keys;

const TEXT_PADDING: i16 = 2;

/// Keycode to keysym table as reported by the server.
#[derive(Debug, Default)]
struct Keymap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn load(ctx: &Context) -> Result<Self> {
        let setup = ctx.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = ctx.conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        Ok(Self { min_keycode: min, per_keycode: usize::from(reply.keysyms_per_keycode), keysyms: reply.keysyms })
    }

    fn keysym(&self, keycode: u8, level: usize) -> u32 {
        if keycode < self.min_keycode || level >= self.per_keycode {
            return 0;
        }
        let index = usize::from(keycode - self.min_keycode) * self.per_keycode + level;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    fn keycodes(&self, keysym: u32) -> Vec<u8> {
        if self.per_keycode == 0 {
            return Vec::new();
        }
        self.keysyms
            .chunks(self.per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.contains(&keysym))
            .filter_map(|(i, _)| u8::try_from(i).ok().and_then(|i| self.min_keycode.checked_add(i)))
            .collect()
    }

    /// Binding keysym and text keysym for a key press.
    fn lookup(&self, keycode: u8, state: u16) -> (u32, u32) {
        let base = self.keysym(keycode, 0);
        let shifted = match self.keysym(keycode, 1) {
            s if state & keys::SHIFT != 0 && s != 0 => s,
            _ => base,
        };
        (base, shifted)
    }
}

/// [`Backend`] over a live X connection.
pub struct X11Backend {
    ctx: Context,
    cursors: Cursors,
    font: Font,
    keymap: RefCell<Keymap>,
    gcs: RefCell<GcCache>,
}

impl X11Backend {
    pub fn new(ctx: Context, font_name: &str) -> Result<Self> {
        let cursors = Cursors::new(&ctx.conn, ctx.screen_num)?;
        let font = draw::open_font(&ctx, font_name)?;
        let keymap = Keymap::load(&ctx)?;
        ctx.conn.change_window_attributes(ctx.root_window, &ChangeWindowAttributesAux::new().cursor(cursors.normal))?;
        debug!(min_keycode = keymap.min_keycode, per_keycode = keymap.per_keycode, "Loaded keymap");
        Ok(Self { ctx, cursors, font, keymap: RefCell::new(keymap), gcs: RefCell::new(GcCache::default()) })
    }

    fn property32(&self, window: Window, property: Atom, type_: impl Into<Atom>, len: u32) -> Result<Vec<u32>> {
        let reply = self.ctx.conn.get_property(false, window, property, type_, 0, len)?.reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn property_string(&self, window: Window, property: Atom, type_: impl Into<Atom>) -> Result<String> {
        let reply = self.ctx.conn.get_property(false, window, property, type_, 0, 1024)?.reply()?;
        Ok(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn net_state_atom(&self, state: NetState) -> Atom {
        let atoms = &self.ctx.atoms;
        match state {
            NetState::Fullscreen => atoms._NET_WM_STATE_FULLSCREEN,
            NetState::MaximizedHorz => atoms._NET_WM_STATE_MAXIMIZED_HORZ,
            NetState::MaximizedVert => atoms._NET_WM_STATE_MAXIMIZED_VERT,
            NetState::Above => atoms._NET_WM_STATE_ABOVE,
            NetState::Below => atoms._NET_WM_STATE_BELOW,
        }
    }

    fn net_state_from_atom(&self, atom: Atom) -> Option<NetState> {
        [NetState::Fullscreen, NetState::MaximizedHorz, NetState::MaximizedVert, NetState::Above, NetState::Below]
            .into_iter()
            .find(|s| self.net_state_atom(*s) == atom)
    }

    fn protocol_atom(&self, protocol: Protocol) -> Atom {
        match protocol {
            Protocol::DeleteWindow => self.ctx.atoms.WM_DELETE_WINDOW,
            Protocol::TakeFocus => self.ctx.atoms.WM_TAKE_FOCUS,
        }
    }

    fn decode_client_message(&self, event: &ClientMessageEvent) -> ClientMessage {
        let atoms = &self.ctx.atoms;
        let data = event.data.as_data32();
        if event.type_ == atoms._NET_WM_STATE {
            ClientMessage::NetWmState {
                action: data[0],
                states: [self.net_state_from_atom(data[1]), self.net_state_from_atom(data[2])],
            }
        } else if event.type_ == atoms._NET_CLOSE_WINDOW {
            ClientMessage::CloseWindow
        } else if event.type_ == atoms._NET_WM_MOVERESIZE {
            ClientMessage::MoveResize {
                root: Point::new(data[0] as i32, data[1] as i32),
                direction: data[2],
                button: data[3] as u8,
            }
        } else {
            ClientMessage::Other(event.type_)
        }
    }

    /// Decodes the events the window manager reacts to. Everything else
    /// yields `None`.
    fn translate(&self, event: Event) -> Option<WmEvent> {
        Some(match event {
            Event::MapRequest(e) => WmEvent::MapRequest { window: e.window },
            Event::ConfigureRequest(e) => {
                let has = |flag| e.value_mask.contains(flag);
                WmEvent::ConfigureRequest {
                    window: e.window,
                    request: ConfigureRequest {
                        x: has(ConfigWindow::X).then_some(i32::from(e.x)),
                        y: has(ConfigWindow::Y).then_some(i32::from(e.y)),
                        width: has(ConfigWindow::WIDTH).then_some(i32::from(e.width)),
                        height: has(ConfigWindow::HEIGHT).then_some(i32::from(e.height)),
                    },
                }
            }
            Event::UnmapNotify(e) => WmEvent::UnmapNotify { window: e.window },
            Event::DestroyNotify(e) => WmEvent::DestroyNotify { window: e.window },
            Event::EnterNotify(e) => WmEvent::EnterNotify { window: e.event },
            Event::ClientMessage(e) => WmEvent::ClientMessage { window: e.window, message: self.decode_client_message(&e) },
            Event::ButtonPress(e) => WmEvent::ButtonPress {
                window: e.event,
                button: e.detail,
                state: u16::from(e.state),
                root: Point::new(e.root_x.into(), e.root_y.into()),
                event: Point::new(e.event_x.into(), e.event_y.into()),
            },
            Event::ButtonRelease(e) => WmEvent::ButtonRelease {
                window: e.event,
                button: e.detail,
                root: Point::new(e.root_x.into(), e.root_y.into()),
            },
            Event::MotionNotify(e) => {
                WmEvent::MotionNotify { window: e.event, root: Point::new(e.root_x.into(), e.root_y.into()) }
            }
            Event::KeyPress(e) => {
                let state = u16::from(e.state);
                let (keysym, shifted) = self.keymap.borrow().lookup(e.detail, state);
                WmEvent::KeyPress { window: e.event, keysym, shifted, state }
            }
            Event::Expose(e) if e.count == 0 => WmEvent::Expose { window: e.window },
            Event::SelectionClear(_) => WmEvent::SelectionClear,
            Event::MappingNotify(_) => {
                match Keymap::load(&self.ctx) {
                    Ok(keymap) => *self.keymap.borrow_mut() = keymap,
                    Err(e) => debug!("Failed to reload keymap: {}", e),
                }
                return None;
            }
            Event::Error(e) => {
                debug!("X11 error: {:?}", e);
                return None;
            }
            other => {
                trace!("Ignoring event: {:?}", other);
                return None;
            }
        })
    }

    fn create_window(&self, parent: Window, at: Point, border_width: i32, aux: &CreateWindowAux) -> Result<Window> {
        let window = self.ctx.conn.generate_id()?;
        self.ctx.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            parent,
            at.x as i16,
            at.y as i16,
            1,
            1,
            border_width.max(0) as u16,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            aux,
        )?;
        Ok(window)
    }

    /// Every lock-key combination on top of `modifiers`, so NumLock and
    /// CapsLock don't defeat a grab.
    fn lock_variants(modifiers: u16) -> [ModMask; 4] {
        let lock = keys::LOCK;
        let num = keys::MOD2;
        [modifiers, modifiers | lock, modifiers | num, modifiers | lock | num].map(ModMask::from)
    }
}

impl Backend for X11Backend {
    fn root(&self) -> WindowId {
        self.ctx.root_window
    }

    fn screens(&self) -> Result<Vec<Geometry>> {
        let monitors = self
            .ctx
            .conn
            .randr_get_monitors(self.ctx.root_window, true)
            .map_err(anyhow::Error::from)
            .and_then(|cookie| Ok(cookie.reply()?));
        match monitors {
            Ok(reply) if !reply.monitors.is_empty() => Ok(reply
                .monitors
                .iter()
                .map(|m| Geometry::new(m.x.into(), m.y.into(), m.width.into(), m.height.into()))
                .collect()),
            Ok(_) => Ok(vec![self.geometry(self.ctx.root_window)?]),
            Err(e) => {
                debug!("RandR monitors unavailable: {}", e);
                Ok(vec![self.geometry(self.ctx.root_window)?])
            }
        }
    }

    fn stacking_order(&self) -> Result<Vec<WindowId>> {
        Ok(self.ctx.conn.query_tree(self.ctx.root_window)?.reply()?.children)
    }

    fn attributes(&self, window: WindowId) -> Result<Attributes> {
        let attrs = self.ctx.conn.get_window_attributes(window)?.reply()?;
        Ok(Attributes {
            override_redirect: attrs.override_redirect,
            mapped: attrs.map_state != MapState::UNMAPPED,
            viewable: attrs.map_state == MapState::VIEWABLE,
        })
    }

    fn geometry(&self, window: WindowId) -> Result<Geometry> {
        let g = self.ctx.conn.get_geometry(window)?.reply()?;
        Ok(Geometry::new(g.x.into(), g.y.into(), g.width.into(), g.height.into()))
    }

    fn move_resize(&self, window: WindowId, geometry: Geometry) -> Result<()> {
        let values = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.width.max(1) as u32)
            .height(geometry.height.max(1) as u32);
        self.ctx.conn.configure_window(window, &values)?;
        Ok(())
    }

    fn move_to(&self, window: WindowId, position: Point) -> Result<()> {
        self.ctx.conn.configure_window(window, &ConfigureWindowAux::new().x(position.x).y(position.y))?;
        Ok(())
    }

    fn set_border_width(&self, window: WindowId, width: i32) -> Result<()> {
        self.ctx.conn.configure_window(window, &ConfigureWindowAux::new().border_width(width.max(0) as u32))?;
        Ok(())
    }

    fn set_border_color(&self, window: WindowId, pixel: u32) -> Result<()> {
        self.ctx.conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().border_pixel(pixel))?;
        Ok(())
    }

    fn restack(&self, windows: &[WindowId]) -> Result<()> {
        if let [first, second, ..] = windows {
            self.ctx
                .conn
                .configure_window(*first, &ConfigureWindowAux::new().sibling(*second).stack_mode(StackMode::BELOW))?;
        }
        for pair in windows.windows(2) {
            self.ctx
                .conn
                .configure_window(pair[1], &ConfigureWindowAux::new().sibling(pair[0]).stack_mode(StackMode::ABOVE))?;
        }
        Ok(())
    }

    fn map(&self, window: WindowId) -> Result<()> {
        self.ctx.conn.map_window(window)?;
        Ok(())
    }

    fn unmap(&self, window: WindowId) -> Result<()> {
        self.ctx.conn.unmap_window(window)?;
        Ok(())
    }

    fn select_client_events(&self, window: WindowId) -> Result<()> {
        let mask = EventMask::ENTER_WINDOW | EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY;
        self.ctx.conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn pointer(&self) -> Result<Point> {
        let reply = self.ctx.conn.query_pointer(self.ctx.root_window)?.reply()?;
        Ok(Point::new(reply.root_x.into(), reply.root_y.into()))
    }

    fn warp_pointer(&self, to: Point) -> Result<()> {
        self.ctx.conn.warp_pointer(x11rb::NONE, self.ctx.root_window, 0, 0, 0, 0, to.x as i16, to.y as i16)?;
        Ok(())
    }

    fn warp_pointer_by(&self, dx: i32, dy: i32) -> Result<()> {
        self.ctx.conn.warp_pointer(x11rb::NONE, x11rb::NONE, 0, 0, 0, 0, dx as i16, dy as i16)?;
        Ok(())
    }

    fn set_wm_state(&self, window: WindowId, state: IcccmState) -> Result<()> {
        let atom = self.ctx.atoms.WM_STATE;
        self.ctx.conn.change_property32(PropMode::REPLACE, window, atom, atom, &[state as u32, x11rb::NONE])?;
        Ok(())
    }

    fn net_wm_state(&self, window: WindowId) -> Result<Vec<NetState>> {
        let atoms = self.property32(window, self.ctx.atoms._NET_WM_STATE, AtomEnum::ATOM, 32)?;
        Ok(atoms.into_iter().filter_map(|a| self.net_state_from_atom(a)).collect())
    }

    fn set_net_wm_state(&self, window: WindowId, states: &[NetState]) -> Result<()> {
        let atoms: Vec<Atom> = states.iter().map(|s| self.net_state_atom(*s)).collect();
        self.ctx.conn.change_property32(PropMode::REPLACE, window, self.ctx.atoms._NET_WM_STATE, AtomEnum::ATOM, &atoms)?;
        Ok(())
    }

    fn name(&self, window: WindowId) -> Result<String> {
        let name = self.property_string(window, self.ctx.atoms._NET_WM_NAME, self.ctx.atoms.UTF8_STRING)?;
        if !name.is_empty() {
            return Ok(name);
        }
        self.property_string(window, self.ctx.atoms.WM_NAME, AtomEnum::STRING)
    }

    fn class(&self, window: WindowId) -> Result<(String, String)> {
        let raw = self.property_string(window, self.ctx.atoms.WM_CLASS, AtomEnum::STRING)?;
        let mut parts = raw.split('\0');
        let instance = parts.next().unwrap_or_default().to_string();
        let class = parts.next().unwrap_or_default().to_string();
        Ok((instance, class))
    }

    fn wm_hints(&self, window: WindowId) -> Result<WmHints> {
        Ok(WmHints::from_raw(&self.property32(window, self.ctx.atoms.WM_HINTS, AtomEnum::WM_HINTS, 9)?))
    }

    fn normal_hints(&self, window: WindowId) -> Result<SizeHints> {
        let raw = self.property32(window, AtomEnum::WM_NORMAL_HINTS.into(), AtomEnum::WM_SIZE_HINTS, 18)?;
        Ok(SizeHints::from_raw(&raw))
    }

    fn protocols(&self, window: WindowId) -> Result<Vec<Protocol>> {
        let atoms = self.property32(window, self.ctx.atoms.WM_PROTOCOLS, AtomEnum::ATOM, 100)?;
        Ok([Protocol::DeleteWindow, Protocol::TakeFocus]
            .into_iter()
            .filter(|p| atoms.contains(&self.protocol_atom(*p)))
            .collect())
    }

    fn send_protocol(&self, window: WindowId, protocol: Protocol) -> Result<()> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            window,
            type_: self.ctx.atoms.WM_PROTOCOLS,
            data: ClientMessageData::from([self.protocol_atom(protocol), x11rb::CURRENT_TIME, 0, 0, 0]),
            sequence: 0,
        };
        self.ctx.conn.send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn kill(&self, window: WindowId) -> Result<()> {
        self.ctx.conn.kill_client(window)?;
        Ok(())
    }

    fn focus(&self, window: WindowId) -> Result<()> {
        if self.protocols(window)?.contains(&Protocol::TakeFocus) {
            self.send_protocol(window, Protocol::TakeFocus)?;
        }
        self.ctx.conn.set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        self.ctx.conn.change_property32(
            PropMode::REPLACE,
            self.ctx.root_window,
            self.ctx.atoms._NET_ACTIVE_WINDOW,
            AtomEnum::WINDOW,
            &[window],
        )?;
        Ok(())
    }

    fn send_configure_notify(&self, window: WindowId, geometry: Geometry, border_width: i32) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: geometry.x as i16,
            y: geometry.y as i16,
            width: geometry.width.max(1) as u16,
            height: geometry.height.max(1) as u16,
            border_width: border_width.max(0) as u16,
            override_redirect: false,
        };
        self.ctx.conn.send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn lookup_color(&self, name: &str) -> Result<u32> {
        let reply = self.ctx.conn.alloc_named_color(self.ctx.default_colormap, name.as_bytes())?.reply()?;
        Ok(reply.pixel)
    }

    fn grab_key(&self, keysym: u32, modifiers: u16) -> Result<()> {
        let keycodes = self.keymap.borrow().keycodes(keysym);
        if keycodes.is_empty() {
            return Err(anyhow!("no keycode for keysym {:#x}", keysym));
        }
        for keycode in keycodes {
            for mods in Self::lock_variants(modifiers) {
                self.ctx.conn.grab_key(false, self.ctx.root_window, mods, keycode, GrabMode::ASYNC, GrabMode::ASYNC)?;
            }
        }
        Ok(())
    }

    fn grab_button(&self, window: WindowId, button: u8, modifiers: u16) -> Result<()> {
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;
        for mods in Self::lock_variants(modifiers) {
            self.ctx.conn.grab_button(
                false,
                window,
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                ButtonIndex::from(button),
                mods,
            )?;
        }
        Ok(())
    }

    fn grab_pointer(&self, window: WindowId, cursor: CursorShape) -> Result<bool> {
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION;
        let reply = self
            .ctx
            .conn
            .grab_pointer(
                false,
                window,
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                self.cursors.for_shape(cursor),
                x11rb::CURRENT_TIME,
            )?
            .reply()?;
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.ctx.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn grab_keyboard(&self, window: WindowId) -> Result<bool> {
        let reply = self
            .ctx
            .conn
            .grab_keyboard(false, window, x11rb::CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_keyboard(&self) -> Result<()> {
        self.ctx.conn.ungrab_keyboard(x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn create_overlay(&self, parent: WindowId) -> Result<WindowId> {
        let aux = CreateWindowAux::new().background_pixel(WHITE).event_mask(EventMask::EXPOSURE);
        self.create_window(parent, Point::default(), 0, &aux)
    }

    fn create_menu_window(&self, at: Point, border_width: i32, border_pixel: u32) -> Result<WindowId> {
        let aux = CreateWindowAux::new()
            .background_pixel(WHITE)
            .border_pixel(border_pixel)
            .override_redirect(1)
            .event_mask(EventMask::KEY_PRESS | EventMask::EXPOSURE);
        self.create_window(self.ctx.root_window, at, border_width, &aux)
    }

    fn create_frame_window(&self, pixel: u32) -> Result<WindowId> {
        let aux = CreateWindowAux::new()
            .background_pixel(pixel)
            .override_redirect(1)
            .event_mask(EventMask::BUTTON_PRESS | EventMask::POINTER_MOTION | EventMask::KEY_PRESS);
        self.create_window(self.ctx.root_window, Point::default(), 0, &aux)
    }

    fn shape_frame(&self, window: WindowId, geometry: Geometry, thickness: i32) -> Result<()> {
        self.move_resize(window, geometry)?;
        let (w, h) = (geometry.width.max(1) as u16, geometry.height.max(1) as u16);
        let t = thickness.max(1) as u16;
        let rects = [
            Rectangle { x: 0, y: 0, width: w, height: t },
            Rectangle { x: 0, y: h.saturating_sub(t) as i16, width: w, height: t },
            Rectangle { x: 0, y: 0, width: t, height: h },
            Rectangle { x: w.saturating_sub(t) as i16, y: 0, width: t, height: h },
        ];
        self.ctx.conn.shape_rectangles(
            shape::SO::SET,
            shape::SK::BOUNDING,
            ClipOrdering::UNSORTED,
            window,
            0,
            0,
            &rects,
        )?;
        Ok(())
    }

    fn draw_text(&self, window: WindowId, rows: &[TextRow]) -> Result<(i32, i32)> {
        self.ctx.conn.clear_area(false, window, 0, 0, 0, 0)?;
        let mut gcs = self.gcs.borrow_mut();
        let (mut width, mut y) = (0, TEXT_PADDING);
        for row in rows {
            let (fg, bg) = if row.inverted { (WHITE, BLACK) } else { (BLACK, WHITE) };
            let (right, line_height) = draw::text(&self.ctx, &mut gcs, window, self.font, &row.text, fg, bg, TEXT_PADDING, y)?;
            width = width.max(right);
            y = y.saturating_add(line_height as i16);
        }
        Ok((width + 2 * i32::from(TEXT_PADDING), i32::from(y + TEXT_PADDING)))
    }

    fn destroy_window(&self, window: WindowId) -> Result<()> {
        self.gcs.borrow_mut().forget(&self.ctx, window);
        self.ctx.conn.destroy_window(window)?;
        Ok(())
    }

    fn spawn(&self, command_line: &str) -> Result<()> {
        spawn::execute(command_line)
    }

    fn flush(&self) -> Result<()> {
        self.ctx.conn.flush()?;
        Ok(())
    }

    fn wait_event(&self) -> Result<WmEvent> {
        loop {
            let event = self.ctx.conn.wait_for_event()?;
            if let Some(event) = self.translate(event) {
                return Ok(event);
            }
        }
    }

    fn poll_event(&self) -> Result<Option<WmEvent>> {
        while let Some(event) = self.ctx.conn.poll_for_event()? {
            if let Some(event) = self.translate(event) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}
