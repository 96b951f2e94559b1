//! An in-memory [`Backend`] that keeps just enough server state to drive
//! the window manager in tests and logs every request it receives.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::{anyhow, Result};
use quadwm_layout::{Geometry, Point, SizeHints};

use super::{
    Attributes, Backend, CursorShape, IcccmState, NetState, Protocol, TextRow, WindowId, WmEvent, WmHints,
};

const ROOT: WindowId = 1_000_000;
const FIRST_CREATED: WindowId = 2_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    MoveResize(WindowId, Geometry),
    MoveTo(WindowId, Point),
    SetBorderWidth(WindowId, i32),
    SetBorderColor(WindowId, u32),
    Restack(Vec<WindowId>),
    Map(WindowId),
    Unmap(WindowId),
    WarpPointer(Point),
    SetWmState(WindowId, IcccmState),
    SetNetWmState(WindowId, Vec<NetState>),
    SendProtocol(WindowId, Protocol),
    Kill(WindowId),
    Focus(WindowId),
    ConfigureNotify(WindowId, Geometry, i32),
    LookupColor(String),
    GrabKey(u32, u16),
    GrabButton(WindowId, u8, u16),
    GrabPointer(WindowId, CursorShape),
    UngrabPointer,
    GrabKeyboard(WindowId),
    UngrabKeyboard,
    ShapeFrame(WindowId, Geometry, i32),
    DestroyWindow(WindowId),
    Spawn(String),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    geometry: HashMap<WindowId, Geometry>,
    attributes: HashMap<WindowId, Attributes>,
    stacking: Vec<WindowId>,
    screens: Vec<Geometry>,
    pointer: Point,
    names: HashMap<WindowId, String>,
    normal_hints: HashMap<WindowId, SizeHints>,
    wm_hints: HashMap<WindowId, WmHints>,
    protocols: HashMap<WindowId, Vec<Protocol>>,
    net_state: HashMap<WindowId, Vec<NetState>>,
    text: HashMap<WindowId, Vec<TextRow>>,
    events: VecDeque<WmEvent>,
    next_id: WindowId,
    refuse_grabs: bool,
}

pub struct RecordingBackend {
    state: RefCell<State>,
}

impl RecordingBackend {
    /// One 1920x1080 screen, pointer at the origin.
    pub fn new() -> Self {
        let state = State {
            screens: vec![Geometry::new(0, 0, 1920, 1080)],
            next_id: FIRST_CREATED,
            ..Default::default()
        };
        Self { state: RefCell::new(state) }
    }

    fn add(&self, id: WindowId, geometry: Geometry, attributes: Attributes) {
        let mut state = self.state.borrow_mut();
        state.geometry.insert(id, geometry);
        state.attributes.insert(id, attributes);
        state.stacking.push(id);
    }

    /// A client window that has not been mapped yet.
    pub fn add_window(&self, id: WindowId, geometry: Geometry) {
        self.add(id, geometry, Attributes::default());
    }

    pub fn add_mapped_window(&self, id: WindowId, geometry: Geometry) {
        self.add(id, geometry, Attributes { override_redirect: false, mapped: true, viewable: true });
    }

    pub fn add_override_redirect(&self, id: WindowId) {
        self.add(id, Geometry::new(0, 0, 10, 10), Attributes { override_redirect: true, mapped: true, viewable: true });
    }

    pub fn set_pointer(&self, p: Point) {
        self.state.borrow_mut().pointer = p;
    }

    pub fn pointer_position(&self) -> Point {
        self.state.borrow().pointer
    }

    pub fn set_screens(&self, screens: Vec<Geometry>) {
        self.state.borrow_mut().screens = screens;
    }

    pub fn set_name(&self, id: WindowId, name: &str) {
        self.state.borrow_mut().names.insert(id, name.to_string());
    }

    pub fn set_normal_hints(&self, id: WindowId, raw: &[u32]) {
        self.state.borrow_mut().normal_hints.insert(id, SizeHints::from_raw(raw));
    }

    pub fn set_wm_hints(&self, id: WindowId, hints: WmHints) {
        self.state.borrow_mut().wm_hints.insert(id, hints);
    }

    pub fn set_protocols(&self, id: WindowId, protocols: Vec<Protocol>) {
        self.state.borrow_mut().protocols.insert(id, protocols);
    }

    /// Makes every pointer and keyboard grab fail as if another client
    /// held it.
    pub fn refuse_grabs(&self, refuse: bool) {
        self.state.borrow_mut().refuse_grabs = refuse;
    }

    pub fn push_event(&self, event: WmEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn stacking(&self) -> Vec<WindowId> {
        self.state.borrow().stacking.clone()
    }

    pub fn net_state_of(&self, id: WindowId) -> Vec<NetState> {
        self.state.borrow().net_state.get(&id).cloned().unwrap_or_default()
    }

    pub fn text_of(&self, id: WindowId) -> Vec<TextRow> {
        self.state.borrow().text.get(&id).cloned().unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn known(&self, id: WindowId) -> Result<()> {
        if self.state.borrow().geometry.contains_key(&id) {
            Ok(())
        } else {
            Err(anyhow!("BadWindow: {}", id))
        }
    }

    fn create(&self) -> WindowId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.geometry.insert(id, Geometry::new(0, 0, 1, 1));
        id
    }
}

impl Backend for RecordingBackend {
    fn root(&self) -> WindowId {
        ROOT
    }

    fn screens(&self) -> Result<Vec<Geometry>> {
        Ok(self.state.borrow().screens.clone())
    }

    fn stacking_order(&self) -> Result<Vec<WindowId>> {
        Ok(self.stacking())
    }

    fn attributes(&self, window: WindowId) -> Result<Attributes> {
        self.state.borrow().attributes.get(&window).copied().ok_or_else(|| anyhow!("BadWindow: {}", window))
    }

    fn geometry(&self, window: WindowId) -> Result<Geometry> {
        self.state.borrow().geometry.get(&window).copied().ok_or_else(|| anyhow!("BadWindow: {}", window))
    }

    fn move_resize(&self, window: WindowId, geometry: Geometry) -> Result<()> {
        self.record(Call::MoveResize(window, geometry));
        self.known(window)?;
        self.state.borrow_mut().geometry.insert(window, geometry);
        Ok(())
    }

    fn move_to(&self, window: WindowId, position: Point) -> Result<()> {
        self.record(Call::MoveTo(window, position));
        let mut state = self.state.borrow_mut();
        let g = state.geometry.get_mut(&window).ok_or_else(|| anyhow!("BadWindow: {}", window))?;
        g.x = position.x;
        g.y = position.y;
        Ok(())
    }

    fn set_border_width(&self, window: WindowId, width: i32) -> Result<()> {
        self.record(Call::SetBorderWidth(window, width));
        Ok(())
    }

    fn set_border_color(&self, window: WindowId, pixel: u32) -> Result<()> {
        self.record(Call::SetBorderColor(window, pixel));
        Ok(())
    }

    fn restack(&self, windows: &[WindowId]) -> Result<()> {
        self.record(Call::Restack(windows.to_vec()));
        let mut state = self.state.borrow_mut();
        state.stacking.retain(|w| !windows.contains(w));
        state.stacking.extend_from_slice(windows);
        Ok(())
    }

    fn map(&self, window: WindowId) -> Result<()> {
        self.record(Call::Map(window));
        if let Some(attrs) = self.state.borrow_mut().attributes.get_mut(&window) {
            attrs.mapped = true;
            attrs.viewable = true;
        }
        Ok(())
    }

    fn unmap(&self, window: WindowId) -> Result<()> {
        self.record(Call::Unmap(window));
        Ok(())
    }

    fn select_client_events(&self, window: WindowId) -> Result<()> {
        self.known(window)
    }

    fn pointer(&self) -> Result<Point> {
        Ok(self.pointer_position())
    }

    fn warp_pointer(&self, to: Point) -> Result<()> {
        self.record(Call::WarpPointer(to));
        self.set_pointer(to);
        Ok(())
    }

    fn warp_pointer_by(&self, dx: i32, dy: i32) -> Result<()> {
        let p = self.pointer_position();
        self.warp_pointer(Point::new(p.x + dx, p.y + dy))
    }

    fn set_wm_state(&self, window: WindowId, state: IcccmState) -> Result<()> {
        self.record(Call::SetWmState(window, state));
        Ok(())
    }

    fn net_wm_state(&self, window: WindowId) -> Result<Vec<NetState>> {
        Ok(self.net_state_of(window))
    }

    fn set_net_wm_state(&self, window: WindowId, states: &[NetState]) -> Result<()> {
        self.record(Call::SetNetWmState(window, states.to_vec()));
        self.state.borrow_mut().net_state.insert(window, states.to_vec());
        Ok(())
    }

    fn name(&self, window: WindowId) -> Result<String> {
        Ok(self.state.borrow().names.get(&window).cloned().unwrap_or_default())
    }

    fn class(&self, _window: WindowId) -> Result<(String, String)> {
        Ok((String::new(), String::new()))
    }

    fn wm_hints(&self, window: WindowId) -> Result<WmHints> {
        Ok(self.state.borrow().wm_hints.get(&window).copied().unwrap_or_default())
    }

    fn normal_hints(&self, window: WindowId) -> Result<SizeHints> {
        Ok(self.state.borrow().normal_hints.get(&window).copied().unwrap_or_default())
    }

    fn protocols(&self, window: WindowId) -> Result<Vec<Protocol>> {
        Ok(self.state.borrow().protocols.get(&window).cloned().unwrap_or_default())
    }

    fn send_protocol(&self, window: WindowId, protocol: Protocol) -> Result<()> {
        self.record(Call::SendProtocol(window, protocol));
        Ok(())
    }

    fn kill(&self, window: WindowId) -> Result<()> {
        self.record(Call::Kill(window));
        Ok(())
    }

    fn focus(&self, window: WindowId) -> Result<()> {
        self.record(Call::Focus(window));
        Ok(())
    }

    fn send_configure_notify(&self, window: WindowId, geometry: Geometry, border_width: i32) -> Result<()> {
        self.record(Call::ConfigureNotify(window, geometry, border_width));
        Ok(())
    }

    fn lookup_color(&self, name: &str) -> Result<u32> {
        self.record(Call::LookupColor(name.to_string()));
        match name {
            "black" => Ok(0x000000),
            "white" => Ok(0xffffff),
            "red" => Ok(0xff0000),
            _ => Err(anyhow!("unknown color {:?}", name)),
        }
    }

    fn grab_key(&self, keysym: u32, modifiers: u16) -> Result<()> {
        self.record(Call::GrabKey(keysym, modifiers));
        Ok(())
    }

    fn grab_button(&self, window: WindowId, button: u8, modifiers: u16) -> Result<()> {
        self.record(Call::GrabButton(window, button, modifiers));
        Ok(())
    }

    fn grab_pointer(&self, window: WindowId, cursor: CursorShape) -> Result<bool> {
        self.record(Call::GrabPointer(window, cursor));
        Ok(!self.state.borrow().refuse_grabs)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.record(Call::UngrabPointer);
        Ok(())
    }

    fn grab_keyboard(&self, window: WindowId) -> Result<bool> {
        self.record(Call::GrabKeyboard(window));
        Ok(!self.state.borrow().refuse_grabs)
    }

    fn ungrab_keyboard(&self) -> Result<()> {
        self.record(Call::UngrabKeyboard);
        Ok(())
    }

    fn create_overlay(&self, parent: WindowId) -> Result<WindowId> {
        self.known(parent)?;
        Ok(self.create())
    }

    fn create_menu_window(&self, _at: Point, _border_width: i32, _border_pixel: u32) -> Result<WindowId> {
        Ok(self.create())
    }

    fn create_frame_window(&self, _pixel: u32) -> Result<WindowId> {
        Ok(self.create())
    }

    fn shape_frame(&self, window: WindowId, geometry: Geometry, thickness: i32) -> Result<()> {
        self.record(Call::ShapeFrame(window, geometry, thickness));
        Ok(())
    }

    /// Pretends every character is 10x20 pixels.
    fn draw_text(&self, window: WindowId, rows: &[TextRow]) -> Result<(i32, i32)> {
        let width = rows.iter().map(|r| r.text.chars().count() as i32 * 10).max().unwrap_or(0);
        self.state.borrow_mut().text.insert(window, rows.to_vec());
        Ok((width, rows.len() as i32 * 20))
    }

    fn destroy_window(&self, window: WindowId) -> Result<()> {
        self.record(Call::DestroyWindow(window));
        let mut state = self.state.borrow_mut();
        state.geometry.remove(&window);
        state.stacking.retain(|w| *w != window);
        Ok(())
    }

    fn spawn(&self, command_line: &str) -> Result<()> {
        self.record(Call::Spawn(command_line.to_string()));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn wait_event(&self) -> Result<WmEvent> {
        self.state.borrow_mut().events.pop_front().ok_or_else(|| anyhow!("connection closed"))
    }

    fn poll_event(&self) -> Result<Option<WmEvent>> {
        Ok(self.state.borrow_mut().events.pop_front())
    }
}
