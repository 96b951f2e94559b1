use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ChangeWindowAttributesAux, ConnectionExt, Colormap, EventMask, Window};
use x11rb::rust_connection::RustConnection;

use crate::ewmh::atoms::AtomCollection;

/// The X connection and the per-screen values everything else needs.
pub struct Context {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub root_window: Window,
    pub default_colormap: Colormap,
    pub atoms: AtomCollection,
}

impl Context {
    pub fn new() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let (root_window, default_colormap) = (screen.root, screen.default_colormap);
        let atoms = AtomCollection::new(&conn)?.reply()?;
        Ok(Self { conn, screen_num, root_window, default_colormap, atoms })
    }

    /// Takes over the root window. Only one client may hold the redirect,
    /// so this runs after the manager selection is ours.
    pub fn select_root_events(&self) -> Result<()> {
        let values = ChangeWindowAttributesAux::new().event_mask(
            EventMask::STRUCTURE_NOTIFY
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::FOCUS_CHANGE,
        );
        self.conn.change_window_attributes(self.root_window, &values)?.check()?;
        Ok(())
    }
}
