use anyhow::Result;
use tracing::debug;
use x11rb::protocol::xproto::{Atom, AtomEnum, PropMode, Window};
use x11rb::wrapper::ConnectionExt as _;

use crate::core::context::Context;
use crate::ewmh::atoms::AtomCollection;

const WM_NAME: &str = "quadwm";

/// Everything advertised in `_NET_SUPPORTED`.
fn supported(atoms: &AtomCollection) -> Vec<Atom> {
    vec![
        atoms._NET_SUPPORTED,
        atoms._NET_SUPPORTING_WM_CHECK,
        atoms._NET_WM_NAME,
        atoms._NET_ACTIVE_WINDOW,
        atoms._NET_CLOSE_WINDOW,
        atoms._NET_WM_MOVERESIZE,
        atoms._NET_NUMBER_OF_DESKTOPS,
        atoms._NET_CURRENT_DESKTOP,
        atoms._NET_WM_STATE,
        atoms._NET_WM_STATE_FULLSCREEN,
        atoms._NET_WM_STATE_MAXIMIZED_HORZ,
        atoms._NET_WM_STATE_MAXIMIZED_VERT,
        atoms._NET_WM_STATE_ABOVE,
        atoms._NET_WM_STATE_BELOW,
        atoms._NET_WM_ALLOWED_ACTIONS,
        atoms._NET_WM_ACTION_FULLSCREEN,
        atoms._NET_WM_ACTION_MAXIMIZE_HORZ,
        atoms._NET_WM_ACTION_MAXIMIZE_VERT,
    ]
}

/// Publishes the EWMH root properties. `check_win` is the window that owns
/// the manager selection; it doubles as the supporting-WM check window.
pub fn setup_hints(ctx: &Context, check_win: Window) -> Result<()> {
    let (conn, atoms, root) = (&ctx.conn, &ctx.atoms, ctx.root_window);

    for window in [check_win, root] {
        conn.change_property32(PropMode::REPLACE, window, atoms._NET_SUPPORTING_WM_CHECK, AtomEnum::WINDOW, &[check_win])?;
    }
    conn.change_property8(PropMode::REPLACE, check_win, atoms._NET_WM_NAME, atoms.UTF8_STRING, WM_NAME.as_bytes())?;

    let supported = supported(atoms);
    conn.change_property32(PropMode::REPLACE, root, atoms._NET_SUPPORTED, AtomEnum::ATOM, &supported)?;

    // one desktop, no viewport
    let desktops: [(Atom, &[u32]); 3] = [
        (atoms._NET_NUMBER_OF_DESKTOPS, &[1]),
        (atoms._NET_CURRENT_DESKTOP, &[0]),
        (atoms._NET_DESKTOP_VIEWPORT, &[]),
    ];
    for (atom, value) in desktops {
        conn.change_property32(PropMode::REPLACE, root, atom, AtomEnum::CARDINAL, value)?;
    }

    debug!(supported = supported.len(), "EWMH hints published");
    Ok(())
}
