mod backend;
mod core;
mod ewmh;
mod window;

use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;
use quadwm_config::Config;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt, CreateWindowAux, EventMask, Window, WindowClass,
    CLIENT_MESSAGE_EVENT,
};
use x11rb::protocol::Event;

use crate::backend::x11::X11Backend;
use crate::core::context::Context;
use crate::window::manager::{Exit, WindowManager};

const REPLACE_TIMEOUT: Duration = Duration::from_secs(3);
const REPLACE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Replace the running window manager
    #[arg(long)]
    replace: bool,

    /// Configuration file (cwmrc syntax, or TOML when it ends in .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Takes the ICCCM manager selection `WM_S{screen}` and returns the window
/// that owns it.
fn acquire_wm_selection(ctx: &Context, replace: bool) -> Result<Window> {
    let atom_name = format!("WM_S{}", ctx.screen_num);
    let wm_sn_atom = ctx.conn.intern_atom(false, atom_name.as_bytes())?.reply()?.atom;

    let owner = ctx.conn.get_selection_owner(wm_sn_atom)?.reply()?.owner;
    if owner != x11rb::NONE {
        if !replace {
            return Err(anyhow!(
                "Another window manager is already running on screen {}. Use --replace to replace it.",
                ctx.screen_num
            ));
        }
        info!("Another WM is running (Window {}), replacing", owner);
        // so we hear the old owner go away
        let values = ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY);
        if let Err(e) = ctx.conn.change_window_attributes(owner, &values)?.check() {
            warn!("Could not watch the old window manager: {}", e);
        }
    }

    let selection_win = ctx.conn.generate_id()?;
    ctx.conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        selection_win,
        ctx.root_window,
        -1,
        -1,
        1,
        1,
        0,
        WindowClass::INPUT_ONLY,
        x11rb::COPY_FROM_PARENT,
        &CreateWindowAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
    )?;

    ctx.conn.set_selection_owner(selection_win, wm_sn_atom, x11rb::CURRENT_TIME)?;
    let new_owner = ctx.conn.get_selection_owner(wm_sn_atom)?.reply()?.owner;
    if new_owner != selection_win {
        return Err(anyhow!("Failed to acquire WM selection."));
    }

    if owner != x11rb::NONE {
        wait_for_previous_owner(ctx, owner)?;
    }

    let announce = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        window: ctx.root_window,
        type_: ctx.atoms.MANAGER,
        data: [x11rb::CURRENT_TIME, wm_sn_atom, selection_win, 0, 0].into(),
        sequence: 0,
    };
    ctx.conn.send_event(false, ctx.root_window, EventMask::STRUCTURE_NOTIFY, announce)?;
    ctx.conn.flush()?;

    info!("Acquired WM selection: {}", atom_name);
    Ok(selection_win)
}

/// Gives the old window manager a few seconds to exit, then kills it.
fn wait_for_previous_owner(ctx: &Context, owner: Window) -> Result<()> {
    ctx.conn.flush()?;
    let deadline = Instant::now() + REPLACE_TIMEOUT;
    while Instant::now() < deadline {
        while let Some(event) = ctx.conn.poll_for_event()? {
            if let Event::DestroyNotify(e) = event {
                if e.window == owner {
                    info!("Previous window manager exited");
                    return Ok(());
                }
            }
        }
        std::thread::sleep(REPLACE_POLL);
    }
    warn!("Previous window manager did not exit, killing it");
    ctx.conn.kill_client(owner)?;
    ctx.conn.flush()?;
    Ok(())
}

fn restart() -> Result<()> {
    let mut args = std::env::args_os();
    let program = args.next().ok_or_else(|| anyhow!("no program name to restart with"))?;
    info!("Re-executing {:?}", program);
    let err = std::process::Command::new(program).args(args).exec();
    Err(anyhow!("Failed to restart: {}", err))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting quadwm...");

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    let ctx = match Context::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to connect to X11 server: {}", e);
            return Err(e);
        }
    };
    info!("Screen: {}, Root Window: {}", ctx.screen_num, ctx.root_window);

    let selection_win = acquire_wm_selection(&ctx, args.replace).map_err(|e| {
        error!("{}", e);
        e
    })?;
    ctx.select_root_events()?;
    crate::ewmh::setup::setup_hints(&ctx, selection_win)?;

    let backend = X11Backend::new(ctx, &config.font)?;
    let mut wm = WindowManager::new(backend, config);
    wm.start()?;

    // don't let a single X11 error take the session down
    let exit = loop {
        match wm.run() {
            Ok(exit) => break exit,
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if error_msg.contains("closed the connection")
                    || error_msg.contains("broken pipe")
                    || error_msg.contains("I/O error")
                {
                    error!("Fatal X11 error - server disconnected: {}", e);
                    return Err(e);
                }
                error!("X11 error (continuing): {}", e);
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    };

    match exit {
        Exit::Quit => info!("Exiting"),
        Exit::Replaced => info!("Replaced by another window manager"),
        Exit::Restart => {
            drop(wm);
            restart()?;
        }
    }
    Ok(())
}
