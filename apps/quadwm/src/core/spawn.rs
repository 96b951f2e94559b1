use std::process::Stdio;

use anyhow::{Context as _, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs `command_line` through `/bin/sh` in its own process group so it
/// outlives the window manager, and reaps it in the background.
pub fn execute(command_line: &str) -> Result<()> {
    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::null())
        .process_group(0)
        .spawn()
        .with_context(|| format!("Failed to spawn {:?}", command_line))?;

    let command_line = command_line.to_string();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!(command = command_line, "Child exited"),
            Ok(status) => debug!(command = command_line, %status, "Child exited with failure"),
            Err(e) => warn!("Failed to wait for {:?}: {}", command_line, e),
        }
    });
    Ok(())
}
