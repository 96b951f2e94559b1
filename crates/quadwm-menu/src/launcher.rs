use tokio::sync::oneshot;
use tracing::debug;

use crate::{Entry, Filter, Key, Menu, MenuAction};

/// Outcome of a launcher session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub entry: Option<Entry>,
    pub accepted: bool,
}

impl Selection {
    pub fn cancelled() -> Self {
        Self { entry: None, accepted: false }
    }

    fn accepted(entry: Entry) -> Self {
        Self { entry: Some(entry), accepted: true }
    }
}

/// Receiving end of a launcher. Resolves exactly once.
#[derive(Debug)]
pub struct LaunchHandle {
    rx: oneshot::Receiver<Selection>,
}

impl LaunchHandle {
    pub async fn wait(self) -> Selection {
        self.rx.await.unwrap_or_else(|_| Selection::cancelled())
    }

    /// Non-blocking poll. A launcher dropped without answering counts as
    /// cancelled.
    pub fn try_wait(&mut self) -> Option<Selection> {
        match self.rx.try_recv() {
            Ok(selection) => Some(selection),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Selection::cancelled()),
        }
    }
}

/// A running launcher: the menu model plus the sender for its result.
#[derive(Debug)]
pub struct Launcher {
    menu: Menu,
    tx: Option<oneshot::Sender<Selection>>,
}

impl Launcher {
    pub fn show(title: impl Into<String>, entries: Vec<Entry>, filter: Filter) -> (Self, LaunchHandle) {
        let (tx, rx) = oneshot::channel();
        let launcher = Self { menu: Menu::new(title, entries, filter), tx: Some(tx) };
        (launcher, LaunchHandle { rx })
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn is_finished(&self) -> bool {
        self.tx.is_none()
    }

    /// Feeds one key press. Returns whether the menu needs redrawing.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if self.is_finished() {
            return false;
        }
        match self.menu.handle_key(key) {
            MenuAction::None => false,
            MenuAction::Redraw => true,
            MenuAction::Select(entry) => {
                debug!(entry = %entry.display, synthetic = entry.is_synthetic(), "Launcher selection");
                self.finish(Selection::accepted(entry));
                false
            }
            MenuAction::Cancel => {
                self.cancel();
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        self.finish(Selection::cancelled());
    }

    fn finish(&mut self, selection: Selection) {
        if let Some(tx) = self.tx.take() {
            // the handle may already be gone; nobody is left to tell
            let _ = tx.send(selection);
        }
    }
}

impl Drop for Launcher {
    fn drop(&mut self) {
        self.cancel();
    }
}
