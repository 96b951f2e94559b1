use quadwm_layout::{Direction, MaximizedState};
use quadwm_menu::{executables, Entry, Filter, Payload, WindowInfo};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::window::error::ErrorCategory;
use crate::window::manager::{Exit, WindowManager};
use crate::window::Layer;

/// A built-in command as named in key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Lower,
    Raise,
    Fill,
    FillDirection(Direction),
    FillSelect,
    Push(Direction),
    Move { xf: i32, yf: i32 },
    Maximize(MaximizedState),
    Unmaximize,
    Fullscreen,
    Freeze,
    ToggleLayer(Layer),
    Delete,
    PopLayout,
    Cycle,
    Debug,
    Restart,
    Quit,
    Terminal,
    Exec,
    Search,
}

impl Command {
    pub fn parse(name: &str) -> Option<Self> {
        use Direction::*;
        Some(match name {
            "lower" => Command::Lower,
            "raise" => Command::Raise,
            "fill" => Command::Fill,
            "fillup" => Command::FillDirection(Up),
            "filldown" => Command::FillDirection(Down),
            "fillleft" => Command::FillDirection(Left),
            "fillright" => Command::FillDirection(Right),
            "fillsel" => Command::FillSelect,
            "pushup" => Command::Push(Up),
            "pushdown" => Command::Push(Down),
            "pushleft" => Command::Push(Left),
            "pushright" => Command::Push(Right),
            "moveup" => Command::Move { xf: 0, yf: -1 },
            "bigmoveup" => Command::Move { xf: 0, yf: -10 },
            "movedown" => Command::Move { xf: 0, yf: 1 },
            "bigmovedown" => Command::Move { xf: 0, yf: 10 },
            "moveleft" => Command::Move { xf: -1, yf: 0 },
            "bigmoveleft" => Command::Move { xf: -10, yf: 0 },
            "moveright" => Command::Move { xf: 1, yf: 0 },
            "bigmoveright" => Command::Move { xf: 10, yf: 0 },
            "maximize" => Command::Maximize(MaximizedState::FULL),
            "vmaximize" => Command::Maximize(MaximizedState::VERTICAL),
            "hmaximize" => Command::Maximize(MaximizedState::HORIZONTAL),
            "unmaximize" => Command::Unmaximize,
            "fullscreen" => Command::Fullscreen,
            "freeze" => Command::Freeze,
            "above" => Command::ToggleLayer(Layer::Above),
            "below" => Command::ToggleLayer(Layer::Below),
            "delete" => Command::Delete,
            "poplayout" => Command::PopLayout,
            "cycle" => Command::Cycle,
            "debug" => Command::Debug,
            "restart" => Command::Restart,
            "quit" => Command::Quit,
            "terminal" => Command::Terminal,
            "exec" => Command::Exec,
            "search" => Command::Search,
            _ => return None,
        })
    }
}

impl<B: Backend> WindowManager<B> {
    /// Runs a bound command. Names that are not built in go to the shell.
    pub fn run_command(&mut self, name: &str) {
        match Command::parse(name) {
            Some(command) => self.dispatch(command),
            None => self.spawn(name),
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Cycle => return self.cycle_screens(),
            Command::Debug => return self.debug_dump(),
            Command::Restart => {
                info!("Restarting");
                self.exit = Some(Exit::Restart);
                return;
            }
            Command::Quit => {
                info!("Quitting");
                self.exit = Some(Exit::Quit);
                return;
            }
            Command::Terminal => {
                match self.config.commands.get("term").cloned() {
                    Some(term) => self.spawn(&term),
                    None => debug!("No terminal configured"),
                }
                return;
            }
            Command::Exec => return self.exec_menu(),
            Command::Search => return self.search_menu(),
            _ => {}
        }

        let Some(id) = self.current.filter(|id| self.windows.contains_key(id)) else {
            debug!(?command, "No current window");
            return;
        };
        match command {
            Command::Lower => self.lower(id),
            Command::Raise => self.raise(id),
            Command::Fill => self.fill(id),
            Command::FillDirection(direction) => self.fill_direction(id, direction),
            Command::FillSelect => self.fill_select_begin(id),
            Command::Push(direction) => self.push_direction(id, direction),
            Command::Move { xf, yf } => self.move_by(id, xf, yf),
            Command::Maximize(state) => self.maximize(id, state),
            Command::Unmaximize => self.unmaximize(id),
            Command::Fullscreen => self.toggle_fullscreen(id),
            Command::Freeze => self.toggle_freeze(id),
            Command::ToggleLayer(layer) => self.toggle_layer(id, layer),
            Command::Delete => self.delete(id),
            Command::PopLayout => self.pop_layout(id),
            Command::Cycle
            | Command::Debug
            | Command::Restart
            | Command::Quit
            | Command::Terminal
            | Command::Exec
            | Command::Search => {}
        }
    }

    pub fn spawn(&mut self, command_line: &str) {
        debug!(command = command_line, "Executing");
        self.error_tracker.warn_if_failed(self.backend.spawn(command_line), "spawn", ErrorCategory::Launcher);
    }

    fn exec_menu(&mut self) {
        self.show_launcher("exec", executables(), Filter::Prefix, |wm, selection| {
            if !selection.accepted {
                return;
            }
            if let Some(command_line) = selection.entry.as_ref().and_then(|e| e.command_line()) {
                info!(command = command_line, "Launching");
                wm.spawn(command_line);
            }
        });
    }

    fn search_menu(&mut self) {
        let entries = self
            .mapped_windows()
            .into_iter()
            .filter_map(|id| self.windows.get(&id))
            .filter(|w| !w.ignored)
            .map(|w| Entry::window(WindowInfo { id: w.id, name: w.name.clone(), class: w.class.clone() }))
            .collect();
        let filter = Filter::Windows { current: self.current };
        self.show_launcher("window", entries, filter, |wm, selection| {
            let Some(entry) = selection.entry.filter(|e| selection.accepted && !e.is_synthetic()) else {
                return;
            };
            if let Payload::Window(info) = entry.payload {
                if wm.windows.contains_key(&info.id) {
                    wm.activate(info.id);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Call, RecordingBackend};
    use crate::backend::WmEvent;
    use crate::window::keys;
    use pretty_assertions::assert_eq;
    use quadwm_config::Config;
    use quadwm_layout::{Geometry, Point};

    #[test]
    fn test_parse_every_builtin() {
        let names = "lower raise fill fillup filldown fillleft fillright fillsel pushup pushdown pushleft \
                     pushright moveup bigmoveup movedown bigmovedown moveleft bigmoveleft moveright bigmoveright \
                     maximize vmaximize hmaximize unmaximize fullscreen freeze above below delete poplayout cycle \
                     debug restart quit terminal exec search";
        for name in names.split_whitespace() {
            assert!(Command::parse(name).is_some(), "{name} should be built in");
        }
        assert_eq!(Command::parse("bigmoveleft"), Some(Command::Move { xf: -10, yf: 0 }));
        assert_eq!(Command::parse("firefox"), None);
    }

    #[test]
    fn test_unknown_command_is_spawned() {
        let mut wm = WindowManager::new(RecordingBackend::new(), Config::default());
        wm.run_command("firefox --new-window");
        assert_eq!(wm.backend.calls(), vec![Call::Spawn("firefox --new-window".into())]);
    }

    #[test]
    fn test_window_commands_need_a_current_window() {
        let mut wm = WindowManager::new(RecordingBackend::new(), Config::default());
        wm.backend.add_mapped_window(1, Geometry::new(10, 10, 100, 100));
        wm.manage(1);
        wm.run_command("bigmoveright");
        assert_eq!(wm.windows[&1].geometry().x, 10);

        wm.mark_active(1);
        wm.run_command("bigmoveright");
        assert_eq!(wm.windows[&1].geometry().x, 20);
        wm.run_command("poplayout");
        assert_eq!(wm.windows[&1].geometry().x, 10);
    }

    #[test]
    fn test_restart_and_quit_set_exit() {
        let mut wm = WindowManager::new(RecordingBackend::new(), Config::default());
        wm.run_command("restart");
        assert_eq!(wm.exit, Some(Exit::Restart));
        wm.run_command("quit");
        assert_eq!(wm.exit, Some(Exit::Quit));
    }

    #[test]
    fn test_search_activates_the_picked_window() {
        let mut wm = WindowManager::new(RecordingBackend::new(), Config::default());
        wm.backend.add_mapped_window(1, Geometry::new(0, 0, 100, 100));
        wm.backend.add_mapped_window(2, Geometry::new(200, 200, 100, 100));
        wm.backend.set_name(2, "editor");
        wm.manage(1);
        wm.manage(2);

        wm.run_command("search");
        let window = wm.launcher.as_ref().unwrap().window;
        for c in "edit".chars() {
            let keysym = u32::from(c);
            wm.handle_event(WmEvent::KeyPress { window, keysym, shifted: keysym, state: 0 }).unwrap();
        }
        wm.handle_event(WmEvent::KeyPress { window, keysym: keys::XK_RETURN, shifted: keys::XK_RETURN, state: 0 })
            .unwrap();
        wm.process_pending();

        assert_eq!(wm.backend.pointer_position(), Point::new(250, 250));
        assert_eq!(wm.backend.stacking().last(), Some(&2));
    }
}
