use thiserror::Error;

mod executables;
mod launcher;

pub use executables::{executables, executables_in};
pub use launcher::{LaunchHandle, Launcher, Selection};

/// Error types for menu operations
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub const PROMPT_START: &str = "\u{bb}";
pub const PROMPT_END: &str = "\u{ab}";

/// A managed window as offered by the window search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: u32,
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Command(String),
    Window(WindowInfo),
    /// Free text typed by the user when nothing matched.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub display: String,
    pub payload: Payload,
    synthetic: bool,
}

impl Entry {
    pub fn new(display: impl Into<String>, payload: Payload) -> Self {
        Self { display: display.into(), payload, synthetic: false }
    }

    pub fn command(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), Payload::Command(name))
    }

    pub fn window(info: WindowInfo) -> Self {
        Self::new(format!(" {}", info.name), Payload::Window(info))
    }

    fn synthetic(input: &str) -> Self {
        Self { display: input.to_string(), payload: Payload::Text(input.to_string()), synthetic: true }
    }

    /// True for entries made up from the typed input rather than picked
    /// from the list.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// The command line to run for this entry, if it names one.
    pub fn command_line(&self) -> Option<&str> {
        match &self.payload {
            Payload::Command(cmd) | Payload::Text(cmd) => Some(cmd),
            Payload::Window(_) => None,
        }
    }
}

/// How the typed input narrows the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Case-insensitive prefix match on the display text.
    Prefix,
    /// Ranked substring match on window names, then classes.
    Windows { current: Option<u32> },
}

impl Filter {
    pub fn apply(&self, entries: &[Entry], input: &str) -> Vec<Entry> {
        match *self {
            Filter::Prefix => filter_prefix(entries, input),
            Filter::Windows { current } => filter_windows(entries, input, current),
        }
    }
}

pub fn filter_prefix(entries: &[Entry], input: &str) -> Vec<Entry> {
    if input.is_empty() {
        return entries.to_vec();
    }
    let input = input.to_lowercase();
    entries
        .iter()
        .filter(|e| e.display.to_lowercase().starts_with(&input))
        .cloned()
        .collect()
}

const TIERS: usize = 4;

/// Window search ranking: a name match lands in tier 2, a class match in
/// tier 3 and is shown as `class:name`. The current window is marked with
/// `!` and demoted one tier.
pub fn filter_windows(entries: &[Entry], input: &str, current: Option<u32>) -> Vec<Entry> {
    let input = input.to_lowercase();
    let mut tiers: [Vec<Entry>; TIERS] = Default::default();

    for entry in entries {
        let Payload::Window(info) = &entry.payload else {
            continue;
        };
        let mut entry = entry.clone();
        let mut tier = if info.name.to_lowercase().contains(&input) {
            2
        } else if info.class.to_lowercase().contains(&input) {
            entry.display = format!(" {}:{}", info.class, info.name);
            3
        } else {
            continue;
        };

        if Some(info.id) == current {
            entry.display.replace_range(..1, "!");
            tier = (tier + 1).min(TIERS - 1);
        }
        tiers[tier].push(entry);
    }

    tiers.into_iter().flatten().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Backspace,
    Return,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Nothing changed.
    None,
    Redraw,
    Select(Entry),
    Cancel,
}

/// The launcher's state: input, filtered entries and the active row.
#[derive(Debug, Clone)]
pub struct Menu {
    title: String,
    entries: Vec<Entry>,
    shown: Vec<Entry>,
    input: String,
    active: usize,
    filter: Filter,
}

impl Menu {
    pub fn new(title: impl Into<String>, entries: Vec<Entry>, filter: Filter) -> Self {
        let mut menu = Self {
            title: title.into(),
            entries,
            shown: Vec::new(),
            input: String::new(),
            active: 0,
            filter,
        };
        menu.refilter();
        menu
    }

    fn refilter(&mut self) {
        self.shown = self.filter.apply(&self.entries, &self.input);
        self.active = 0;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn shown(&self) -> &[Entry] {
        &self.shown
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn prompt(&self) -> String {
        format!("{}{}{}{}", self.title, PROMPT_START, self.input, PROMPT_END)
    }

    pub fn handle_key(&mut self, key: Key) -> MenuAction {
        match key {
            Key::Down => {
                if self.shown.is_empty() {
                    return MenuAction::None;
                }
                self.active = (self.active + 1) % self.shown.len();
                MenuAction::Redraw
            }
            Key::Up => {
                if self.shown.is_empty() {
                    return MenuAction::None;
                }
                self.active = self.active.checked_sub(1).unwrap_or(self.shown.len() - 1);
                MenuAction::Redraw
            }
            Key::Backspace => {
                if self.input.pop().is_none() {
                    return MenuAction::None;
                }
                self.refilter();
                MenuAction::Redraw
            }
            Key::Char(c) => {
                if c.is_control() {
                    return MenuAction::None;
                }
                self.input.push(c);
                self.refilter();
                MenuAction::Redraw
            }
            Key::Return => match self.shown.get(self.active) {
                Some(entry) => MenuAction::Select(entry.clone()),
                None => MenuAction::Select(Entry::synthetic(&self.input)),
            },
            Key::Escape => MenuAction::Cancel,
        }
    }

    /// Rows to render below the prompt: at most `max` entries starting at
    /// the active one and wrapping around, padded to a common width. The
    /// first row is the highlighted one.
    pub fn lines(&self, max: usize) -> Vec<String> {
        let width = self
            .shown
            .iter()
            .map(|e| e.display.chars().count())
            .chain(std::iter::once(self.prompt().chars().count()))
            .max()
            .unwrap_or(0);
        let n = self.shown.len().min(max);
        (0..n)
            .map(|i| &self.shown[(self.active + i) % self.shown.len()])
            .map(|e| format!("{:<width$}", e.display, width = width))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commands(names: &[&str]) -> Vec<Entry> {
        names.iter().map(|n| Entry::command(*n)).collect()
    }

    fn window(id: u32, name: &str, class: &str) -> Entry {
        Entry::window(WindowInfo { id, name: name.to_string(), class: class.to_string() })
    }

    fn displays(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.display.as_str()).collect()
    }

    #[test]
    fn test_filter_prefix() {
        let entries = commands(&["Firefox", "feh", "xterm"]);
        assert_eq!(displays(&filter_prefix(&entries, "F")), vec!["Firefox", "feh"]);
        assert_eq!(filter_prefix(&entries, "").len(), 3);
        assert!(filter_prefix(&entries, "zz").is_empty());
    }

    #[test]
    fn test_filter_windows_tiers() {
        let entries = vec![
            window(1, "mutt", "XTerm"),
            window(2, "xterm", "XTerm"),
            window(3, "Firefox", "firefox"),
        ];
        let out = filter_windows(&entries, "xterm", None);
        // name match first, class match second
        assert_eq!(displays(&out), vec![" xterm", " XTerm:mutt"]);
    }

    #[test]
    fn test_filter_windows_current_demoted() {
        let entries = vec![window(1, "xterm", "XTerm"), window(2, "xterm2", "XTerm")];
        let out = filter_windows(&entries, "xterm", Some(1));
        assert_eq!(displays(&out), vec![" xterm2", "!xterm"]);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut menu = Menu::new("exec", commands(&["a", "b", "c"]), Filter::Prefix);
        assert_eq!(menu.handle_key(Key::Up), MenuAction::Redraw);
        assert_eq!(menu.active(), 2);
        menu.handle_key(Key::Down);
        assert_eq!(menu.active(), 0);
        menu.handle_key(Key::Down);
        assert_eq!(menu.handle_key(Key::Return), MenuAction::Select(Entry::command("b")));
    }

    #[test]
    fn test_typing_resets_active_and_filters() {
        let mut menu = Menu::new("exec", commands(&["alpha", "beta", "bravo"]), Filter::Prefix);
        menu.handle_key(Key::Down);
        menu.handle_key(Key::Char('b'));
        assert_eq!(menu.active(), 0);
        assert_eq!(displays(menu.shown()), vec!["beta", "bravo"]);
        assert_eq!(menu.prompt(), "exec\u{bb}b\u{ab}");

        menu.handle_key(Key::Backspace);
        assert_eq!(menu.shown().len(), 3);
        assert_eq!(menu.handle_key(Key::Backspace), MenuAction::None);
    }

    #[test]
    fn test_return_without_match_is_synthetic() {
        let mut menu = Menu::new("exec", commands(&["alpha"]), Filter::Prefix);
        for c in "ls -l".chars() {
            menu.handle_key(Key::Char(c));
        }
        let MenuAction::Select(entry) = menu.handle_key(Key::Return) else {
            panic!("expected a selection");
        };
        assert!(entry.is_synthetic());
        assert_eq!(entry.command_line(), Some("ls -l"));
        assert_eq!(menu.handle_key(Key::Escape), MenuAction::Cancel);
    }

    #[test]
    fn test_lines_start_at_active_and_pad() {
        let mut menu = Menu::new("x", commands(&["a", "bbbbbbb", "c"]), Filter::Prefix);
        menu.handle_key(Key::Down);
        menu.handle_key(Key::Down);
        assert_eq!(menu.lines(2), vec!["c      ", "a      "]);
        assert_eq!(menu.lines(10).len(), 3);
    }
}
