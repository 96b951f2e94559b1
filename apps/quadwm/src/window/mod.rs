pub mod actions;
pub mod client;
pub mod commands;
pub mod cursors;
pub mod draw;
pub mod drag;
pub mod error;
pub mod keys;
pub mod launcher;
pub mod manager;
pub mod select;

/// Stacking tier. Every window of a higher layer stays above every window
/// of a lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Layer {
    Desktop,
    Below,
    #[default]
    Normal,
    Above,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Desktop, Layer::Below, Layer::Normal, Layer::Above];
}
