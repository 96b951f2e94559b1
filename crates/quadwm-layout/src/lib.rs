//! Window geometry for quadwm: the occlusion quadtree, the layout model
//! with its undo history, collision-aware fill and the ICCCM resize step.
//!
//! Nothing in here talks to the X server; the window manager feeds plain
//! rectangles in and applies the results.

pub mod collision;
pub mod geometry;
pub mod hints;
pub mod layout;
pub mod quadtree;

pub use collision::{calculate_fill, collisions, Bounds, Direction, Obstacle};
pub use geometry::{screen_for_point, snap_offset, Gap, Geometry, Point};
pub use hints::{resize_step, Corner, SizeHints};
pub use layout::{Layout, LayoutStack, MaximizedState};
pub use quadtree::{visible, Region};
