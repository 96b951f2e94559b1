pub mod context;
pub mod spawn;
