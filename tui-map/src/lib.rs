//! Tile-index layers, parsing and a ratatui renderer for top-down maps.

pub mod core;
pub mod parse;
pub mod prelude;
#[cfg(feature = "ratatui")]
pub mod render;
