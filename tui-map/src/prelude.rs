pub use crate::core::{viewport_centered, CoreError, MapRead, MapSize, TileIndex, TileKind, TileLayer};
pub use crate::parse::{parse_index_layer, CellFormat, ParseError, ParseOptions};

#[cfg(feature = "ratatui")]
pub use crate::render::{
    adjust_color, cell_seed, tile_seed, Camera, MapRenderResult, MapRenderer, TextureVariant,
    TilePalette, TileTheme, TileThemeBuilder, ViewScale,
};
