use std::fmt;

/// Raw value stored in a tile-index layer. `0` means "nothing on this cell".
pub type TileIndex = u16;

/// Visual class of a cell, used by the renderer to pick a palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Ground,
    Grass,
    Water,
    Rock,
    Wall,
    Custom(u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapSize {
    pub width: u16,
    pub height: u16,
}

impl MapSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn tile_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    TileCountMismatch { expected: usize, actual: usize },
    SizeMismatch { expected: MapSize, actual: MapSize },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::TileCountMismatch { expected, actual } => {
                write!(f, "tile count mismatch: expected {}, got {}", expected, actual)
            }
            CoreError::SizeMismatch { expected, actual } => write!(
                f,
                "layer size mismatch: expected {}x{}, got {}x{}",
                expected.width, expected.height, actual.width, actual.height
            ),
        }
    }
}

impl std::error::Error for CoreError {}

/// A row-major grid of tile indices, as exported by a tile editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    pub name: String,
    pub size: MapSize,
    pub tiles: Vec<TileIndex>,
}

impl TileLayer {
    pub fn new(
        name: impl Into<String>,
        size: MapSize,
        tiles: Vec<TileIndex>,
    ) -> Result<Self, CoreError> {
        let expected = size.tile_count();
        let actual = tiles.len();
        if expected != actual {
            return Err(CoreError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            name: name.into(),
            size,
            tiles,
        })
    }

    pub fn empty(name: impl Into<String>, size: MapSize) -> Self {
        Self {
            name: name.into(),
            size,
            tiles: vec![0; size.tile_count()],
        }
    }

    pub fn width(&self) -> u16 {
        self.size.width
    }

    pub fn height(&self) -> u16 {
        self.size.height
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    pub fn value_at(&self, x: u16, y: u16) -> TileIndex {
        self.index(x, y)
            .and_then(|idx| self.tiles.get(idx).copied())
            .unwrap_or(0)
    }

    pub fn set(&mut self, x: u16, y: u16, value: TileIndex) {
        if let Some(idx) = self.index(x, y) {
            self.tiles[idx] = value;
        }
    }

    /// Non-empty cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (u16, u16, TileIndex)> + '_ {
        let width = self.size.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(move |(idx, value)| ((idx % width) as u16, (idx / width) as u16, *value))
    }

    pub fn ensure_same_size(&self, other: &TileLayer) -> Result<(), CoreError> {
        if self.size != other.size {
            return Err(CoreError::SizeMismatch {
                expected: self.size,
                actual: other.size,
            });
        }
        Ok(())
    }
}

pub trait MapRead {
    fn map_size(&self) -> MapSize;
    fn tile_kind(&self, x: u16, y: u16) -> TileKind;

    /// Cells reported as not visible are drawn as fog.
    fn is_visible(&self, _x: u16, _y: u16) -> bool {
        true
    }
}

pub fn viewport_centered(
    focus_x: u16,
    focus_y: u16,
    map: MapSize,
    view_cols: u16,
    view_rows: u16,
) -> (u16, u16) {
    if map.width == 0 || map.height == 0 || view_cols == 0 || view_rows == 0 {
        return (0, 0);
    }

    let max_x = map.width.saturating_sub(view_cols);
    let max_y = map.height.saturating_sub(view_rows);
    let start_x = focus_x.saturating_sub(view_cols / 2).min(max_x);
    let start_y = focus_y.saturating_sub(view_rows / 2).min(max_y);
    (start_x, start_y)
}
