use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_map::core::{CoreError, MapRead, MapSize, TileKind, TileLayer};
use tui_map::parse::{parse_index_layer, CellFormat, ParseError, ParseOptions};

use crate::collision::CollisionIndex;
use crate::geometry::{Point, Rect, Size};
use crate::zones::{EncounterZones, ZoneCategory};

pub const COLLISION_LAYER: &str = "collisions.txt";
pub const ZONE_LAYER: &str = "zones.txt";

#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {layer}: {source}")]
    Parse { layer: String, source: ParseError },
    #[error(transparent)]
    Layer(#[from] CoreError),
    #[error("{layer} is {actual_cols}x{actual_rows}, expected {cols}x{rows}")]
    Dimensions {
        layer: String,
        cols: u16,
        rows: u16,
        actual_cols: u16,
        actual_rows: u16,
    },
}

/// Fits a `cols x rows` grid into the world viewport, keeping square cells and
/// centering the leftover space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MapLayout {
    pub cols: u16,
    pub rows: u16,
    pub viewport: Size,
    pub render: Size,
    pub offset: Point,
    pub cell: Size,
}

impl MapLayout {
    pub fn fit(cols: u16, rows: u16, viewport: Size) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let grid_aspect = cols as f64 / rows as f64;
        let view_aspect = viewport.width / viewport.height.max(f64::EPSILON);

        let render = if grid_aspect > view_aspect {
            Size::new(viewport.width, viewport.width / grid_aspect)
        } else {
            Size::new(viewport.height * grid_aspect, viewport.height)
        };
        let offset = Point::new(
            (viewport.width - render.width) / 2.0,
            (viewport.height - render.height) / 2.0,
        );

        Self {
            cols,
            rows,
            viewport,
            render,
            offset,
            cell: Size::new(render.width / cols as f64, render.height / rows as f64),
        }
    }

    pub fn cell_rect(&self, col: u16, row: u16) -> Rect {
        Rect::new(
            col as f64 * self.cell.width + self.offset.x,
            row as f64 * self.cell.height + self.offset.y,
            self.cell.width,
            self.cell.height,
        )
    }

    /// Grid cell under a world point, if the point is on the map.
    pub fn cell_at(&self, point: Point) -> Option<(u16, u16)> {
        let col = ((point.x - self.offset.x) / self.cell.width).floor();
        let row = ((point.y - self.offset.y) / self.cell.height).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some((col as u16, row as u16))
    }

    /// Actor size scales with the rendered map, a tenth of its short side.
    pub fn actor_size(&self) -> f64 {
        self.render.min_side() / 10.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Terrain {
    Open,
    Blocked,
    Zone(ZoneCategory),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorldMap {
    pub name: String,
    pub layout: MapLayout,
    pub collisions: CollisionIndex,
    pub zones: EncounterZones,
    terrain: Vec<Terrain>,
}

impl WorldMap {
    pub fn from_layers(
        name: impl Into<String>,
        collisions: &TileLayer,
        zones: &TileLayer,
        viewport: Size,
    ) -> Result<Self, MapError> {
        collisions.ensure_same_size(zones)?;
        let layout = MapLayout::fit(collisions.width(), collisions.height(), viewport);

        let mut terrain = Vec::with_capacity(collisions.size.tile_count());
        for row in 0..collisions.height() {
            for col in 0..collisions.width() {
                let cell = if collisions.value_at(col, row) != 0 {
                    Terrain::Blocked
                } else {
                    ZoneCategory::from_index(zones.value_at(col, row))
                        .map(Terrain::Zone)
                        .unwrap_or(Terrain::Open)
                };
                terrain.push(cell);
            }
        }

        Ok(Self {
            name: name.into(),
            collisions: CollisionIndex::from_layer(collisions, &layout),
            zones: EncounterZones::from_layer(zones, &layout),
            layout,
            terrain,
        })
    }

    /// Map with no walls and no encounter zones.
    pub fn open(name: impl Into<String>, size: MapSize, viewport: Size) -> Self {
        let layout = MapLayout::fit(size.width, size.height, viewport);
        Self {
            name: name.into(),
            layout,
            collisions: CollisionIndex::default(),
            zones: EncounterZones::default(),
            terrain: vec![Terrain::Open; size.tile_count()],
        }
    }

    /// Loads `collisions.txt` and `zones.txt` from `dir`. Layers may be digit rows or
    /// comma separated tile indices.
    pub fn load(dir: &Path, cols: u16, rows: u16, viewport: Size) -> Result<Self, MapError> {
        let collisions = read_layer(dir, COLLISION_LAYER, cols, rows)?;
        let zones = read_layer(dir, ZONE_LAYER, cols, rows)?;
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "map".to_string());
        let map = Self::from_layers(name, &collisions, &zones, viewport)?;
        tracing::info!(
            map = %map.name,
            blocked = map.collisions.len(),
            zones = map.zones.len(),
            "map loaded"
        );
        Ok(map)
    }

    pub fn size(&self) -> MapSize {
        MapSize::new(self.layout.cols, self.layout.rows)
    }

    pub fn terrain_at(&self, col: u16, row: u16) -> Terrain {
        if col >= self.layout.cols || row >= self.layout.rows {
            return Terrain::Blocked;
        }
        let idx = row as usize * self.layout.cols as usize + col as usize;
        self.terrain.get(idx).copied().unwrap_or(Terrain::Blocked)
    }
}

impl MapRead for WorldMap {
    fn map_size(&self) -> MapSize {
        self.size()
    }

    fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        match self.terrain_at(x, y) {
            Terrain::Open => TileKind::Ground,
            Terrain::Blocked => TileKind::Wall,
            Terrain::Zone(ZoneCategory::Common) => TileKind::Grass,
            Terrain::Zone(ZoneCategory::Aquatic) => TileKind::Water,
            Terrain::Zone(ZoneCategory::Terrestrial) => TileKind::Rock,
        }
    }
}

fn read_layer(dir: &Path, file: &str, cols: u16, rows: u16) -> Result<TileLayer, MapError> {
    let path = dir.join(file);
    let text = std::fs::read_to_string(&path).map_err(|source| MapError::Io {
        path: path.clone(),
        source,
    })?;
    let options = if text.contains(',') {
        ParseOptions {
            format: CellFormat::Csv,
            columns: Some(cols),
        }
    } else {
        ParseOptions::default()
    };
    let layer = parse_index_layer(file, &text, &options).map_err(|source| MapError::Parse {
        layer: file.to_string(),
        source,
    })?;
    if layer.width() != cols || layer.height() != rows {
        return Err(MapError::Dimensions {
            layer: file.to_string(),
            cols,
            rows,
            actual_cols: layer.width(),
            actual_rows: layer.height(),
        });
    }
    Ok(layer)
}
