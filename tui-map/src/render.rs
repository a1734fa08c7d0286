use std::collections::HashMap;

use ratatui::{layout::Rect, style::Color, Frame};

use crate::core::{viewport_centered, MapRead, TileKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureVariant {
    pub ch: char,
    pub fg: Color,
    pub density: u8,
}

impl TextureVariant {
    pub const fn new(ch: char, fg: Color, density: u8) -> Self {
        Self { ch, fg, density }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePalette {
    pub main: Color,
    pub alt: Color,
    pub variants: [TextureVariant; 3],
}

impl TilePalette {
    pub const fn new(main: Color, alt: Color, variants: [TextureVariant; 3]) -> Self {
        Self {
            main,
            alt,
            variants,
        }
    }

    /// Palette whose three texture glyphs are shades of `main`.
    pub fn textured(main: Color, alt: Color, glyphs: [char; 3], density: u8) -> Self {
        Self::new(
            main,
            alt,
            [
                TextureVariant::new(glyphs[0], adjust_color(main, 18), density),
                TextureVariant::new(glyphs[1], adjust_color(main, 10), density + 1),
                TextureVariant::new(glyphs[2], adjust_color(main, -8), density + 2),
            ],
        )
    }
}

#[derive(Clone, Debug)]
pub struct TileTheme {
    palettes: HashMap<TileKind, TilePalette>,
    fallback: TilePalette,
    hidden: Color,
}

impl TileTheme {
    pub fn builder() -> TileThemeBuilder {
        TileThemeBuilder::default()
    }

    pub fn palette(&self, tile: TileKind) -> TilePalette {
        self.palettes.get(&tile).copied().unwrap_or(self.fallback)
    }

    pub fn hidden(&self) -> Color {
        self.hidden
    }
}

#[derive(Clone, Debug)]
pub struct TileThemeBuilder {
    palettes: HashMap<TileKind, TilePalette>,
    fallback: TilePalette,
    hidden: Color,
}

impl Default for TileThemeBuilder {
    fn default() -> Self {
        Self {
            palettes: HashMap::new(),
            fallback: TilePalette::textured(
                Color::Rgb(34, 112, 58),
                Color::Rgb(38, 120, 64),
                ['.', '\'', '`'],
                6,
            ),
            hidden: Color::Rgb(8, 8, 12),
        }
    }
}

impl TileThemeBuilder {
    pub fn tile(mut self, kind: TileKind, palette: TilePalette) -> Self {
        self.palettes.insert(kind, palette);
        self
    }

    pub fn fallback(mut self, palette: TilePalette) -> Self {
        self.fallback = palette;
        self
    }

    /// Background used for cells the map reports as not visible.
    pub fn hidden(mut self, color: Color) -> Self {
        self.hidden = color;
        self
    }

    pub fn build(self) -> TileTheme {
        TileTheme {
            palettes: self.palettes,
            fallback: self.fallback,
            hidden: self.hidden,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewScale {
    /// Squeeze the whole map into the area, sampling tiles per terminal cell.
    Fit,
    /// Draw each tile as a fixed block of cells around the camera focus.
    Tiles {
        cols_per_tile: u16,
        rows_per_tile: u16,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Camera {
    pub focus_x: u16,
    pub focus_y: u16,
}

/// Where the last render placed the map, so callers can project overlays onto it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapRenderResult {
    pub start_x: u16,
    pub start_y: u16,
    pub view_tiles_h: u16,
    pub view_tiles_v: u16,
    pub origin_x: u16,
    pub origin_y: u16,
    pub used_cols: u16,
    pub used_rows: u16,
}

impl MapRenderResult {
    pub fn marker_cell(&self, map_x: u16, map_y: u16) -> Option<(u16, u16)> {
        if !self.contains(map_x, map_y) {
            return None;
        }
        let col = project_center(map_x - self.start_x, self.view_tiles_h, self.used_cols);
        let row = project_center(map_y - self.start_y, self.view_tiles_v, self.used_rows);
        Some((self.origin_x + col, self.origin_y + row))
    }

    pub fn contains(&self, map_x: u16, map_y: u16) -> bool {
        self.view_tiles_h > 0
            && self.view_tiles_v > 0
            && map_x >= self.start_x
            && map_y >= self.start_y
            && map_x < self.start_x + self.view_tiles_h
            && map_y < self.start_y + self.view_tiles_v
    }

    fn tile_for_cell(&self, col: u16, row: u16) -> (u16, u16) {
        let tx = col as u32 * self.view_tiles_h as u32 / self.used_cols.max(1) as u32;
        let ty = row as u32 * self.view_tiles_v as u32 / self.used_rows.max(1) as u32;
        (self.start_x + tx as u16, self.start_y + ty as u16)
    }
}

fn project_center(tile: u16, tiles: u16, cells: u16) -> u16 {
    let doubled = (tile as u32 * 2 + 1) * cells as u32 / (tiles.max(1) as u32 * 2);
    (doubled as u16).min(cells.saturating_sub(1))
}

#[derive(Clone, Debug)]
pub struct MapRenderer {
    scale: ViewScale,
    theme: TileTheme,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self {
            scale: ViewScale::Fit,
            theme: TileTheme::builder().build(),
        }
    }
}

impl MapRenderer {
    pub fn new(theme: TileTheme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: ViewScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn layout<M: MapRead>(&self, area: Rect, map: &M, camera: Camera) -> MapRenderResult {
        let mut result = MapRenderResult::default();
        let map_size = map.map_size();
        if area.width == 0 || area.height == 0 || map_size.width == 0 || map_size.height == 0 {
            return result;
        }

        let (view_h, view_v, used_cols, used_rows) = match self.scale {
            ViewScale::Fit => (map_size.width, map_size.height, area.width, area.height),
            ViewScale::Tiles {
                cols_per_tile,
                rows_per_tile,
            } => {
                let cols_per_tile = cols_per_tile.max(1);
                let rows_per_tile = rows_per_tile.max(1);
                let view_h = (area.width / cols_per_tile).min(map_size.width);
                let view_v = (area.height / rows_per_tile).min(map_size.height);
                (view_h, view_v, view_h * cols_per_tile, view_v * rows_per_tile)
            }
        };
        if view_h == 0 || view_v == 0 {
            return result;
        }

        let (start_x, start_y) =
            viewport_centered(camera.focus_x, camera.focus_y, map_size, view_h, view_v);

        result.start_x = start_x;
        result.start_y = start_y;
        result.view_tiles_h = view_h;
        result.view_tiles_v = view_v;
        result.used_cols = used_cols;
        result.used_rows = used_rows;
        result.origin_x = area.x + area.width.saturating_sub(used_cols) / 2;
        result.origin_y = area.y + area.height.saturating_sub(used_rows) / 2;
        result
    }

    pub fn render_base<M: MapRead>(
        &self,
        frame: &mut Frame,
        area: Rect,
        map: &M,
        camera: Camera,
    ) -> MapRenderResult {
        let result = self.layout(area, map, camera);
        let buf = frame.buffer_mut();

        for row in 0..result.used_rows {
            for col in 0..result.used_cols {
                let (map_x, map_y) = result.tile_for_cell(col, row);
                let x = result.origin_x + col;
                let y = result.origin_y + row;
                let Some(cell) = buf.cell_mut((x, y)) else {
                    continue;
                };

                if !map.is_visible(map_x, map_y) {
                    let hidden = self.theme.hidden();
                    cell.set_bg(hidden).set_fg(hidden).set_char(' ');
                    continue;
                }

                let palette = self.theme.palette(map.tile_kind(map_x, map_y));
                let seed = tile_seed(map_x, map_y);
                let bg = if seed % 2 == 0 {
                    palette.main
                } else {
                    palette.alt
                };
                let texture = palette.variants[(seed % palette.variants.len() as u32) as usize];
                let density = texture.density.max(1) as u32;

                if cell_seed(map_x, map_y, col, row) % density == 0 {
                    cell.set_bg(bg).set_fg(texture.fg).set_char(texture.ch);
                } else {
                    cell.set_bg(bg).set_fg(bg).set_char(' ');
                }
            }
        }

        result
    }
}

pub fn adjust_color(color: Color, delta: i16) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let clamp = |v: i16| v.clamp(0, 255) as u8;
            Color::Rgb(
                clamp(r as i16 + delta),
                clamp(g as i16 + delta),
                clamp(b as i16 + delta),
            )
        }
        other => other,
    }
}

pub fn tile_seed(x: u16, y: u16) -> u32 {
    let mut n = (x as u32)
        .wrapping_mul(374_761_393)
        .wrapping_add((y as u32).wrapping_mul(668_265_263));
    n ^= n >> 13;
    n = n.wrapping_mul(1_274_126_177);
    n ^ (n >> 16)
}

pub fn cell_seed(x: u16, y: u16, col: u16, row: u16) -> u32 {
    let mut n = tile_seed(x, y);
    n ^= (col as u32).wrapping_mul(2_246_822_519);
    n ^= (row as u32).wrapping_mul(3_266_489_917);
    n ^= n >> 15;
    n = n.wrapping_mul(668_265_263);
    n ^ (n >> 13)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MapSize;
    use ratatui::{backend::TestBackend, Terminal};

    struct Striped {
        size: MapSize,
        hide_right_half: bool,
    }

    impl MapRead for Striped {
        fn map_size(&self) -> MapSize {
            self.size
        }

        fn tile_kind(&self, x: u16, _y: u16) -> TileKind {
            if x % 2 == 0 {
                TileKind::Grass
            } else {
                TileKind::Water
            }
        }

        fn is_visible(&self, x: u16, _y: u16) -> bool {
            !self.hide_right_half || x < self.size.width / 2
        }
    }

    #[test]
    fn fit_layout_covers_whole_map() {
        let map = Striped {
            size: MapSize::new(70, 40),
            hide_right_half: false,
        };
        let result = MapRenderer::default().layout(
            Rect::new(0, 0, 80, 24),
            &map,
            Camera {
                focus_x: 0,
                focus_y: 0,
            },
        );

        assert_eq!((result.start_x, result.start_y), (0, 0));
        assert_eq!((result.view_tiles_h, result.view_tiles_v), (70, 40));
        assert_eq!(result.marker_cell(0, 0), Some((0, 0)));
        assert_eq!(result.marker_cell(69, 39), Some((79, 23)));
    }

    #[test]
    fn tile_layout_follows_camera() {
        let map = Striped {
            size: MapSize::new(70, 40),
            hide_right_half: false,
        };
        let renderer = MapRenderer::default().with_scale(ViewScale::Tiles {
            cols_per_tile: 2,
            rows_per_tile: 1,
        });
        let result = renderer.layout(
            Rect::new(0, 0, 40, 20),
            &map,
            Camera {
                focus_x: 35,
                focus_y: 20,
            },
        );

        assert_eq!((result.view_tiles_h, result.view_tiles_v), (20, 20));
        assert_eq!((result.start_x, result.start_y), (25, 10));
        assert_eq!(result.marker_cell(25, 10), Some((1, 0)));
        assert_eq!(result.marker_cell(26, 10), Some((3, 0)));
        assert_eq!(result.marker_cell(0, 0), None);
    }

    #[test]
    fn hidden_cells_use_hidden_background() {
        let map = Striped {
            size: MapSize::new(4, 2),
            hide_right_half: true,
        };
        let theme = TileTheme::builder().hidden(Color::Rgb(1, 2, 3)).build();
        let renderer = MapRenderer::new(theme).with_scale(ViewScale::Tiles {
            cols_per_tile: 2,
            rows_per_tile: 1,
        });

        let mut terminal = Terminal::new(TestBackend::new(8, 2)).expect("terminal");
        terminal
            .draw(|frame| {
                renderer.render_base(
                    frame,
                    Rect::new(0, 0, 8, 2),
                    &map,
                    Camera {
                        focus_x: 0,
                        focus_y: 0,
                    },
                );
            })
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let hidden = buffer.cell((6, 1)).expect("cell");
        assert_eq!(hidden.bg, Color::Rgb(1, 2, 3));
        let shown = buffer.cell((0, 0)).expect("cell");
        assert_ne!(shown.bg, Color::Rgb(1, 2, 3));
    }

    #[test]
    fn tile_seed_is_deterministic() {
        assert_eq!(tile_seed(7, 9), tile_seed(7, 9));
        assert_ne!(tile_seed(7, 9), tile_seed(7, 10));
    }
}
