use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_map::core::TileLayer;

use crate::geometry::{overlaps, Rect};
use crate::map::MapLayout;

/// Immutable set of blocked cells, built once when the map loads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CollisionIndex {
    cells: Vec<Rect>,
}

impl CollisionIndex {
    pub fn new(cells: Vec<Rect>) -> Self {
        Self { cells }
    }

    /// Every non-zero cell of `layer` becomes a blocked rect.
    pub fn from_layer(layer: &TileLayer, layout: &MapLayout) -> Self {
        let cells = layer
            .occupied()
            .map(|(col, row, _)| layout.cell_rect(col, row))
            .collect();
        Self { cells }
    }

    pub fn is_blocked(&self, rect: &Rect) -> bool {
        self.cells.iter().any(|cell| overlaps(rect, cell))
    }

    pub fn cells(&self) -> &[Rect] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use tui_map::core::MapSize;

    #[test]
    fn builds_one_rect_per_marked_cell() {
        let layer = TileLayer::new("collisions", MapSize::new(3, 2), vec![0, 1025, 0, 0, 0, 1])
            .expect("layer");
        let layout = MapLayout::fit(3, 2, Size::new(30.0, 20.0));
        let index = CollisionIndex::from_layer(&layer, &layout);

        assert_eq!(index.len(), 2);
        assert_eq!(index.cells()[0], Rect::new(10.0, 0.0, 10.0, 10.0));
        assert_eq!(index.cells()[1], Rect::new(20.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn blocked_when_any_cell_overlaps() {
        let index = CollisionIndex::new(vec![Rect::new(10.0, 0.0, 10.0, 10.0)]);
        assert!(index.is_blocked(&Rect::new(4.0, 0.0, 7.0, 5.0)));
        assert!(!index.is_blocked(&Rect::new(0.0, 20.0, 5.0, 5.0)));
        assert!(!CollisionIndex::default().is_blocked(&Rect::new(0.0, 0.0, 99.0, 99.0)));
    }
}
