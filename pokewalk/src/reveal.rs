use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Full,
    Fog,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Full => ViewMode::Fog,
            ViewMode::Fog => ViewMode::Full,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Full => "full",
            ViewMode::Fog => "fog",
        }
    }
}

/// Coarse grid of world cells the actor has seen in fog mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevealedAreas {
    grid: f64,
    cells: BTreeSet<(i64, i64)>,
}

impl RevealedAreas {
    pub fn new(grid: f64) -> Self {
        Self {
            grid: grid.max(1.0),
            cells: BTreeSet::new(),
        }
    }

    /// Restores from `"x,y"` keys; malformed keys are skipped.
    pub fn from_keys<S: AsRef<str>>(grid: f64, keys: &[S]) -> Self {
        let mut areas = Self::new(grid);
        for key in keys {
            let mut parts = key.as_ref().split(',');
            let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };
            if let (Ok(x), Ok(y)) = (x.trim().parse(), y.trim().parse()) {
                areas.cells.insert((x, y));
            }
        }
        areas
    }

    pub fn keys(&self) -> Vec<String> {
        self.cells.iter().map(|(x, y)| format!("{x},{y}")).collect()
    }

    /// Marks every grid corner within `radius` of `origin`. Returns how many were new.
    pub fn reveal_around(&mut self, origin: Point, radius: f64) -> usize {
        let grid = self.grid;
        let start_x = ((origin.x - radius) / grid).floor() as i64;
        let end_x = ((origin.x + radius) / grid).ceil() as i64;
        let start_y = ((origin.y - radius) / grid).floor() as i64;
        let end_y = ((origin.y + radius) / grid).ceil() as i64;

        let mut added = 0;
        for x in start_x..=end_x {
            for y in start_y..=end_y {
                let corner = Point::new(x as f64 * grid, y as f64 * grid);
                if corner.distance(origin) <= radius && self.cells.insert((x, y)) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn is_revealed(&self, point: Point) -> bool {
        let x = (point.x / self.grid).floor() as i64;
        let y = (point.y / self.grid).floor() as i64;
        self.cells.contains(&(x, y))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
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
    use pretty_assertions::assert_eq;

    #[test]
    fn reveal_marks_cells_within_radius_once() {
        let mut areas = RevealedAreas::new(20.0);
        let added = areas.reveal_around(Point::new(100.0, 100.0), 20.0);

        // Corners at distance 0 and 20 along the axes.
        assert_eq!(added, 5);
        assert!(areas.is_revealed(Point::new(105.0, 105.0)));
        assert!(!areas.is_revealed(Point::new(145.0, 145.0)));
        assert_eq!(areas.reveal_around(Point::new(100.0, 100.0), 20.0), 0);
    }

    #[test]
    fn keys_round_trip_and_skip_garbage() {
        let areas = RevealedAreas::from_keys(20.0, &["1,2", "-3,4", "oops", "1,2,3"]);
        assert_eq!(areas.keys(), vec!["-3,4".to_string(), "1,2".to_string()]);
    }

    #[test]
    fn toggling_view_mode() {
        assert_eq!(ViewMode::Full.toggled(), ViewMode::Fog);
        assert_eq!(ViewMode::Fog.toggled(), ViewMode::Full);
    }
}
