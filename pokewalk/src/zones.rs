use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_map::core::TileLayer;

use crate::creature::Species;
use crate::geometry::{overlaps, Rect};
use crate::map::MapLayout;

const AQUATIC_TAGS: [&str; 2] = ["water", "ice"];
const TERRESTRIAL_TAGS: [&str; 3] = ["ground", "rock", "dragon"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ZoneCategory {
    Common,
    Aquatic,
    Terrestrial,
}

impl ZoneCategory {
    /// Layer value to category: 1 common, 2 aquatic, 3 terrestrial.
    pub fn from_index(value: u16) -> Option<Self> {
        match value {
            1 => Some(ZoneCategory::Common),
            2 => Some(ZoneCategory::Aquatic),
            3 => Some(ZoneCategory::Terrestrial),
            _ => None,
        }
    }

    pub fn index(self) -> u16 {
        match self {
            ZoneCategory::Common => 1,
            ZoneCategory::Aquatic => 2,
            ZoneCategory::Terrestrial => 3,
        }
    }

    /// Whether a creature may be drawn for an encounter in this zone.
    pub fn accepts(self, species: &Species) -> bool {
        match self {
            ZoneCategory::Common => true,
            ZoneCategory::Aquatic => AQUATIC_TAGS.iter().any(|tag| species.has_tag(tag)),
            ZoneCategory::Terrestrial => TERRESTRIAL_TAGS.iter().any(|tag| species.has_tag(tag)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ZoneCategory::Common => "tall grass",
            ZoneCategory::Aquatic => "shoreline",
            ZoneCategory::Terrestrial => "rocky ground",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncounterZone {
    pub rect: Rect,
    pub category: ZoneCategory,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncounterZones {
    zones: Vec<EncounterZone>,
}

impl EncounterZones {
    pub fn new(zones: Vec<EncounterZone>) -> Self {
        Self { zones }
    }

    /// Cells with an unknown value are skipped.
    pub fn from_layer(layer: &TileLayer, layout: &MapLayout) -> Self {
        let zones = layer
            .occupied()
            .filter_map(|(col, row, value)| {
                ZoneCategory::from_index(value).map(|category| EncounterZone {
                    rect: layout.cell_rect(col, row),
                    category,
                })
            })
            .collect();
        Self { zones }
    }

    /// First zone, in construction order, that the rect overlaps.
    pub fn zone_at(&self, rect: &Rect) -> Option<&EncounterZone> {
        self.zones.iter().find(|zone| overlaps(rect, &zone.rect))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use tui_map::core::MapSize;

    #[test]
    fn categories_filter_by_tags() {
        let lapras = Species::new("lapras", "", &["water", "ice"]);
        let onix = Species::new("onix", "", &["rock", "ground"]);
        let dratini = Species::new("dratini", "", &["dragon"]);
        let pidgey = Species::new("pidgey", "", &["normal", "flying"]);

        assert!(ZoneCategory::Aquatic.accepts(&lapras));
        assert!(!ZoneCategory::Aquatic.accepts(&onix));
        assert!(ZoneCategory::Terrestrial.accepts(&onix));
        assert!(ZoneCategory::Terrestrial.accepts(&dratini));
        assert!(!ZoneCategory::Terrestrial.accepts(&pidgey));
        assert!(ZoneCategory::Common.accepts(&pidgey));
    }

    #[test]
    fn zone_at_returns_first_in_construction_order() {
        let zones = EncounterZones::new(vec![
            EncounterZone {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                category: ZoneCategory::Aquatic,
            },
            EncounterZone {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                category: ZoneCategory::Common,
            },
        ]);

        let hit = zones.zone_at(&Rect::new(1.0, 1.0, 2.0, 2.0)).expect("zone");
        assert_eq!(hit.category, ZoneCategory::Aquatic);
        assert!(zones.zone_at(&Rect::new(50.0, 50.0, 2.0, 2.0)).is_none());
    }

    #[test]
    fn from_layer_maps_values_to_categories() {
        let layer = TileLayer::new("zones", MapSize::new(4, 1), vec![1, 2, 3, 7]).expect("layer");
        let layout = MapLayout::fit(4, 1, Size::new(40.0, 10.0));
        let zones = EncounterZones::from_layer(&layer, &layout);

        assert_eq!(zones.len(), 3);
        let rock = zones
            .zone_at(&Rect::new(21.0, 1.0, 2.0, 2.0))
            .expect("rock cell");
        assert_eq!(rock.category, ZoneCategory::Terrestrial);
    }
}
