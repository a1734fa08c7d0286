use crate::geometry::Point;
use crate::inventory::Inventory;
use crate::remote::PlayerId;

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadCatalog,
    FetchRandomCreature,
    Login { player_id: PlayerId },
    Sync { player_id: PlayerId, inventory: Inventory },
    SavePosition { position: Point },
    SaveRevealed { keys: Vec<String> },
}
