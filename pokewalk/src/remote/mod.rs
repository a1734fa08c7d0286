//! Port to the remote player store, plus the HTTP and in-process backends.

mod http;
mod memory;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::creature::{Creature, Species};

pub use http::HttpRemote;
pub use memory::MemoryRemote;

pub type PlayerId = u64;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PokedexDto {
    #[serde(default)]
    pub total_pokemons: u32,
    #[serde(default)]
    pub total_captured: u32,
    #[serde(default)]
    pub captured_pokemons: Vec<Creature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerDto {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pokeballs: u32,
    #[serde(default)]
    pub berries: u32,
    #[serde(default)]
    pub pokedex: Option<PokedexDto>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourcesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pokeballs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub berries: Option<u32>,
}

impl ResourcesUpdate {
    pub fn absolute(pokeballs: u32, berries: u32) -> Self {
        Self {
            pokeballs: Some(pokeballs),
            berries: Some(berries),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PokedexAction {
    /// Increments, or creates with the given quantity (default 1).
    Add,
    /// Decrements; deletes the record at quantity 1. Fails when absent.
    Remove,
    /// Writes the exact quantity; 0 deletes.
    Set,
}

impl PokedexAction {
    pub fn label(self) -> &'static str {
        match self {
            PokedexAction::Add => "add",
            PokedexAction::Remove => "remove",
            PokedexAction::Set => "set",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PokedexUpdate {
    pub pokemon: Creature,
    pub action: PokedexAction,
}

#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("player {0} not found")]
    NotFound(PlayerId),
    #[error("{name} is not in the pokedex")]
    MissingCreature { name: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("response parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

#[async_trait]
pub trait RemoteInventory: Send + Sync {
    async fn fetch_player(&self, id: PlayerId) -> Result<PlayerDto, RemoteError>;

    async fn update_resources(
        &self,
        id: PlayerId,
        update: ResourcesUpdate,
    ) -> Result<PlayerDto, RemoteError>;

    async fn update_pokedex(
        &self,
        id: PlayerId,
        update: PokedexUpdate,
    ) -> Result<PlayerDto, RemoteError>;

    async fn list_creatures(&self) -> Result<Vec<Species>, RemoteError>;

    async fn random_creature(&self) -> Result<Species, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn player_payload_decodes_string_or_array_types() {
        let json = r#"{
            "id": 7,
            "name": "Ash",
            "pokeballs": 12,
            "berries": 3,
            "pokedex": {
                "totalPokemons": 151,
                "totalCaptured": 2,
                "capturedPokemons": [
                    {"name": "lapras", "sprite": "l.png", "type": ["water", "ice"], "quantity": 1},
                    {"name": "onix", "sprite": "o.png", "type": "rock,ground", "quantity": 3}
                ]
            }
        }"#;
        let player: PlayerDto = serde_json::from_str(json).expect("player");
        let pokedex = player.pokedex.expect("pokedex");
        assert_eq!(pokedex.captured_pokemons[0].types, "water,ice");
        assert_eq!(pokedex.captured_pokemons[1].quantity, 3);
    }

    #[test]
    fn update_bodies_match_the_wire_format() {
        let body = serde_json::to_value(ResourcesUpdate {
            pokeballs: Some(4),
            berries: None,
        })
        .expect("json");
        assert_eq!(body, serde_json::json!({"pokeballs": 4}));

        let update = PokedexUpdate {
            pokemon: Creature::from_species(&Species::new("pikachu", "p.png", &["electric"])),
            action: PokedexAction::Set,
        };
        let body = serde_json::to_value(update).expect("json");
        assert_eq!(body["action"], "set");
        assert_eq!(body["pokemon"]["type"], "electric");
    }
}
