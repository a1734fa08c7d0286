use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::creature::{Creature, Species};
use crate::remote::{
    PlayerDto, PlayerId, PokedexAction, PokedexDto, PokedexUpdate, RemoteError, RemoteInventory,
    ResourcesUpdate,
};

#[derive(Clone, Debug, Default)]
struct PlayerRecord {
    name: String,
    pokeballs: u32,
    berries: u32,
    creatures: BTreeMap<String, Creature>,
}

#[derive(Debug, Default)]
struct Backend {
    players: BTreeMap<PlayerId, PlayerRecord>,
    catalog: Vec<Species>,
    next_random: usize,
    fail_resources: bool,
    fail_fetch: bool,
    fail_creatures: BTreeSet<String>,
    calls: Vec<String>,
}

impl Backend {
    fn player(&self, id: PlayerId) -> Result<PlayerDto, RemoteError> {
        let record = self.players.get(&id).ok_or(RemoteError::NotFound(id))?;
        Ok(PlayerDto {
            id,
            name: record.name.clone(),
            pokeballs: record.pokeballs,
            berries: record.berries,
            pokedex: Some(PokedexDto {
                total_pokemons: self.catalog.len() as u32,
                total_captured: record.creatures.len() as u32,
                captured_pokemons: record.creatures.values().cloned().collect(),
            }),
        })
    }

    fn record_mut(&mut self, id: PlayerId) -> Result<&mut PlayerRecord, RemoteError> {
        self.players.get_mut(&id).ok_or(RemoteError::NotFound(id))
    }
}

/// In-process player store with the same semantics as the REST backend.
/// Used for offline play and in tests, where failures can be injected.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    inner: Mutex<Backend>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Vec<Species>) -> Self {
        let remote = Self::new();
        remote.lock().catalog = catalog;
        remote
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_player(&self, id: PlayerId, name: &str, pokeballs: u32, berries: u32) {
        self.lock().players.insert(
            id,
            PlayerRecord {
                name: name.to_string(),
                pokeballs,
                berries,
                creatures: BTreeMap::new(),
            },
        );
    }

    pub fn remove_player(&self, id: PlayerId) {
        self.lock().players.remove(&id);
    }

    /// Seeds a remote record directly, bypassing the call log.
    pub fn put_creature(&self, id: PlayerId, species: &Species, quantity: u32) {
        let mut backend = self.lock();
        if let Some(record) = backend.players.get_mut(&id) {
            let mut creature = Creature::from_species(species);
            creature.quantity = quantity;
            record.creatures.insert(creature.name.clone(), creature);
        }
    }

    pub fn snapshot(&self, id: PlayerId) -> Option<PlayerDto> {
        self.lock().player(id).ok()
    }

    pub fn quantity(&self, id: PlayerId, name: &str) -> u32 {
        self.lock()
            .players
            .get(&id)
            .and_then(|record| record.creatures.get(name))
            .map_or(0, |creature| creature.quantity)
    }

    pub fn fail_resources(&self, fail: bool) {
        self.lock().fail_resources = fail;
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.lock().fail_fetch = fail;
    }

    pub fn fail_creature(&self, name: &str) {
        self.lock().fail_creatures.insert(name.to_string());
    }

    /// Mutating calls seen so far, e.g. `"set pikachu 2"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[async_trait::async_trait]
impl RemoteInventory for MemoryRemote {
    async fn fetch_player(&self, id: PlayerId) -> Result<PlayerDto, RemoteError> {
        let backend = self.lock();
        if backend.fail_fetch {
            return Err(RemoteError::Request("player fetch unavailable".into()));
        }
        backend.player(id)
    }

    async fn update_resources(
        &self,
        id: PlayerId,
        update: ResourcesUpdate,
    ) -> Result<PlayerDto, RemoteError> {
        let mut backend = self.lock();
        if backend.fail_resources {
            return Err(RemoteError::Status {
                status: 503,
                message: "resources unavailable".into(),
            });
        }
        let record = backend.record_mut(id)?;
        if let Some(pokeballs) = update.pokeballs {
            record.pokeballs = pokeballs;
        }
        if let Some(berries) = update.berries {
            record.berries = berries;
        }
        backend.calls.push(format!(
            "resources {} {}",
            update.pokeballs.map_or("-".to_string(), |v| v.to_string()),
            update.berries.map_or("-".to_string(), |v| v.to_string()),
        ));
        backend.player(id)
    }

    async fn update_pokedex(
        &self,
        id: PlayerId,
        update: PokedexUpdate,
    ) -> Result<PlayerDto, RemoteError> {
        let mut backend = self.lock();
        let name = update.pokemon.name.clone();
        if backend.fail_creatures.contains(&name) {
            return Err(RemoteError::Status {
                status: 500,
                message: format!("failed to update {name}"),
            });
        }
        let record = backend.record_mut(id)?;
        match update.action {
            PokedexAction::Add => {
                record
                    .creatures
                    .entry(name.clone())
                    .and_modify(|creature| creature.quantity += 1)
                    .or_insert_with(|| Creature {
                        quantity: update.pokemon.quantity.max(1),
                        ..update.pokemon.clone()
                    });
            }
            PokedexAction::Remove => {
                let creature = record
                    .creatures
                    .get_mut(&name)
                    .ok_or_else(|| RemoteError::MissingCreature { name: name.clone() })?;
                if creature.quantity > 1 {
                    creature.quantity -= 1;
                } else {
                    record.creatures.remove(&name);
                }
            }
            PokedexAction::Set => {
                if update.pokemon.quantity == 0 {
                    record.creatures.remove(&name);
                } else {
                    record.creatures.insert(name.clone(), update.pokemon.clone());
                }
            }
        }
        backend.calls.push(format!(
            "{} {} {}",
            update.action.label(),
            name,
            update.pokemon.quantity
        ));
        backend.player(id)
    }

    async fn list_creatures(&self) -> Result<Vec<Species>, RemoteError> {
        Ok(self.lock().catalog.clone())
    }

    async fn random_creature(&self) -> Result<Species, RemoteError> {
        let mut backend = self.lock();
        if backend.catalog.is_empty() {
            return Err(RemoteError::Request("catalog is empty".into()));
        }
        let idx = backend.next_random % backend.catalog.len();
        backend.next_random += 1;
        Ok(backend.catalog[idx].clone())
    }
}
