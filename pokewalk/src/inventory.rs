use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::InventoryCache;
use crate::capture::{roll_release_rewards, Rewards};
use crate::config::CaptureConfig;
use crate::creature::{Creature, Species};
use crate::rng::RandomSource;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Inventory {
    pub pokeballs: u32,
    pub berries: u32,
    /// Keyed by creature name; every record has quantity >= 1.
    #[serde(default)]
    pub creatures: BTreeMap<String, Creature>,
}

impl Inventory {
    pub fn new(pokeballs: u32, berries: u32) -> Self {
        Self {
            pokeballs,
            berries,
            creatures: BTreeMap::new(),
        }
    }

    pub fn creature(&self, name: &str) -> Option<&Creature> {
        self.creatures.get(name)
    }

    pub fn quantity(&self, name: &str) -> u32 {
        self.creature(name).map_or(0, |creature| creature.quantity)
    }

    /// Distinct species held.
    pub fn total_captured(&self) -> usize {
        self.creatures.len()
    }

    pub fn total_quantity(&self) -> u32 {
        self.creatures.values().map(|creature| creature.quantity).sum()
    }

    /// Adds one of `species` and returns the new quantity.
    pub fn add_creature(&mut self, species: &Species) -> u32 {
        let record = self
            .creatures
            .entry(species.name.clone())
            .and_modify(|creature| creature.quantity += 1)
            .or_insert_with(|| Creature::from_species(species));
        record.quantity
    }

    /// Removes one of `name`. Returns the remaining quantity, or `None` if absent.
    pub fn remove_one(&mut self, name: &str) -> Option<u32> {
        let creature = self.creatures.get_mut(name)?;
        if creature.quantity > 1 {
            creature.quantity -= 1;
            Some(creature.quantity)
        } else {
            self.creatures.remove(name);
            Some(0)
        }
    }

    pub fn add_rewards(&mut self, rewards: Rewards) {
        self.pokeballs = self.pokeballs.saturating_add(rewards.pokeballs);
        self.berries = self.berries.saturating_add(rewards.berries);
    }
}

/// Released creature and what the player got back for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Release {
    pub name: String,
    pub remaining: u32,
    pub rewards: Rewards,
}

/// Owns the inventory for the bound cache key and writes every mutation through
/// to the cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InventoryStore<C> {
    key: String,
    inventory: Inventory,
    starting: Rewards,
    cache: C,
}

impl<C: InventoryCache> InventoryStore<C> {
    /// Opens `key`, starting from `starting` resources when nothing is cached.
    pub fn open(cache: C, key: impl Into<String>, starting: Rewards) -> Self {
        let key = key.into();
        let inventory = load_or_fresh(&cache, &key, starting);
        Self {
            key,
            inventory,
            starting,
            cache,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Switches to another cache key. The previous inventory stays cached under its key.
    pub fn bind(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if key == self.key {
            return false;
        }
        self.inventory = load_or_fresh(&self.cache, &key, self.starting);
        tracing::info!(key = %key, creatures = self.inventory.total_captured(), "inventory bound");
        self.key = key;
        true
    }

    pub fn capture(&mut self, species: &Species) -> u32 {
        let quantity = self.inventory.add_creature(species);
        self.persist();
        quantity
    }

    pub fn release(
        &mut self,
        name: &str,
        config: &CaptureConfig,
        rng: &mut impl RandomSource,
    ) -> Option<Release> {
        let remaining = self.inventory.remove_one(name)?;
        let rewards = roll_release_rewards(config, rng);
        self.inventory.add_rewards(rewards);
        self.persist();
        Some(Release {
            name: name.to_string(),
            remaining,
            rewards,
        })
    }

    /// Spends one pokeball; false when there is none left.
    pub fn use_pokeball(&mut self) -> bool {
        if self.inventory.pokeballs == 0 {
            return false;
        }
        self.inventory.pokeballs -= 1;
        self.persist();
        true
    }

    pub fn use_berry(&mut self) -> bool {
        if self.inventory.berries == 0 {
            return false;
        }
        self.inventory.berries -= 1;
        self.persist();
        true
    }

    pub fn add_rewards(&mut self, rewards: Rewards) {
        if rewards.is_empty() {
            return;
        }
        self.inventory.add_rewards(rewards);
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(error) = self.cache.store(&self.key, &self.inventory) {
            tracing::warn!(key = %self.key, %error, "failed to write inventory cache");
        }
    }
}

fn load_or_fresh<C: InventoryCache>(cache: &C, key: &str, starting: Rewards) -> Inventory {
    match cache.load(key) {
        Ok(Some(inventory)) => inventory,
        Ok(None) => Inventory::new(starting.pokeballs, starting.berries),
        Err(error) => {
            tracing::warn!(key, %error, "discarding unreadable inventory cache");
            Inventory::new(starting.pokeballs, starting.berries)
        }
    }
}
