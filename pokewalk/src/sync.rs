use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::creature::Creature;
use crate::inventory::Inventory;
use crate::remote::{
    PlayerId, PokedexAction, PokedexUpdate, RemoteError, RemoteInventory, ResourcesUpdate,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SyncFailure {
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SyncReport {
    pub pokeballs: u32,
    pub berries: u32,
    /// Creatures written with their exact local quantity.
    pub set: Vec<String>,
    /// Remote-only creatures and how many remove calls were sent for each.
    pub removed: Vec<(String, u32)>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "synced {} creatures, {} balls, {} berries",
            self.set.len(),
            self.pokeballs,
            self.berries
        );
        if !self.removed.is_empty() {
            text.push_str(&format!(", removed {}", self.removed.len()));
        }
        if !self.failed.is_empty() {
            text.push_str(&format!(", {} failed", self.failed.len()));
        }
        text
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("failed to update resources: {0}")]
    Resources(#[source] RemoteError),
    #[error("failed to fetch remote pokedex: {0}")]
    Fetch(#[source] RemoteError),
}

impl SyncError {
    /// The bound account no longer exists remotely.
    pub fn is_stale_account(&self) -> bool {
        match self {
            SyncError::Resources(error) | SyncError::Fetch(error) => error.is_not_found(),
        }
    }
}

/// Pushes the local inventory to the remote store. Local is authoritative and
/// is never modified.
pub async fn sync(
    remote: &dyn RemoteInventory,
    player_id: PlayerId,
    local: &Inventory,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport {
        pokeballs: local.pokeballs,
        berries: local.berries,
        ..SyncReport::default()
    };

    remote
        .update_resources(
            player_id,
            ResourcesUpdate::absolute(local.pokeballs, local.berries),
        )
        .await
        .map_err(SyncError::Resources)?;

    // The resources reply may hold a pokedex summary with no creature list.
    let remote_creatures = remote
        .fetch_player(player_id)
        .await
        .map_err(SyncError::Fetch)?
        .pokedex
        .map(|pokedex| pokedex.captured_pokemons)
        .unwrap_or_default();

    for creature in local.creatures.values() {
        let update = PokedexUpdate {
            pokemon: creature.clone(),
            action: PokedexAction::Set,
        };
        match remote.update_pokedex(player_id, update).await {
            Ok(_) => report.set.push(creature.name.clone()),
            Err(error) => record_failure(&mut report, &creature.name, &error),
        }
    }

    for stale in remote_creatures
        .iter()
        .filter(|creature| local.creature(&creature.name).is_none())
    {
        let calls = remove_all(remote, player_id, stale, &mut report).await;
        if calls > 0 {
            report.removed.push((stale.name.clone(), calls));
        }
    }

    tracing::info!(
        player_id,
        set = report.set.len(),
        removed = report.removed.len(),
        failed = report.failed.len(),
        "sync finished"
    );
    Ok(report)
}

/// `remove` only decrements remotely, so one call per remote unit.
async fn remove_all(
    remote: &dyn RemoteInventory,
    player_id: PlayerId,
    creature: &Creature,
    report: &mut SyncReport,
) -> u32 {
    let mut calls = 0;
    for _ in 0..creature.quantity.max(1) {
        let update = PokedexUpdate {
            pokemon: creature.clone(),
            action: PokedexAction::Remove,
        };
        match remote.update_pokedex(player_id, update).await {
            Ok(_) => calls += 1,
            Err(error) => {
                record_failure(report, &creature.name, &error);
                break;
            }
        }
    }
    calls
}

fn record_failure(report: &mut SyncReport, name: &str, error: &RemoteError) {
    tracing::warn!(creature = name, %error, "skipping creature during sync");
    report.failed.push(SyncFailure {
        name: name.to_string(),
        error: error.to_string(),
    });
}
