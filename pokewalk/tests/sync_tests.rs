//! Reconciliation against the in-process store.

use pokewalk::capture::Rewards;
use pokewalk::creature::Species;
use pokewalk::inventory::Inventory;
use pokewalk::remote::{
    MemoryRemote, PlayerDto, PlayerId, PokedexUpdate, RemoteError, RemoteInventory,
    ResourcesUpdate,
};
use pokewalk::sync::{sync, SyncError};
use pretty_assertions::assert_eq;

const PLAYER: u64 = 7;

/// Answers resource updates with a pokedex summary that omits the creature list.
struct ShallowResources(MemoryRemote);

#[async_trait::async_trait]
impl RemoteInventory for ShallowResources {
    async fn fetch_player(&self, id: PlayerId) -> Result<PlayerDto, RemoteError> {
        self.0.fetch_player(id).await
    }

    async fn update_resources(
        &self,
        id: PlayerId,
        update: ResourcesUpdate,
    ) -> Result<PlayerDto, RemoteError> {
        let player = self.0.update_resources(id, update).await?;
        let shallow: PlayerDto = serde_json::from_value(serde_json::json!({
            "id": player.id,
            "name": player.name,
            "pokeballs": player.pokeballs,
            "berries": player.berries,
            "pokedex": {"id": 1, "totalPokemons": 2, "totalCaptured": 2},
        }))
        .map_err(|error| RemoteError::Parse(error.to_string()))?;
        Ok(shallow)
    }

    async fn update_pokedex(
        &self,
        id: PlayerId,
        update: PokedexUpdate,
    ) -> Result<PlayerDto, RemoteError> {
        self.0.update_pokedex(id, update).await
    }

    async fn list_creatures(&self) -> Result<Vec<Species>, RemoteError> {
        self.0.list_creatures().await
    }

    async fn random_creature(&self) -> Result<Species, RemoteError> {
        self.0.random_creature().await
    }
}

fn bulbasaur() -> Species {
    Species::new("bulbasaur", "1.png", &["grass", "poison"])
}

fn squirtle() -> Species {
    Species::new("squirtle", "7.png", &["water"])
}

fn local_with(entries: &[(Species, u32)]) -> Inventory {
    let mut inventory = Inventory::new(30, 5);
    for (species, quantity) in entries {
        for _ in 0..*quantity {
            inventory.add_creature(species);
        }
    }
    inventory
}

fn remote_with(entries: &[(Species, u32)]) -> MemoryRemote {
    let remote = MemoryRemote::new();
    remote.add_player(PLAYER, "Ash", 10, 1);
    for (species, quantity) in entries {
        remote.put_creature(PLAYER, species, *quantity);
    }
    remote
}

#[tokio::test]
async fn sync_sets_local_quantities_and_removes_remote_only() {
    let local = local_with(&[(bulbasaur(), 2)]);
    let remote = remote_with(&[(bulbasaur(), 1), (squirtle(), 1)]);

    let report = sync(&remote, PLAYER, &local).await.expect("sync");

    assert_eq!(report.set, vec!["bulbasaur".to_string()]);
    assert_eq!(report.removed, vec![("squirtle".to_string(), 1)]);
    assert!(report.is_clean());
    assert_eq!(remote.quantity(PLAYER, "bulbasaur"), 2);
    assert_eq!(remote.quantity(PLAYER, "squirtle"), 0);

    let player = remote.fetch_player(PLAYER).await.expect("player");
    assert_eq!(player.pokeballs, 30);
    assert_eq!(player.berries, 5);
    let pokedex = player.pokedex.expect("pokedex");
    assert_eq!(pokedex.captured_pokemons.len(), 1);
    assert_eq!(
        remote.calls(),
        vec![
            "resources 30 5".to_string(),
            "set bulbasaur 2".to_string(),
            "remove squirtle 1".to_string(),
        ]
    );
}

#[tokio::test]
async fn second_sync_changes_nothing() {
    let local = local_with(&[(bulbasaur(), 2)]);
    let remote = remote_with(&[(bulbasaur(), 1), (squirtle(), 3)]);

    sync(&remote, PLAYER, &local).await.expect("first sync");
    let after_first = remote.snapshot(PLAYER);
    remote.clear_calls();

    let report = sync(&remote, PLAYER, &local).await.expect("second sync");
    assert_eq!(remote.snapshot(PLAYER), after_first);
    assert!(report.removed.is_empty());
    assert_eq!(
        remote.calls(),
        vec!["resources 30 5".to_string(), "set bulbasaur 2".to_string()]
    );
}

#[tokio::test]
async fn multi_unit_remote_creature_is_removed_completely() {
    let local = local_with(&[]);
    let remote = remote_with(&[(squirtle(), 3)]);

    let report = sync(&remote, PLAYER, &local).await.expect("sync");
    assert_eq!(report.removed, vec![("squirtle".to_string(), 3)]);
    assert_eq!(remote.quantity(PLAYER, "squirtle"), 0);
}

#[tokio::test]
async fn resource_failure_aborts_before_creatures() {
    let local = local_with(&[(bulbasaur(), 1)]);
    let remote = remote_with(&[(squirtle(), 1)]);
    remote.fail_resources(true);

    let err = sync(&remote, PLAYER, &local).await.expect_err("aborted");
    assert!(matches!(err, SyncError::Resources(_)));
    assert!(!err.is_stale_account());
    assert!(remote.calls().is_empty());
    assert_eq!(remote.quantity(PLAYER, "squirtle"), 1);
    assert_eq!(remote.quantity(PLAYER, "bulbasaur"), 0);
}

#[tokio::test]
async fn one_failing_creature_does_not_block_the_rest() {
    let pikachu = Species::new("pikachu", "25.png", &["electric"]);
    let local = local_with(&[(bulbasaur(), 1), (pikachu.clone(), 2)]);
    let remote = remote_with(&[]);
    remote.fail_creature("bulbasaur");

    let report = sync(&remote, PLAYER, &local).await.expect("sync");
    assert!(!report.is_clean());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "bulbasaur");
    assert_eq!(report.set, vec!["pikachu".to_string()]);
    assert_eq!(remote.quantity(PLAYER, "pikachu"), 2);
    assert!(report.summary().contains("1 failed"));
}

#[tokio::test]
async fn unknown_player_is_a_stale_account() {
    let local = local_with(&[]);
    let remote = MemoryRemote::new();

    let err = sync(&remote, 404, &local).await.expect_err("stale");
    assert!(err.is_stale_account());
}

#[tokio::test]
async fn sync_never_touches_local_inventory() {
    let mut local = local_with(&[(bulbasaur(), 1)]);
    local.add_rewards(Rewards {
        pokeballs: 2,
        berries: 0,
    });
    let before = local.clone();
    let remote = remote_with(&[(squirtle(), 1)]);

    sync(&remote, PLAYER, &local).await.expect("sync");
    assert_eq!(local, before);
}

#[tokio::test]
async fn stale_creatures_are_removed_when_resources_reply_is_shallow() {
    let local = local_with(&[(bulbasaur(), 2)]);
    let remote = ShallowResources(remote_with(&[(bulbasaur(), 1), (squirtle(), 1)]));

    let report = sync(&remote, PLAYER, &local).await.expect("sync");

    assert_eq!(report.removed, vec![("squirtle".to_string(), 1)]);
    assert_eq!(remote.0.quantity(PLAYER, "squirtle"), 0);
    assert_eq!(remote.0.quantity(PLAYER, "bulbasaur"), 2);
}

#[tokio::test]
async fn failed_pokedex_read_aborts_sync() {
    let local = local_with(&[(bulbasaur(), 1)]);
    let remote = remote_with(&[]);
    remote.fail_fetch(true);

    let err = sync(&remote, PLAYER, &local).await.expect_err("aborted");
    assert!(matches!(err, SyncError::Fetch(_)));
    assert_eq!(remote.calls(), vec!["resources 30 5".to_string()]);
}

#[tokio::test]
async fn failing_remove_does_not_block_other_stale_creatures() {
    let pikachu = Species::new("pikachu", "25.png", &["electric"]);
    let local = local_with(&[(bulbasaur(), 1)]);
    let remote = remote_with(&[(squirtle(), 2), (pikachu, 3)]);
    remote.fail_creature("squirtle");

    let report = sync(&remote, PLAYER, &local).await.expect("sync");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "squirtle");
    assert_eq!(report.removed, vec![("pikachu".to_string(), 3)]);
    assert_eq!(remote.quantity(PLAYER, "pikachu"), 0);
    assert_eq!(remote.quantity(PLAYER, "squirtle"), 2);
    assert_eq!(remote.quantity(PLAYER, "bulbasaur"), 1);
}
