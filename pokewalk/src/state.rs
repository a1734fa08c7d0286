use std::collections::VecDeque;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};
use tui_map::core::MapSize;

use crate::actor::Actor;
use crate::cache::SessionCache;
use crate::capture::Rewards;
use crate::config::GameConfig;
use crate::creature::{Creature, Species};
use crate::encounter::Encounter;
use crate::game_loop::GameLoop;
use crate::geometry::Point;
use crate::input::InputTracker;
use crate::inventory::InventoryStore;
use crate::map::WorldMap;
use crate::reveal::{RevealedAreas, ViewMode};
use crate::rng::SeededRng;
use crate::session::Account;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Screen {
    #[default]
    Walk,
    Pokedex,
    Encounter,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CatalogStatus {
    #[default]
    Loading,
    Remote,
    /// Remote catalog unavailable; the configured roster is in use.
    Fallback,
    /// Remote listing was empty; each encounter asks the remote for one random creature.
    RandomOnly,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SyncStatus {
    #[default]
    Idle,
    Running,
    Done(String),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notice {
    pub text: String,
    pub until_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub config: GameConfig,
    pub world: WorldMap,
    pub actor: Actor,
    pub input: InputTracker,
    pub game_loop: GameLoop,
    pub view: ViewMode,
    pub revealed: RevealedAreas,
    pub screen: Screen,
    pub encounter: Option<Encounter>,
    #[serde(default)]
    pub pokedex_selected: usize,
    pub inventory: InventoryStore<SessionCache>,
    pub account: Account,
    pub catalog: Vec<Species>,
    pub catalog_status: CatalogStatus,
    pub sync: SyncStatus,
    #[serde(default)]
    pub notices: VecDeque<Notice>,
    pub rng: SeededRng,
    pub now_ms: u64,
}

impl Default for AppState {
    fn default() -> Self {
        let config = GameConfig::default();
        let size = MapSize::new(config.map.columns, config.map.rows);
        let world = WorldMap::open("blank", size, config.viewport);
        Self::new(
            config,
            world,
            SessionCache::default(),
            Account::Guest,
            None,
            SeededRng::default(),
        )
    }
}

impl AppState {
    pub fn new(
        config: GameConfig,
        world: WorldMap,
        cache: SessionCache,
        account: Account,
        saved_position: Option<Point>,
        rng: SeededRng,
    ) -> Self {
        let starting = Rewards {
            pokeballs: config.starting_pokeballs,
            berries: config.starting_berries,
        };
        let actor = Actor::resume(
            world.layout.viewport,
            world.layout.actor_size(),
            saved_position,
        );
        Self {
            terminal_size: (80, 24),
            game_loop: GameLoop::new(config.checkpoint_every),
            view: ViewMode::Full,
            revealed: RevealedAreas::new(config.reveal_grid),
            screen: Screen::Walk,
            encounter: None,
            pokedex_selected: 0,
            inventory: InventoryStore::open(cache, account.cache_key(), starting),
            account,
            catalog: Vec::new(),
            catalog_status: CatalogStatus::Loading,
            sync: SyncStatus::Idle,
            notices: VecDeque::new(),
            input: InputTracker::new(),
            actor,
            world,
            config,
            rng,
            now_ms: 0,
        }
    }

    pub fn with_view(mut self, view: ViewMode, revealed: RevealedAreas) -> Self {
        self.view = view;
        self.revealed = revealed;
        self
    }

    pub fn reveal_radius(&self) -> f64 {
        self.config.reveal_radius_ratio * self.world.layout.viewport.min_side()
    }

    /// Captured creatures in pokedex order.
    pub fn pokedex(&self) -> Vec<&Creature> {
        self.inventory.inventory().creatures.values().collect()
    }

    pub fn selected_creature(&self) -> Option<&Creature> {
        self.pokedex().get(self.pokedex_selected).copied()
    }

    /// Species known to the catalog, for the pokedex totals.
    pub fn total_species(&self) -> usize {
        self.catalog.len()
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(notice = %text, "notice");
        self.notices.push_back(Notice {
            text,
            until_ms: self.now_ms + self.config.notice_ms,
        });
    }

    /// Drops expired notices; returns true if any were removed.
    pub fn expire_notices(&mut self) -> bool {
        let before = self.notices.len();
        let now = self.now_ms;
        self.notices.retain(|notice| notice.until_ms > now);
        before != self.notices.len()
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let inventory = self.inventory.inventory();
        let mut sections = vec![
            DebugSection::new("Session")
                .entry("screen", ron_string(&self.screen))
                .entry("account", ron_string(&self.account))
                .entry("cache_key", ron_string(&self.inventory.key()))
                .entry("sync", ron_string(&self.sync))
                .entry("catalog", ron_string(&self.catalog_status)),
            DebugSection::new("Actor")
                .entry("position", ron_string(&self.actor.position))
                .entry("facing", ron_string(&self.actor.facing))
                .entry("frame", ron_string(&self.actor.frame))
                .entry("loop_running", ron_string(&self.game_loop.is_running()))
                .entry("loop_frames", ron_string(&self.game_loop.frame_counter()))
                .entry("view", ron_string(&self.view))
                .entry("revealed", ron_string(&self.revealed.len())),
            DebugSection::new("Inventory")
                .entry("pokeballs", ron_string(&inventory.pokeballs))
                .entry("berries", ron_string(&inventory.berries))
                .entry("species", ron_string(&inventory.total_captured())),
        ];

        if let Some(encounter) = &self.encounter {
            sections.push(
                DebugSection::new("Encounter")
                    .entry("zone", ron_string(&encounter.zone))
                    .entry(
                        "creature",
                        ron_string(&encounter.creature.as_ref().map(|c| c.name.clone())),
                    )
                    .entry("stage", ron_string(&encounter.stage))
                    .entry("bonus", ron_string(&encounter.bonus.value()))
                    .entry("throws", ron_string(&encounter.throws)),
            );
        }

        sections
    }
}
