use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::creature::Species;
use crate::input::Direction;
use crate::session::LoginOutcome;
use crate::sync::SyncReport;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    Init,
    UiTerminalResize(u16, u16),
    /// Frame clock, milliseconds since start.
    Frame {
        now_ms: u64,
    },

    // Movement
    MoveKeyDown(Direction),
    MoveKeyUp(Direction),
    ViewToggle,

    // Pokedex screen
    PokedexToggle,
    PokedexClose,
    PokedexSelect(usize),
    PokedexRelease,

    // Encounter screen
    EncounterMenuNext,
    EncounterMenuPrev,
    EncounterConfirm,
    EncounterRun,
    EncounterDismiss,

    // Catalog
    CatalogDidLoad(Vec<Species>),
    CatalogDidError(String),
    RandomCreatureDidLoad(Species),
    RandomCreatureDidError(String),

    // Account and sync
    LoginDidFinish(LoginOutcome),
    /// Manual sync.
    SyncRequest,
    /// Periodic sync; skipped while one is running or after a failure.
    SyncTick,
    SyncDidFinish(SyncReport),
    SyncDidError {
        message: String,
        stale: bool,
    },

    CheckpointDidSave,
    CheckpointDidError(String),

    Quit,
}
