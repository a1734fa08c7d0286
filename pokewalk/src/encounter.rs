use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::capture::{CaptureAttemptBonus, Rewards, ThrowResult};
use crate::creature::Species;
use crate::zones::ZoneCategory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum EncounterStage {
    /// Waiting for the creature draw.
    Loading,
    Ready,
    Throwing { until_ms: u64 },
    Caught { rewards: Rewards },
    Escaped { until_ms: u64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MenuItem {
    #[default]
    Ball,
    Berry,
    Run,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::Ball, MenuItem::Berry, MenuItem::Run];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Ball => "Ball",
            MenuItem::Berry => "Berry",
            MenuItem::Run => "Run",
        }
    }

    fn index(self) -> usize {
        match self {
            MenuItem::Ball => 0,
            MenuItem::Berry => 1,
            MenuItem::Run => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Timer transitions reported by `Encounter::advance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterTimer {
    ThrowLanded,
    Recovered,
}

/// One modal encounter. The capture bonus lives here so that every encounter
/// starts from zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Encounter {
    pub zone: ZoneCategory,
    pub creature: Option<Species>,
    pub stage: EncounterStage,
    pub selected: MenuItem,
    pub bonus: CaptureAttemptBonus,
    pub throws: u32,
    pub last_throw: Option<ThrowResult>,
}

impl Encounter {
    pub fn new(zone: ZoneCategory) -> Self {
        Self {
            zone,
            creature: None,
            stage: EncounterStage::Loading,
            selected: MenuItem::Ball,
            bonus: CaptureAttemptBonus::default(),
            throws: 0,
            last_throw: None,
        }
    }

    pub fn appear(&mut self, species: Species) {
        tracing::debug!(creature = %species.name, zone = self.zone.label(), "creature appeared");
        self.creature = Some(species);
        self.stage = EncounterStage::Ready;
    }

    pub fn is_ready(&self) -> bool {
        self.stage == EncounterStage::Ready
    }

    pub fn is_caught(&self) -> bool {
        matches!(self.stage, EncounterStage::Caught { .. })
    }

    pub fn select_next(&mut self) {
        self.selected = self.selected.next();
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.prev();
    }

    /// Starts a throw. The caller has already spent the pokeball.
    pub fn begin_throw(&mut self, now_ms: u64, delay_ms: u64) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.throws += 1;
        self.stage = EncounterStage::Throwing {
            until_ms: now_ms + delay_ms,
        };
        true
    }

    pub fn feed_berry(&mut self, increment: f64, cap: f64) -> f64 {
        self.bonus.add(increment, cap)
    }

    pub fn land_throw(&mut self, result: ThrowResult, rewards: Rewards, now_ms: u64, recover_ms: u64) {
        self.last_throw = Some(result);
        self.stage = if result.caught {
            EncounterStage::Caught { rewards }
        } else {
            EncounterStage::Escaped {
                until_ms: now_ms + recover_ms,
            }
        };
    }

    /// Moves timed stages forward.
    pub fn advance(&mut self, now_ms: u64) -> Option<EncounterTimer> {
        match self.stage {
            EncounterStage::Throwing { until_ms } if now_ms >= until_ms => {
                Some(EncounterTimer::ThrowLanded)
            }
            EncounterStage::Escaped { until_ms } if now_ms >= until_ms => {
                self.stage = EncounterStage::Ready;
                Some(EncounterTimer::Recovered)
            }
            _ => None,
        }
    }
}
