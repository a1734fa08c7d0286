use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, StepOutcome};
use crate::config::MovementConfig;
use crate::geometry::{Point, Size};
use crate::input::InputSnapshot;
use crate::map::WorldMap;
use crate::reveal::ViewMode;
use crate::rng::RandomSource;

/// Result of one loop tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameResult {
    pub step: Option<StepOutcome>,
    /// Position (and revealed areas) should be persisted this frame.
    pub checkpoint: bool,
    /// The loop went idle after this frame.
    pub stopped: bool,
}

impl FrameResult {
    fn skipped() -> Self {
        Self {
            step: None,
            checkpoint: false,
            stopped: false,
        }
    }
}

/// Per-frame driver: runs only while a direction is held.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GameLoop {
    running: bool,
    frame_counter: u64,
    checkpoint_every: u64,
}

impl GameLoop {
    pub fn new(checkpoint_every: u64) -> Self {
        Self {
            running: false,
            frame_counter: 0,
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Returns true if the loop was idle.
    pub fn start(&mut self) -> bool {
        let was_idle = !self.running;
        self.running = true;
        was_idle
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.frame_counter = 0;
    }

    pub fn tick(
        &mut self,
        actor: &mut Actor,
        input: &InputSnapshot,
        now_ms: u64,
        world: &WorldMap,
        rules: &MovementConfig,
        rng: &mut impl RandomSource,
    ) -> FrameResult {
        if !self.running {
            return FrameResult::skipped();
        }

        let step = actor.update(input, now_ms, world, rules, rng);
        self.frame_counter += 1;
        let checkpoint = self.frame_counter % self.checkpoint_every == 0;

        let stopped = !input.any_held() || step.encounter.is_some();
        if stopped {
            self.stop();
        }

        FrameResult {
            step: Some(step),
            checkpoint,
            stopped,
        }
    }
}

/// Top-left of the visible world window: pinned to the origin in full view,
/// centered on the actor in fog view.
pub fn camera_origin(mode: ViewMode, actor: &Actor, viewport: Size) -> Point {
    match mode {
        ViewMode::Full => Point::default(),
        ViewMode::Fog => Point::new(
            actor.position.x - viewport.width / 2.0,
            actor.position.y - viewport.height / 2.0,
        ),
    }
}
