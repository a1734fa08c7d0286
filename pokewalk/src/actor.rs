use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::MovementConfig;
use crate::geometry::{Point, Rect, Size};
use crate::input::{Direction, InputSnapshot};
use crate::map::WorldMap;
use crate::rng::RandomSource;
use crate::zones::ZoneCategory;

/// Size at which the sprite frame is drawn 1:1.
const REFERENCE_SIZE: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ActorState {
    Idle,
    Moving(Direction),
}

/// What one `Actor::update` did.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepOutcome {
    pub state: ActorState,
    pub moved: bool,
    pub blocked: bool,
    pub zone: Option<ZoneCategory>,
    pub encounter: Option<ZoneCategory>,
}

impl StepOutcome {
    fn idle() -> Self {
        Self {
            state: ActorState::Idle,
            moved: false,
            blocked: false,
            zone: None,
            encounter: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Actor {
    pub position: Point,
    pub size: f64,
    pub facing: Direction,
    /// Animation frame, always 0, 1 or 2.
    pub frame: u8,
    pub in_encounter: bool,
    frame_count: u64,
    last_frame_ms: u64,
}

impl Actor {
    pub fn new(position: Point, size: f64) -> Self {
        Self {
            position,
            size,
            facing: Direction::Down,
            frame: 0,
            in_encounter: false,
            frame_count: 0,
            last_frame_ms: 0,
        }
    }

    /// Starts centered in the viewport.
    pub fn centered(viewport: Size, size: f64) -> Self {
        Self::new(
            Point::new(
                (viewport.width - size) / 2.0,
                (viewport.height - size) / 2.0,
            ),
            size,
        )
    }

    pub fn scale(&self) -> f64 {
        self.size / REFERENCE_SIZE
    }

    pub fn speed(&self, base_speed: f64) -> f64 {
        (self.scale() * base_speed).max(1.0)
    }

    pub fn draw_size(&self, sprite_frame: Size) -> Size {
        sprite_frame.scaled(self.scale())
    }

    pub fn rect(&self, sprite_frame: Size) -> Rect {
        Rect::at(self.position, self.draw_size(sprite_frame))
    }

    /// Advances one frame: resolve direction, move unless blocked, roll for an
    /// encounter when the committed move lands in a zone, and animate.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        now_ms: u64,
        world: &WorldMap,
        rules: &MovementConfig,
        rng: &mut impl RandomSource,
    ) -> StepOutcome {
        let Some(direction) = input.direction() else {
            self.frame = 0;
            return StepOutcome::idle();
        };

        self.facing = direction;
        let mut outcome = StepOutcome {
            state: ActorState::Moving(direction),
            ..StepOutcome::idle()
        };

        let speed = self.speed(rules.base_speed);
        let (dx, dy) = direction.delta();
        let candidate = Point::new(self.position.x + dx * speed, self.position.y + dy * speed);
        let candidate_rect = Rect::at(candidate, self.draw_size(rules.sprite_frame));

        if !within(&candidate_rect, world.layout.viewport)
            || world.collisions.is_blocked(&candidate_rect)
        {
            outcome.blocked = true;
        } else {
            self.position = candidate;
            outcome.moved = true;
            outcome.zone = world.zones.zone_at(&candidate_rect).map(|zone| zone.category);
            if let Some(category) = outcome.zone {
                let roll = rng.range_inclusive(0, rules.encounter_roll_max);
                if roll > rules.encounter_threshold {
                    self.in_encounter = true;
                    outcome.encounter = Some(category);
                }
            }
        }

        if now_ms.saturating_sub(self.last_frame_ms) > rules.frame_interval_ms {
            self.frame_count += 1;
            self.frame = (self.frame_count % 3) as u8;
            self.last_frame_ms = now_ms;
        }

        outcome
    }

    /// Clamps a saved position into the viewport, allowing one actor size of slack.
    /// Out-of-range or missing positions fall back to the center.
    pub fn resume(viewport: Size, size: f64, saved: Option<Point>) -> Self {
        let Some(saved) = saved else {
            return Self::centered(viewport, size);
        };
        let in_range = saved.x >= -size
            && saved.x <= viewport.width + size
            && saved.y >= -size
            && saved.y <= viewport.height + size;
        if !in_range || !saved.x.is_finite() || !saved.y.is_finite() {
            return Self::centered(viewport, size);
        }
        let clamped = Point::new(
            saved.x.clamp(0.0, (viewport.width - size).max(0.0)),
            saved.y.clamp(0.0, (viewport.height - size).max(0.0)),
        );
        Self::new(clamped, size)
    }
}

fn within(rect: &Rect, viewport: Size) -> bool {
    rect.x >= 0.0
        && rect.y >= 0.0
        && rect.x + rect.width <= viewport.width
        && rect.y + rect.height <= viewport.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;
    use tui_map::core::{MapSize, TileLayer};

    /// 10x10 world of 10-unit cells: a wall column at x=5, a grass row at y=8.
    fn world() -> WorldMap {
        let size = MapSize::new(10, 10);
        let mut collisions = TileLayer::empty("c", size);
        for row in 0..10 {
            collisions.set(5, row, 1);
        }
        let mut zones = TileLayer::empty("z", size);
        for col in 0..5 {
            zones.set(col, 8, 1);
        }
        WorldMap::from_layers("test", &collisions, &zones, Size::new(100.0, 100.0))
            .expect("world")
    }

    fn rules() -> MovementConfig {
        MovementConfig {
            base_speed: 1.0,
            sprite_frame: Size::new(8.0, 8.0),
            ..MovementConfig::default()
        }
    }

    #[test]
    fn speed_scales_with_size_but_never_below_one() {
        assert_eq!(Actor::new(Point::default(), 100.0).speed(1.5), 3.0);
        assert_eq!(Actor::new(Point::default(), 10.0).speed(1.0), 1.0);
    }

    #[test]
    fn free_move_commits_displacement() {
        let mut actor = Actor::new(Point::new(10.0, 10.0), 50.0);
        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Right),
            0,
            &world(),
            &rules(),
            &mut ScriptedRolls::default(),
        );

        assert!(outcome.moved);
        assert_eq!(outcome.state, ActorState::Moving(Direction::Right));
        assert_eq!(actor.position, Point::new(11.0, 10.0));
        assert_eq!(actor.facing, Direction::Right);
    }

    #[test]
    fn blocked_move_keeps_exact_position() {
        let mut actor = Actor::new(Point::new(41.3 + 0.1 + 0.2, 10.000_000_000_000_002), 50.0);
        let before = actor.position;

        // Wall cell starts at x=50; the actor's right edge crosses it.
        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Right),
            0,
            &world(),
            &rules(),
            &mut ScriptedRolls::default(),
        );

        assert!(outcome.blocked);
        assert!(!outcome.moved);
        assert_eq!(actor.position.x.to_bits(), before.x.to_bits());
        assert_eq!(actor.position.y.to_bits(), before.y.to_bits());
    }

    #[test]
    fn collision_uses_scaled_draw_size() {
        // Size 100 doubles the 8x8 frame: the candidate spans 35..51 and clips the
        // wall at x=50, which the unscaled frame (35..43) would miss.
        let mut actor = Actor::new(Point::new(33.0, 10.0), 100.0);
        assert_eq!(actor.draw_size(rules().sprite_frame), Size::new(16.0, 16.0));

        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Right),
            0,
            &world(),
            &rules(),
            &mut ScriptedRolls::default(),
        );
        assert!(outcome.blocked);
        assert_eq!(actor.position, Point::new(33.0, 10.0));

        let mut small = Actor::new(Point::new(33.0, 10.0), 50.0);
        let outcome = small.update(
            &InputSnapshot::holding(Direction::Right),
            0,
            &world(),
            &rules(),
            &mut ScriptedRolls::default(),
        );
        assert!(outcome.moved);
    }

    #[test]
    fn leaving_the_viewport_is_blocked() {
        let mut actor = Actor::new(Point::new(0.5, 10.0), 50.0);
        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Left),
            0,
            &world(),
            &rules(),
            &mut ScriptedRolls::default(),
        );
        assert!(outcome.blocked);
        assert_eq!(actor.position, Point::new(0.5, 10.0));
    }

    #[test]
    fn encounter_needs_roll_above_threshold() {
        let world = world();
        let rules = rules();
        let mut actor = Actor::new(Point::new(10.0, 79.0), 50.0);

        // 0.99 * 101 floors to 99: not enough.
        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Down),
            0,
            &world,
            &rules,
            &mut ScriptedRolls::new([0.99]),
        );
        assert_eq!(outcome.zone, Some(ZoneCategory::Common));
        assert_eq!(outcome.encounter, None);
        assert!(!actor.in_encounter);

        // 0.995 * 101 floors to 100.
        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Down),
            0,
            &world,
            &rules,
            &mut ScriptedRolls::new([0.995]),
        );
        assert_eq!(outcome.encounter, Some(ZoneCategory::Common));
        assert!(actor.in_encounter);
    }

    #[test]
    fn no_roll_outside_zones() {
        let mut actor = Actor::new(Point::new(10.0, 10.0), 50.0);
        let mut rng = ScriptedRolls::new([0.999]);
        let outcome = actor.update(
            &InputSnapshot::holding(Direction::Down),
            0,
            &world(),
            &rules(),
            &mut rng,
        );
        assert_eq!(outcome.zone, None);
        assert_eq!(rng.remaining(), 1);
    }

    #[test]
    fn animation_is_throttled_and_resets_when_idle() {
        let world = world();
        let rules = rules();
        let mut actor = Actor::new(Point::new(10.0, 10.0), 50.0);
        let mut rng = ScriptedRolls::default();
        let down = InputSnapshot::holding(Direction::Down);

        actor.update(&down, 150, &world, &rules, &mut rng);
        assert_eq!(actor.frame, 1);
        actor.update(&down, 200, &world, &rules, &mut rng);
        assert_eq!(actor.frame, 1);
        actor.update(&down, 260, &world, &rules, &mut rng);
        assert_eq!(actor.frame, 2);
        actor.update(&down, 400, &world, &rules, &mut rng);
        assert_eq!(actor.frame, 0);
        actor.update(&down, 600, &world, &rules, &mut rng);
        assert_eq!(actor.frame, 1);

        let outcome = actor.update(&InputSnapshot::idle(), 700, &world, &rules, &mut rng);
        assert_eq!(outcome.state, ActorState::Idle);
        assert_eq!(actor.frame, 0);
    }

    #[test]
    fn resume_clamps_or_recenters() {
        let viewport = Size::new(100.0, 100.0);
        let near = Actor::resume(viewport, 10.0, Some(Point::new(-5.0, 95.0)));
        assert_eq!(near.position, Point::new(0.0, 90.0));

        let far = Actor::resume(viewport, 10.0, Some(Point::new(500.0, 10.0)));
        assert_eq!(far.position, Point::new(45.0, 45.0));

        let fresh = Actor::resume(viewport, 10.0, None);
        assert_eq!(fresh.position, Point::new(45.0, 45.0));
    }
}
