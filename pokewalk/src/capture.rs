use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::CaptureConfig;
use crate::creature::Species;
use crate::rng::RandomSource;
use crate::zones::ZoneCategory;

/// Accumulated berry bonus for the current encounter, clamped to `[0, cap]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptureAttemptBonus {
    value: f64,
}

impl CaptureAttemptBonus {
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Adds `amount` and returns the new clamped value.
    pub fn add(&mut self, amount: f64, cap: f64) -> f64 {
        self.value = (self.value + amount).clamp(0.0, cap.max(0.0));
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

pub fn effective_difficulty(species: &Species, bonus: f64) -> f64 {
    let tier = species.tier();
    (tier.base_difficulty() - bonus).max(tier.floor())
}

/// Chance that one throw succeeds, for display.
pub fn catch_chance(species: &Species, bonus: f64) -> f64 {
    1.0 - effective_difficulty(species, bonus)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThrowResult {
    pub caught: bool,
    pub roll: f64,
    pub difficulty: f64,
}

pub fn resolve_throw(
    species: &Species,
    bonus: &CaptureAttemptBonus,
    rng: &mut impl RandomSource,
) -> ThrowResult {
    let difficulty = effective_difficulty(species, bonus.value());
    let roll = rng.next_f64();
    ThrowResult {
        caught: roll >= difficulty,
        roll,
        difficulty,
    }
}

/// Uniform berry increment from the configured range.
pub fn berry_increment(config: &CaptureConfig, rng: &mut impl RandomSource) -> f64 {
    let (low, high) = config.berry_bonus;
    rng.uniform(low, high)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rewards {
    pub pokeballs: u32,
    pub berries: u32,
}

impl Rewards {
    pub fn is_empty(&self) -> bool {
        self.pokeballs == 0 && self.berries == 0
    }
}

/// Rolls the bonus items for a successful capture. `pokeballs_left` is the
/// count after the throw.
pub fn roll_capture_rewards(
    config: &CaptureConfig,
    pokeballs_left: u32,
    rng: &mut impl RandomSource,
) -> Rewards {
    let mut rewards = Rewards::default();
    if rng.chance(config.berry_reward_chance) {
        rewards.berries = 1;
    }
    if let Some(rule) = config.reward_rule(pokeballs_left) {
        if rng.chance(rule.chance) {
            rewards.pokeballs = rng.range_inclusive(rule.min, rule.max);
        }
    }
    rewards
}

/// Items granted for every release, whatever the remaining quantity.
pub fn roll_release_rewards(config: &CaptureConfig, rng: &mut impl RandomSource) -> Rewards {
    let (balls_low, balls_high) = config.release_pokeballs;
    let (berries_low, berries_high) = config.release_berries;
    Rewards {
        pokeballs: rng.range_inclusive(balls_low, balls_high),
        berries: rng.range_inclusive(berries_low, berries_high),
    }
}

/// Picks an encounter from `pool`, retrying up to `retry_cap` times for one the
/// zone accepts before settling for an unfiltered draw.
pub fn draw_creature(
    pool: &[Species],
    category: ZoneCategory,
    retry_cap: u32,
    rng: &mut impl RandomSource,
) -> Option<Species> {
    for _ in 0..retry_cap.max(1) {
        let candidate = &pool[rng.pick(pool.len())?];
        if category.accepts(candidate) {
            return Some(candidate.clone());
        }
    }
    tracing::debug!(
        zone = category.label(),
        retry_cap,
        "no matching creature drawn, using unfiltered draw"
    );
    rng.pick(pool.len()).map(|idx| pool[idx].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;
    use pretty_assertions::assert_eq;

    fn pikachu() -> Species {
        Species::new("pikachu", "", &["electric"])
    }

    #[test]
    fn bonus_is_clamped_and_resets() {
        let mut bonus = CaptureAttemptBonus::default();
        for _ in 0..10 {
            bonus.add(0.15, 0.5);
        }
        assert_eq!(bonus.value(), 0.5);
        bonus.reset();
        assert_eq!(bonus.value(), 0.0);
        assert_eq!(bonus.add(-1.0, 0.5), 0.0);
    }

    #[test]
    fn difficulty_never_drops_below_tier_floor() {
        let mewtwo = Species::new("mewtwo", "", &["psychic"]);
        assert!((effective_difficulty(&mewtwo, 0.5) - 0.45).abs() < 1e-9);
        assert_eq!(effective_difficulty(&pikachu(), 0.5), 0.3);
        let dratini = Species::new("dratini", "", &["dragon"]);
        assert!((effective_difficulty(&dratini, 0.1) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn throw_succeeds_when_roll_meets_difficulty() {
        let bonus = CaptureAttemptBonus::default();
        let hit = resolve_throw(&pikachu(), &bonus, &mut ScriptedRolls::new([0.7]));
        assert!(hit.caught);
        let miss = resolve_throw(&pikachu(), &bonus, &mut ScriptedRolls::new([0.69]));
        assert!(!miss.caught);
    }

    #[test]
    fn capture_rewards_follow_scarcity_rules() {
        let config = CaptureConfig::default();
        // Berry roll hits, then the "below 5" rule: chance hit, 0.99 -> 5.
        let rewards = roll_capture_rewards(&config, 3, &mut ScriptedRolls::new([0.1, 0.5, 0.99]));
        assert_eq!(rewards, Rewards { pokeballs: 5, berries: 1 });

        // Berry roll misses, default rule misses.
        let rewards = roll_capture_rewards(&config, 29, &mut ScriptedRolls::new([0.4, 0.6]));
        assert!(rewards.is_empty());
    }

    #[test]
    fn release_rewards_stay_in_range() {
        let config = CaptureConfig::default();
        let low = roll_release_rewards(&config, &mut ScriptedRolls::new([0.0, 0.0]));
        assert_eq!(low, Rewards { pokeballs: 2, berries: 2 });
        let high = roll_release_rewards(&config, &mut ScriptedRolls::new([0.999, 0.999]));
        assert_eq!(high, Rewards { pokeballs: 10, berries: 5 });
    }

    #[test]
    fn draw_prefers_zone_matches() {
        let pool = vec![
            pikachu(),
            Species::new("lapras", "", &["water", "ice"]),
        ];
        let drawn = draw_creature(
            &pool,
            ZoneCategory::Aquatic,
            10,
            &mut ScriptedRolls::new([0.1, 0.2, 0.9]),
        );
        assert_eq!(drawn.map(|s| s.name), Some("lapras".to_string()));
    }

    #[test]
    fn draw_falls_back_after_retry_cap() {
        let pool = vec![pikachu()];
        let mut rng = ScriptedRolls::default();
        let drawn = draw_creature(&pool, ZoneCategory::Aquatic, 10, &mut rng);
        assert_eq!(drawn, Some(pikachu()));
        assert_eq!(draw_creature(&[], ZoneCategory::Common, 10, &mut rng), None);
    }
}
