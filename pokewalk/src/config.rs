use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::creature::Species;
use crate::geometry::Size;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_CONFIG_FILE: &str = "assets/config.ron";
/// Upper bound for the per-encounter berry bonus.
pub const MAX_BONUS_CAP: f64 = 0.5;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MapConfig {
    /// Directory holding `collisions.txt` and `zones.txt`, relative to the config file.
    pub dir: PathBuf,
    pub columns: u16,
    pub rows: u16,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("maps/island"),
            columns: 70,
            rows: 40,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MovementConfig {
    pub base_speed: f64,
    /// Unscaled sprite frame; the drawn and colliding rect is this times `size / 50`.
    pub sprite_frame: Size,
    pub frame_interval_ms: u64,
    pub encounter_roll_max: u32,
    pub encounter_threshold: u32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            sprite_frame: Size::new(16.0, 21.0),
            frame_interval_ms: 100,
            encounter_roll_max: 100,
            encounter_threshold: 99,
        }
    }
}

/// Pokeball reward on a successful capture. The first rule whose `below` bound
/// exceeds the remaining pokeballs applies; `None` matches everything.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RewardRule {
    pub below: Option<u32>,
    pub chance: f64,
    pub min: u32,
    pub max: u32,
}

impl RewardRule {
    pub fn applies(&self, pokeballs: u32) -> bool {
        self.below.map_or(true, |below| pokeballs < below)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CaptureConfig {
    pub berry_reward_chance: f64,
    pub berry_bonus: (f64, f64),
    pub bonus_cap: f64,
    pub reward_rules: Vec<RewardRule>,
    pub release_pokeballs: (u32, u32),
    pub release_berries: (u32, u32),
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            berry_reward_chance: 0.3,
            berry_bonus: (0.05, 0.15),
            bonus_cap: MAX_BONUS_CAP,
            reward_rules: vec![
                RewardRule {
                    below: Some(5),
                    chance: 0.9,
                    min: 2,
                    max: 5,
                },
                RewardRule {
                    below: Some(15),
                    chance: 0.7,
                    min: 1,
                    max: 4,
                },
                RewardRule {
                    below: None,
                    chance: 0.5,
                    min: 1,
                    max: 3,
                },
            ],
            release_pokeballs: (2, 10),
            release_berries: (2, 5),
        }
    }
}

impl CaptureConfig {
    pub fn reward_rule(&self, pokeballs: u32) -> Option<&RewardRule> {
        self.reward_rules.iter().find(|rule| rule.applies(pokeballs))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GameConfig {
    pub map: MapConfig,
    /// World-space size the map is fitted into.
    pub viewport: Size,
    pub movement: MovementConfig,
    pub checkpoint_every: u64,
    pub reveal_grid: f64,
    pub reveal_radius_ratio: f64,
    pub capture: CaptureConfig,
    pub throw_delay_ms: u64,
    pub escape_recover_ms: u64,
    pub roster_retry_cap: u32,
    pub starting_pokeballs: u32,
    pub starting_berries: u32,
    pub key_hold_ms: u64,
    pub notice_ms: u64,
    pub sync_interval_secs: u64,
    pub api_base_url: String,
    pub fallback_roster: Vec<Species>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            viewport: Size::new(1120.0, 640.0),
            movement: MovementConfig::default(),
            checkpoint_every: 60,
            reveal_grid: 20.0,
            reveal_radius_ratio: 0.3,
            capture: CaptureConfig::default(),
            throw_delay_ms: 2000,
            escape_recover_ms: 1000,
            roster_retry_cap: 10,
            starting_pokeballs: 30,
            starting_berries: 5,
            key_hold_ms: 550,
            notice_ms: 3000,
            sync_interval_secs: 30,
            api_base_url: DEFAULT_API_URL.to_string(),
            fallback_roster: default_roster(),
        }
    }
}

impl GameConfig {
    pub fn from_ron(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: GameConfig = ron::de::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a RON config and resolves the map directory against the file's location.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_ron(&text, path)?;
        if config.map.dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.map.dir = base.join(&config.map.dir);
        }
        Ok(config)
    }

    /// Looks for the bundled config next to the working directory, then next to the crate.
    pub fn locate_default() -> Option<PathBuf> {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        let bundled = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_FILE);
        bundled.exists().then_some(bundled)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(ConfigError::Invalid("viewport must be positive".into()));
        }
        if self.checkpoint_every == 0 {
            return Err(ConfigError::Invalid("checkpoint_every must be at least 1".into()));
        }
        if self.movement.frame_interval_ms < 100 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be at least 100".into(),
            ));
        }
        let (low, high) = self.capture.berry_bonus;
        if low < 0.0 || high < low {
            return Err(ConfigError::Invalid("berry_bonus must be an ordered range".into()));
        }
        if !(0.0..=MAX_BONUS_CAP).contains(&self.capture.bonus_cap) {
            return Err(ConfigError::Invalid(format!(
                "bonus_cap must be within 0..={MAX_BONUS_CAP}"
            )));
        }
        if self.capture.release_pokeballs.0 > self.capture.release_pokeballs.1
            || self.capture.release_berries.0 > self.capture.release_berries.1
        {
            return Err(ConfigError::Invalid("release rewards must be ordered ranges".into()));
        }
        if self.reveal_grid <= 0.0 {
            return Err(ConfigError::Invalid("reveal_grid must be positive".into()));
        }
        Ok(())
    }
}

fn default_roster() -> Vec<Species> {
    const SPRITE_BASE: &str =
        "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";
    [
        (1, "bulbasaur", &["grass", "poison"][..]),
        (4, "charmander", &["fire"][..]),
        (7, "squirtle", &["water"][..]),
        (16, "pidgey", &["normal", "flying"][..]),
        (19, "rattata", &["normal"][..]),
        (25, "pikachu", &["electric"][..]),
        (74, "geodude", &["rock", "ground"][..]),
        (92, "gastly", &["ghost", "poison"][..]),
        (95, "onix", &["rock", "ground"][..]),
        (129, "magikarp", &["water"][..]),
        (131, "lapras", &["water", "ice"][..]),
        (147, "dratini", &["dragon"][..]),
    ]
    .iter()
    .map(|(id, name, types)| Species::new(*name, format!("{SPRITE_BASE}/{id}.png"), types))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_ron_uses_defaults() {
        let config = GameConfig::from_ron("()", Path::new("inline.ron")).expect("config");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn partial_ron_overrides_fields() {
        let config = GameConfig::from_ron(
            r#"(
                starting_pokeballs: 12,
                movement: (base_speed: 2.0),
                fallback_roster: [(name: "psyduck", type: "water")],
            )"#,
            Path::new("inline.ron"),
        )
        .expect("config");

        assert_eq!(config.starting_pokeballs, 12);
        assert_eq!(config.movement.base_speed, 2.0);
        assert_eq!(config.movement.frame_interval_ms, 100);
        assert_eq!(config.fallback_roster.len(), 1);
        assert_eq!(config.fallback_roster[0].types, "water");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = GameConfig::from_ron("(checkpoint_every: 0)", Path::new("inline.ron"))
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bonus_cap_above_half_is_rejected() {
        let err = GameConfig::from_ron("(capture: (bonus_cap: 0.9))", Path::new("inline.ron"))
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("bonus_cap")));

        let negative =
            GameConfig::from_ron("(capture: (bonus_cap: -0.1))", Path::new("inline.ron"));
        assert!(negative.is_err());

        let config = GameConfig::from_ron("(capture: (bonus_cap: 0.3))", Path::new("inline.ron"))
            .expect("lower cap is fine");
        assert_eq!(config.capture.bonus_cap, 0.3);
    }

    #[test]
    fn reward_rules_pick_scarcity_tier() {
        let capture = CaptureConfig::default();
        assert_eq!(capture.reward_rule(2).map(|r| r.max), Some(5));
        assert_eq!(capture.reward_rule(10).map(|r| r.max), Some(4));
        assert_eq!(capture.reward_rule(40).map(|r| r.max), Some(3));
    }

    #[test]
    fn load_resolves_map_dir_relative_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("game.ron");
        std::fs::write(&path, r#"(map: (dir: "maps/demo"))"#).expect("write");

        let config = GameConfig::load(&path).expect("config");
        assert_eq!(config.map.dir, dir.path().join("maps/demo"));
    }

    #[test]
    fn bundled_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_FILE);
        let config = GameConfig::load(&path).expect("bundled config");
        assert_eq!(config.checkpoint_every, 60);
        assert_eq!(config.starting_pokeballs, 30);
        assert_eq!(config.starting_berries, 5);
    }
}
