//! Scenario configuration.
//!
//! A scenario lists the level landmarks, the monsters to spawn and a
//! scripted player. It is loaded from a TOML file; a missing file falls
//! back to the built-in manor scenario.

use std::fs;
use std::path::Path;

use glam::Vec3;
use lurk_ai::{AiResult, Archetype, ArchetypeConfig, Level};
use lurk_common::{LurkError, LurkResult, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default scenario file name.
pub const SCENARIO_FILE: &str = "lurk.toml";

/// Built-in scenario used when no file is present.
const DEFAULT_SCENARIO: &str = include_str!("../scenarios/manor.toml");

/// A full headless run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Schema version the file was written against
    pub version: SchemaVersion,
    /// Base seed; each monster gets `seed + index`
    pub seed: u64,
    /// Frame ticks to run
    pub ticks: u32,
    /// Ticks per simulated second
    pub tick_rate: u32,
    /// End the run as soon as a monster catches the player
    pub stop_on_catch: bool,
    /// Named way-points
    pub way_points: Vec<WayPointSpec>,
    /// Sleep point positions
    pub sleep_points: Vec<Vec3>,
    /// Static sight blockers
    pub obstacles: Vec<ObstacleSpec>,
    /// Monsters to spawn
    pub monsters: Vec<MonsterSpec>,
    /// Scripted player
    pub player: PlayerScript,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            version: SchemaVersion::SCENARIO,
            seed: 1,
            ticks: 1800,
            tick_rate: 30,
            stop_on_catch: true,
            way_points: Vec::new(),
            sleep_points: Vec::new(),
            obstacles: Vec::new(),
            monsters: Vec::new(),
            player: PlayerScript::default(),
        }
    }
}

/// A named way-point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WayPointSpec {
    /// Unique name
    pub name: String,
    /// World position
    pub position: Vec3,
}

/// A sphere that blocks sight and counts as cover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

/// One monster to spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterSpec {
    /// Spawn position
    pub position: Vec3,
    /// Preset to use when `config` is absent
    #[serde(default)]
    pub archetype: Option<Archetype>,
    /// Full custom description
    #[serde(default)]
    pub config: Option<ArchetypeConfig>,
}

impl MonsterSpec {
    /// Resolves the archetype description.
    pub fn resolve(&self) -> LurkResult<ArchetypeConfig> {
        match (&self.config, self.archetype) {
            (Some(config), _) => Ok(config.clone()),
            (None, Some(archetype)) => Ok(archetype.config()),
            (None, None) => Err(LurkError::Config(
                "monster needs either an archetype or a config".into(),
            )),
        }
    }
}

/// Scripted player movement and actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerScript {
    /// Loop of positions walked in order
    pub route: Vec<Vec3>,
    /// Walking speed
    pub speed: f32,
    /// Flashlight reach
    pub flashlight_range: f32,
    /// Seconds windows `[start, end]` during which the flashlight is on
    pub flashlight: Vec<(f32, f32)>,
    /// Seconds at which the camera flashes
    pub flashes: Vec<f32>,
    /// Seconds between footsteps while walking; 0 disables
    pub footstep_interval: f32,
    /// Footstep loudness
    pub footstep_loudness: f32,
}

impl Default for PlayerScript {
    fn default() -> Self {
        Self {
            route: vec![Vec3::ZERO],
            speed: 2.0,
            flashlight_range: 15.0,
            flashlight: Vec::new(),
            flashes: Vec::new(),
            footstep_interval: 0.6,
            footstep_loudness: 1.0,
        }
    }
}

impl ScenarioConfig {
    /// Loads a scenario, falling back to the built-in one if the file is
    /// missing.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> LurkResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Scenario file not found, using the built-in manor");
            return Self::builtin();
        }
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        info!("Loaded scenario from {}", path.display());
        Ok(config)
    }

    /// The built-in scenario.
    pub fn builtin() -> LurkResult<Self> {
        Self::parse(DEFAULT_SCENARIO)
    }

    /// Parses and checks scenario text.
    pub fn parse(contents: &str) -> LurkResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| LurkError::Parse(e.to_string()))?;
        SchemaVersion::SCENARIO.ensure_can_read(&config.version)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects scenarios that cannot run.
    pub fn validate(&self) -> LurkResult<()> {
        if self.tick_rate == 0 {
            return Err(LurkError::Config("tick_rate must be positive".into()));
        }
        if self.monsters.is_empty() {
            return Err(LurkError::Config("scenario spawns no monsters".into()));
        }
        if self.player.route.is_empty() {
            return Err(LurkError::Config("player route is empty".into()));
        }
        if self.player.speed < 0.0 {
            return Err(LurkError::Config("player speed must not be negative".into()));
        }
        for monster in &self.monsters {
            monster.resolve()?;
        }
        Ok(())
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Builds the level registries.
    pub fn build_level(&self) -> AiResult<Level> {
        let mut level = Level::new();
        for wp in &self.way_points {
            level.way_points.register(wp.name.clone(), wp.position)?;
        }
        for position in &self.sleep_points {
            level.sleep_points.register(*position);
        }
        Ok(level)
    }
}
