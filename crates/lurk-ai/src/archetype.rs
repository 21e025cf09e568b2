//! Data-driven monster archetypes.
//!
//! An [`ArchetypeConfig`] lists which behaviors a monster carries, how each
//! is tuned, which sensors it has and how it reacts to them. The three
//! shipped presets cover the roster; scenario files may define more.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityBuilder, PatrolEscalation, Reactions};
use crate::error::{AiError, AiResult};
use crate::host::{NavAgent, SimulatedAgent};
use crate::random::DurationRange;
use crate::sensors::{FieldOfView, FlashCounterConfig, FlashlightConfig, FootstepConfig};
use crate::state::StateSlot;
use crate::states::{
    CaughtPlayerState, DisappearConfig, DisappearState, FreezeConfig, FreezeState, IdleConfig,
    IdleDuration, IdleState, InvestigateConfig, InvestigateMode, InvestigateState, PatrolConfig,
    PatrolMode, PatrolState, RetreatConfig, RetreatState, SearchConfig, SearchState, SleepConfig,
    SleepState, StalkConfig, StalkState, StunConfig, StunState,
};

/// Built-in monster presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Patrols, shadows the player, flees the flashlight and vanishes
    /// under camera flashes
    Stalker,
    /// Sleeps out of sight and freezes when lit or heard
    Somnid,
    /// Harmless drifter that turns toward noises
    Wanderer,
}

impl Archetype {
    /// Every preset.
    pub const ALL: [Self; 3] = [Self::Stalker, Self::Somnid, Self::Wanderer];

    /// Preset configuration.
    #[must_use]
    pub fn config(self) -> ArchetypeConfig {
        match self {
            Self::Stalker => ArchetypeConfig {
                name: "stalker".into(),
                start: StateSlot::Patrol,
                idle: Some(IdleConfig::default()),
                patrol: Some(PatrolConfig::default()),
                stalk: Some(StalkConfig::default()),
                search: Some(SearchConfig {
                    give_up_after: Some(60.0),
                    ..SearchConfig::default()
                }),
                investigate: Some(InvestigateConfig::default()),
                retreat: Some(RetreatConfig::default()),
                disappear: Some(DisappearConfig::default()),
                caught: true,
                sight: Some(FieldOfView::default()),
                flashlight: Some(FlashlightConfig::default()),
                flash_counter: Some(FlashCounterConfig::default()),
                hearing: Some(FootstepConfig::default()),
                reactions: Reactions {
                    on_spotted: Some(StateSlot::Stalk),
                    on_lost: Some(StateSlot::Search),
                    on_flashlight: Some(StateSlot::Retreat),
                    on_flash_count: Some(StateSlot::Disappear),
                    on_footstep: Some(StateSlot::Investigate),
                    unfreeze_after: None,
                    catch_radius: Some(1.5),
                },
                escalation: Some(PatrolEscalation {
                    after_search_seconds: 30.0,
                    patrol: PatrolConfig {
                        mode: PatrolMode::TowardsPlayer { radius: 15.0 },
                        ..PatrolConfig::default()
                    },
                }),
                ..ArchetypeConfig::default()
            },
            Self::Somnid => ArchetypeConfig {
                name: "somnid".into(),
                start: StateSlot::Sleep,
                motion: MotionConfig {
                    speed: 2.5,
                    ..MotionConfig::default()
                },
                idle: Some(IdleConfig::default()),
                patrol: Some(PatrolConfig::default()),
                search: Some(SearchConfig {
                    give_up_after: Some(40.0),
                    ..SearchConfig::default()
                }),
                freeze: Some(FreezeConfig {
                    resume: vec![StateSlot::Search, StateSlot::Sleep],
                    ..FreezeConfig::default()
                }),
                sleep: Some(SleepConfig::default()),
                caught: true,
                sight: Some(FieldOfView {
                    radius: 12.0,
                    angle: 90.0,
                    ..FieldOfView::default()
                }),
                flashlight: Some(FlashlightConfig {
                    threshold: 0.25,
                    decay_rate: 1.0,
                    cooldown: 1.0,
                }),
                hearing: Some(FootstepConfig::default()),
                reactions: Reactions {
                    on_spotted: Some(StateSlot::Search),
                    on_flashlight: Some(StateSlot::Freeze),
                    on_footstep: Some(StateSlot::Freeze),
                    unfreeze_after: Some(3.0),
                    catch_radius: Some(1.2),
                    ..Reactions::default()
                },
                ..ArchetypeConfig::default()
            },
            Self::Wanderer => ArchetypeConfig {
                name: "wanderer".into(),
                start: StateSlot::Idle,
                motion: MotionConfig {
                    speed: 1.5,
                    ..MotionConfig::default()
                },
                idle: Some(IdleConfig {
                    duration: IdleDuration::Uniform(DurationRange::new(2.0, 6.0)),
                    face_player: true,
                    ..IdleConfig::default()
                }),
                patrol: Some(PatrolConfig {
                    mode: PatrolMode::RandomPoint { radius: 10.0 },
                    ..PatrolConfig::default()
                }),
                investigate: Some(InvestigateConfig {
                    mode: InvestigateMode::LookOnly,
                    ..InvestigateConfig::default()
                }),
                stun: Some(StunConfig::default()),
                flashlight: Some(FlashlightConfig::default()),
                hearing: Some(FootstepConfig {
                    radius: 8.0,
                    ..FootstepConfig::default()
                }),
                reactions: Reactions {
                    on_flashlight: Some(StateSlot::Stun),
                    on_footstep: Some(StateSlot::Investigate),
                    ..Reactions::default()
                },
                ..ArchetypeConfig::default()
            },
        }
    }
}

/// Nav agent tuning applied before the motor captures its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Baseline speed
    pub speed: f32,
    /// Baseline acceleration
    pub acceleration: f32,
    /// Arrival distance for simulated agents
    pub stopping_distance: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: 3.5,
            acceleration: 8.0,
            stopping_distance: 0.5,
        }
    }
}

impl MotionConfig {
    /// Writes speed and acceleration into a host agent.
    pub fn apply(&self, agent: &mut dyn NavAgent) {
        agent.set_speed(self.speed);
        agent.set_acceleration(self.acceleration);
    }

    /// Straight-line agent for headless runs.
    #[must_use]
    pub fn simulated_agent(&self, position: Vec3) -> SimulatedAgent {
        SimulatedAgent::new(position)
            .with_motion(self.speed, self.acceleration)
            .with_stopping_distance(self.stopping_distance)
    }
}

/// Full description of a monster kind.
///
/// Each `Some` behavior config binds that behavior; `None` leaves the slot
/// unsupported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeConfig {
    /// Display name
    pub name: String,
    /// Slot entered on spawn
    pub start: StateSlot,
    /// Nav agent tuning
    pub motion: MotionConfig,
    /// Idle tuning
    pub idle: Option<IdleConfig>,
    /// Patrol tuning
    pub patrol: Option<PatrolConfig>,
    /// Stalk tuning
    pub stalk: Option<StalkConfig>,
    /// Search tuning
    pub search: Option<SearchConfig>,
    /// Investigate tuning
    pub investigate: Option<InvestigateConfig>,
    /// Freeze tuning
    pub freeze: Option<FreezeConfig>,
    /// Stun tuning
    pub stun: Option<StunConfig>,
    /// Retreat tuning
    pub retreat: Option<RetreatConfig>,
    /// Disappear tuning
    pub disappear: Option<DisappearConfig>,
    /// Sleep tuning
    pub sleep: Option<SleepConfig>,
    /// Whether the monster can catch the player
    pub caught: bool,
    /// Sight cone
    pub sight: Option<FieldOfView>,
    /// Flashlight sensitivity
    pub flashlight: Option<FlashlightConfig>,
    /// Camera flash counting
    pub flash_counter: Option<FlashCounterConfig>,
    /// Hearing
    pub hearing: Option<FootstepConfig>,
    /// Sensor reactions
    pub reactions: Reactions,
    /// Patrol escalation
    pub escalation: Option<PatrolEscalation>,
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            name: "monster".into(),
            start: StateSlot::Idle,
            motion: MotionConfig::default(),
            idle: Some(IdleConfig::default()),
            patrol: None,
            stalk: None,
            search: None,
            investigate: None,
            freeze: None,
            stun: None,
            retreat: None,
            disappear: None,
            sleep: None,
            caught: false,
            sight: None,
            flashlight: None,
            flash_counter: None,
            hearing: None,
            reactions: Reactions::default(),
            escalation: None,
        }
    }
}

impl ArchetypeConfig {
    /// Checks every tuning block.
    pub fn validate(&self) -> AiResult<()> {
        if self.motion.speed <= 0.0 || self.motion.acceleration <= 0.0 {
            return Err(AiError::InvalidConfig(format!(
                "{}: speed and acceleration must be positive",
                self.name
            )));
        }
        if let Some(idle) = &self.idle {
            idle.validate()?;
        }
        if let Some(patrol) = &self.patrol {
            patrol.validate()?;
        }
        if let Some(stalk) = &self.stalk {
            stalk.validate()?;
        }
        if let Some(search) = &self.search {
            search.validate()?;
        }
        if let Some(investigate) = &self.investigate {
            investigate.validate()?;
        }
        if let Some(retreat) = &self.retreat {
            retreat.validate()?;
        }
        if let Some(sight) = &self.sight {
            sight.validate()?;
        }
        Ok(())
    }

    /// Turns the description into a builder around a host agent.
    pub fn builder(&self, mut agent: Box<dyn NavAgent>) -> AiResult<EntityBuilder> {
        self.validate()?;
        self.motion.apply(agent.as_mut());

        let mut builder = EntityBuilder::new(self.name.clone(), agent)
            .starting_in(self.start)
            .with_reactions(self.reactions.clone());

        if let Some(config) = &self.idle {
            builder = builder.with_behavior(StateSlot::Idle, IdleState::new(config.clone()));
        }
        if let Some(config) = self.patrol {
            builder = builder.with_behavior(StateSlot::Patrol, PatrolState::new(config));
        }
        if let Some(config) = self.stalk {
            builder = builder.with_behavior(StateSlot::Stalk, StalkState::new(config));
        }
        if let Some(config) = self.search {
            builder = builder.with_behavior(StateSlot::Search, SearchState::new(config));
        }
        if let Some(config) = self.investigate {
            builder = builder.with_behavior(StateSlot::Investigate, InvestigateState::new(config));
        }
        if let Some(config) = &self.freeze {
            builder = builder.with_behavior(StateSlot::Freeze, FreezeState::new(config.clone()));
        }
        if let Some(config) = self.stun {
            builder = builder.with_behavior(StateSlot::Stun, StunState::new(config));
        }
        if let Some(config) = self.retreat {
            builder = builder.with_behavior(StateSlot::Retreat, RetreatState::new(config));
        }
        if let Some(config) = self.disappear {
            builder = builder.with_behavior(StateSlot::Disappear, DisappearState::new(config));
        }
        if let Some(config) = &self.sleep {
            builder = builder.with_behavior(StateSlot::Sleep, SleepState::new(config.clone()));
        }
        if self.caught {
            builder = builder.with_behavior(StateSlot::CaughtPlayer, CaughtPlayerState);
        }

        if let Some(fov) = self.sight {
            builder = builder.with_sight(fov);
        }
        if let Some(config) = self.flashlight {
            builder = builder.with_flashlight(config);
        }
        if let Some(config) = self.flash_counter {
            builder = builder.with_flash_counter(config);
        }
        if let Some(config) = self.hearing {
            builder = builder.with_hearing(config);
        }
        if let Some(escalation) = self.escalation {
            builder = builder.with_escalation(escalation);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::state::Capabilities;

    fn stocked_level() -> Level {
        let mut level = Level::new();
        level
            .way_points
            .register("hall", Vec3::new(10.0, 0.0, 0.0))
            .expect("register");
        level.sleep_points.register(Vec3::new(-20.0, 0.0, 5.0));
        level
    }

    #[test]
    fn test_presets_build() {
        let level = stocked_level();
        for archetype in Archetype::ALL {
            let config = archetype.config();
            let agent = Box::new(config.motion.simulated_agent(Vec3::ZERO));
            let entity = config
                .builder(agent)
                .expect("valid preset")
                .build(&level)
                .expect("buildable preset");
            assert_eq!(entity.name(), config.name);
        }
    }

    #[test]
    fn test_stalker_capabilities() {
        let level = stocked_level();
        let config = Archetype::Stalker.config();
        let entity = config
            .builder(Box::new(config.motion.simulated_agent(Vec3::ZERO)))
            .expect("builder")
            .build(&level)
            .expect("entity");
        let caps = entity.machine().capabilities();
        assert!(caps.contains(Capabilities::STALK | Capabilities::RETREAT | Capabilities::DISAPPEAR));
        assert!(!caps.contains(Capabilities::SLEEP));
        assert!(caps.contains(Capabilities::CAUGHT_PLAYER));
    }

    #[test]
    fn test_motion_applied_to_agent() {
        let config = ArchetypeConfig {
            motion: MotionConfig {
                speed: 6.0,
                acceleration: 12.0,
                stopping_distance: 0.5,
            },
            ..ArchetypeConfig::default()
        };
        let entity = config
            .builder(Box::new(SimulatedAgent::new(Vec3::ZERO)))
            .expect("builder")
            .build(&Level::new())
            .expect("entity");
        assert_eq!(entity.body().motor.base_speed(), 6.0);
        assert_eq!(entity.body().motor.acceleration(), 12.0);
    }

    #[test]
    fn test_somnid_needs_sleep_points() {
        let mut level = Level::new();
        level
            .way_points
            .register("hall", Vec3::ZERO)
            .expect("register");
        let config = Archetype::Somnid.config();
        let result = config
            .builder(Box::new(config.motion.simulated_agent(Vec3::ZERO)))
            .expect("builder")
            .build(&level);
        assert!(matches!(result, Err(AiError::MissingSleepPoints)));
    }

    #[test]
    fn test_reaction_to_missing_behavior_rejected() {
        let config = ArchetypeConfig {
            reactions: Reactions {
                on_spotted: Some(StateSlot::Stalk),
                ..Reactions::default()
            },
            ..ArchetypeConfig::default()
        };
        let result = config
            .builder(Box::new(SimulatedAgent::new(Vec3::ZERO)))
            .expect("builder")
            .build(&Level::new());
        assert!(matches!(result, Err(AiError::UnsupportedState(StateSlot::Stalk))));
    }

    #[test]
    fn test_invalid_motion_rejected() {
        let config = ArchetypeConfig {
            motion: MotionConfig {
                speed: 0.0,
                ..MotionConfig::default()
            },
            ..ArchetypeConfig::default()
        };
        assert!(matches!(
            config.builder(Box::new(SimulatedAgent::new(Vec3::ZERO))),
            Err(AiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_toml() {
        let text = r#"
            name = "lurker"
            start = "patrol"
            caught = true

            [patrol]
            sample_distance = 2.0
            mode = { kind = "towards_player", radius = 6.0 }

            [reactions]
            catch_radius = 1.0
        "#;
        let config: ArchetypeConfig = toml::from_str(text).expect("parse");
        assert_eq!(config.start, StateSlot::Patrol);
        assert_eq!(
            config.patrol.map(|p| p.mode),
            Some(PatrolMode::TowardsPlayer { radius: 6.0 })
        );
        assert_eq!(config.reactions.catch_radius, Some(1.0));
        assert!(config.idle.is_some());
    }
}
