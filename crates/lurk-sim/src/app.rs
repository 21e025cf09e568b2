//! Scenario runner: builds the world, drives the tick loop, summarizes.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use lurk_ai::{AiEvent, AiEventKind, Host, MockSpatial, OpenFloor, Session, StateSlot};
use lurk_common::EntityId;
use tracing::{debug, info, warn};

use crate::config::ScenarioConfig;
use crate::player::ScriptedPlayer;

/// Per-monster outcome.
#[derive(Debug, Clone)]
pub struct MonsterSummary {
    /// Monster ID
    pub id: EntityId,
    /// Archetype name
    pub name: String,
    /// State when the run ended
    pub final_state: Option<StateSlot>,
    /// State changes over the run
    pub transitions: u64,
    /// Seconds spent in each state
    pub time_in: BTreeMap<StateSlot, f32>,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Frame ticks executed
    pub ticks: u32,
    /// Simulated seconds
    pub seconds: f32,
    /// Monster that caught the player, if any
    pub caught_by: Option<EntityId>,
    /// Per-monster results in spawn order
    pub monsters: Vec<MonsterSummary>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ran {} ticks ({:.1} s)", self.ticks, self.seconds)?;
        for monster in &self.monsters {
            let state = monster
                .final_state
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            writeln!(
                f,
                "  {} {:<10} final={:<14} transitions={}",
                monster.id, monster.name, state, monster.transitions
            )?;
            let times: Vec<String> = monster
                .time_in
                .iter()
                .map(|(slot, seconds)| format!("{slot} {seconds:.1}s"))
                .collect();
            writeln!(f, "      {}", times.join(", "))?;
        }
        match self.caught_by {
            Some(id) => write!(f, "Player caught by {id}"),
            None => write!(f, "Player survived"),
        }
    }
}

/// Runs a scenario to completion.
pub fn run(config: &ScenarioConfig) -> Result<RunSummary> {
    let level = config.build_level().context("building level")?;
    let floor = OpenFloor::new();
    let mut spatial = MockSpatial::new();
    for obstacle in &config.obstacles {
        spatial.add_obstacle(obstacle.center, obstacle.radius);
    }
    let mut player = ScriptedPlayer::new(config.player.clone());
    let player_handle = spatial.add_player(player.position());

    let mut session = Session::new(level);
    let mut ids = Vec::with_capacity(config.monsters.len());
    {
        let host = Host::new(&floor, &spatial);
        for (index, spec) in config.monsters.iter().enumerate() {
            let archetype = spec.resolve()?;
            let agent = archetype.motion.simulated_agent(spec.position);
            let builder = archetype
                .builder(Box::new(agent))
                .with_context(|| format!("monster {index} ({})", archetype.name))?
                .with_seed(config.seed.wrapping_add(index as u64));
            let id = session
                .spawn(builder, host, Some(player.view()))
                .with_context(|| format!("spawning {}", archetype.name))?;
            ids.push(id);
        }
    }
    info!(monsters = ids.len(), ticks = config.ticks, "scenario ready");

    let dt = config.dt();
    let mut time_in: BTreeMap<EntityId, BTreeMap<StateSlot, f32>> = BTreeMap::new();
    let mut caught_by = None;
    let mut ticks = 0;

    for _ in 0..config.ticks {
        let actions = player.advance(dt);
        spatial.move_player(player_handle, actions.view.position);

        for id in &ids {
            let Some(entity) = session.entity_mut(*id) else {
                continue;
            };
            let position = entity.position();
            entity.set_flashlight_lit(player.lights(position));
            if actions.flashes > 0 && player.in_reach(position) {
                for _ in 0..actions.flashes {
                    entity.register_flash();
                }
            }
            if let Some(step) = actions.footstep {
                entity.hear_footstep(step, player.loudness());
            }
        }

        let host = Host::new(&floor, &spatial);
        session.physics_tick(dt, host, Some(actions.view))?;
        session.tick(dt, host, Some(actions.view))?;
        ticks += 1;

        for entity in session.entities() {
            if let Some(slot) = entity.current_state() {
                *time_in
                    .entry(entity.id())
                    .or_default()
                    .entry(slot)
                    .or_insert(0.0) += dt;
            }
        }
        for event in session.drain_events() {
            log_event(&session, &event);
            if event.kind == AiEventKind::CaughtPlayer && caught_by.is_none() {
                caught_by = Some(event.entity);
            }
        }
        if caught_by.is_some() && config.stop_on_catch {
            info!(elapsed = player.elapsed(), "player caught, ending run");
            break;
        }
    }

    let monsters = ids
        .iter()
        .filter_map(|id| session.entity(*id))
        .map(|entity| MonsterSummary {
            id: entity.id(),
            name: entity.name().to_string(),
            final_state: entity.current_state(),
            transitions: entity.machine().transition_count(),
            time_in: time_in.remove(&entity.id()).unwrap_or_default(),
        })
        .collect();

    Ok(RunSummary {
        ticks,
        seconds: ticks as f32 * dt,
        caught_by,
        monsters,
    })
}

fn log_event(session: &Session, event: &AiEvent) {
    let name = session.entity(event.entity).map_or("?", |e| e.name());
    match &event.kind {
        AiEventKind::StateChanged { from, to } => {
            info!(entity = %event.entity, name, %from, %to, "state changed");
        },
        AiEventKind::CaughtPlayer => {
            warn!(entity = %event.entity, name, "caught the player");
        },
        kind => {
            debug!(entity = %event.entity, name, ?kind, "event");
        },
    }
}
