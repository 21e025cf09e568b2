//! Session: owns a level and its monsters, ticks them, publishes events.

use std::collections::BTreeMap;

use lurk_common::EntityId;
use tracing::{debug, info, warn};

use crate::entity::{Entity, EntityBuilder, Frame};
use crate::error::{AiError, AiResult};
use crate::events::{AiEvent, EventBus};
use crate::host::{Host, PlayerView};
use crate::level::Level;

/// All monsters of one level.
#[derive(Debug, Default)]
pub struct Session {
    level: Level,
    entities: BTreeMap<EntityId, Entity>,
    bus: EventBus,
    elapsed: f64,
    ticks: u64,
}

impl Session {
    /// Creates a session over a level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self::with_event_capacity(level, 1024)
    }

    /// Creates a session with a custom event bus capacity.
    #[must_use]
    pub fn with_event_capacity(level: Level, capacity: usize) -> Self {
        Self {
            level,
            entities: BTreeMap::new(),
            bus: EventBus::new(capacity),
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Level registries.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Mutable level registries.
    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// Builds, initializes and adds a monster.
    pub fn spawn(
        &mut self,
        builder: EntityBuilder,
        host: Host<'_>,
        player: Option<PlayerView>,
    ) -> AiResult<EntityId> {
        let mut entity = builder.build(&self.level)?;
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(AiError::InvalidConfig(format!("{id} is already spawned")));
        }
        let mut frame = Frame::new(&mut self.level, host, player, 0.0);
        entity.initialize(&mut frame)?;
        info!(entity = %id, name = entity.name(), state = ?entity.current_state(), "monster spawned");
        publish(&self.bus, &mut entity);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Removes a monster after exiting its current behavior and releasing
    /// its sleep point.
    pub fn despawn(
        &mut self,
        id: EntityId,
        host: Host<'_>,
        player: Option<PlayerView>,
    ) -> AiResult<Entity> {
        let mut entity = self.entities.remove(&id).ok_or(AiError::UnknownEntity(id))?;
        let mut frame = Frame::new(&mut self.level, host, player, 0.0);
        let last = entity.shutdown(&mut frame);
        publish(&self.bus, &mut entity);
        debug!(entity = %id, state = ?last, "monster despawned");
        Ok(entity)
    }

    /// Looks up a monster.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks up a monster mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Monsters in ID order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of monsters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no monsters are spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Seconds simulated so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Frame ticks so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one frame update for every monster.
    ///
    /// A failing monster does not stop the others; the first error is
    /// returned after all have been ticked.
    pub fn tick(&mut self, dt: f32, host: Host<'_>, player: Option<PlayerView>) -> AiResult<()> {
        self.elapsed += f64::from(dt);
        self.ticks += 1;
        let mut first_error = None;
        for entity in self.entities.values_mut() {
            let mut frame = Frame::new(&mut self.level, host, player, dt);
            if let Err(err) = entity.frame_update(&mut frame) {
                warn!(entity = %entity.id(), %err, "frame update failed");
                first_error.get_or_insert(err);
            }
            publish(&self.bus, entity);
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Runs one physics update for every monster.
    pub fn physics_tick(
        &mut self,
        dt: f32,
        host: Host<'_>,
        player: Option<PlayerView>,
    ) -> AiResult<()> {
        let mut first_error = None;
        for entity in self.entities.values_mut() {
            let mut frame = Frame::new(&mut self.level, host, player, dt);
            if let Err(err) = entity.physics_update(&mut frame) {
                warn!(entity = %entity.id(), %err, "physics update failed");
                first_error.get_or_insert(err);
            }
            publish(&self.bus, entity);
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Runs a host-driven operation on one monster with world access.
    pub fn with_entity<R>(
        &mut self,
        id: EntityId,
        host: Host<'_>,
        player: Option<PlayerView>,
        f: impl FnOnce(&mut Entity, &mut Frame<'_>) -> AiResult<R>,
    ) -> AiResult<R> {
        let entity = self.entities.get_mut(&id).ok_or(AiError::UnknownEntity(id))?;
        let mut frame = Frame::new(&mut self.level, host, player, 0.0);
        let result = f(&mut *entity, &mut frame);
        publish(&self.bus, entity);
        result
    }

    /// Event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Takes every published event.
    pub fn drain_events(&self) -> Vec<AiEvent> {
        self.bus.drain()
    }
}

fn publish(bus: &EventBus, entity: &mut Entity) {
    let id = entity.id();
    for kind in entity.drain_events() {
        bus.publish(AiEvent { entity: id, kind });
    }
}
