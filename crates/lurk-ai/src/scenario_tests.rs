//! Whole-session scenarios: archetypes, sensors and shared level state
//! working together over many ticks.

use glam::Vec3;
use lurk_common::{planar_distance, EntityId};

use crate::archetype::{Archetype, ArchetypeConfig};
use crate::events::{AiEvent, AiEventKind};
use crate::host::{Host, MockSpatial, OpenFloor, PlayerView};
use crate::level::Level;
use crate::random::DurationRange;
use crate::session::Session;
use crate::state::StateSlot;
use crate::states::{IdleConfig, IdleDuration, PatrolConfig, PatrolMode};

const DT: f32 = 0.1;

fn stocked_level() -> Level {
    let mut level = Level::new();
    for (name, position) in [
        ("atrium", Vec3::new(5.0, 0.0, 5.0)),
        ("kitchen", Vec3::new(-12.0, 0.0, 8.0)),
        ("cellar", Vec3::new(40.0, 0.0, -30.0)),
        ("attic", Vec3::new(-35.0, 0.0, -35.0)),
    ] {
        level
            .way_points
            .register(name, position)
            .expect("unique names");
    }
    level
}

fn spawn(
    session: &mut Session,
    config: &ArchetypeConfig,
    at: Vec3,
    seed: u64,
    host: Host<'_>,
    player: Option<PlayerView>,
) -> EntityId {
    let builder = config
        .builder(Box::new(config.motion.simulated_agent(at)))
        .expect("valid archetype")
        .with_seed(seed);
    session.spawn(builder, host, player).expect("spawn")
}

/// Physics then frame, collecting published events.
fn run(
    session: &mut Session,
    host: Host<'_>,
    player: Option<PlayerView>,
    seconds: f32,
) -> Vec<AiEvent> {
    let steps = (seconds / DT).round() as usize;
    let mut events = Vec::new();
    for _ in 0..steps {
        session.physics_tick(DT, host, player).expect("physics");
        session.tick(DT, host, player).expect("frame");
        events.extend(session.drain_events());
    }
    events
}

fn state_changes(events: &[AiEvent], entity: EntityId) -> Vec<(StateSlot, StateSlot)> {
    events
        .iter()
        .filter(|e| e.entity == entity)
        .filter_map(|e| match e.kind {
            AiEventKind::StateChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect()
}

fn count(events: &[AiEvent], kind: &AiEventKind) -> usize {
    events.iter().filter(|e| &e.kind == kind).count()
}

#[test]
fn test_idle_patrol_cycle() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let mut session = Session::new(Level::new());

    let config = ArchetypeConfig {
        idle: Some(IdleConfig {
            duration: IdleDuration::Uniform(DurationRange::fixed(0.5)),
            ..IdleConfig::default()
        }),
        patrol: Some(PatrolConfig {
            mode: PatrolMode::RandomPoint { radius: 4.0 },
            ..PatrolConfig::default()
        }),
        ..ArchetypeConfig::default()
    };
    let id = spawn(&mut session, &config, Vec3::ZERO, 3, host, None);

    let events = run(&mut session, host, None, 20.0);
    let changes = state_changes(&events, id);
    assert!(changes.contains(&(StateSlot::Idle, StateSlot::Patrol)));
    assert!(changes.contains(&(StateSlot::Patrol, StateSlot::Idle)));
    assert!(changes.len() >= 4, "only {} transitions", changes.len());
}

#[test]
fn test_stalker_spots_player_once_and_stalks() {
    let floor = OpenFloor::new();
    let mut spatial = MockSpatial::new();
    let player_feet = Vec3::new(0.0, 0.0, 12.0);
    spatial.add_player(player_feet);
    let host = Host::new(&floor, &spatial);
    let player = Some(PlayerView::at(player_feet));
    let mut session = Session::new(stocked_level());

    let id = spawn(
        &mut session,
        &Archetype::Stalker.config(),
        Vec3::ZERO,
        11,
        host,
        player,
    );
    let events = run(&mut session, host, player, 3.0);

    let spotted = events
        .iter()
        .filter(|e| matches!(e.kind, AiEventKind::PlayerSpotted { .. }))
        .count();
    assert_eq!(spotted, 1);
    let entity = session.entity(id).expect("spawned");
    assert_eq!(entity.current_state(), Some(StateSlot::Stalk));
    assert!(entity.body().senses.player_visible);
}

#[test]
fn test_somnid_freezes_under_flashlight_then_resumes() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let player = Some(PlayerView::at(Vec3::new(0.0, 0.0, -30.0)));
    let mut level = stocked_level();
    level.sleep_points.register(Vec3::new(10.0, 0.0, 10.0));
    let mut session = Session::new(level);

    let id = spawn(
        &mut session,
        &Archetype::Somnid.config(),
        Vec3::ZERO,
        5,
        host,
        player,
    );
    assert_eq!(session.entity(id).and_then(|e| e.current_state()), Some(StateSlot::Sleep));

    session
        .entity_mut(id)
        .expect("spawned")
        .set_flashlight_lit(true);
    let events = run(&mut session, host, player, 0.5);
    assert!(state_changes(&events, id).contains(&(StateSlot::Sleep, StateSlot::Freeze)));
    let entity = session.entity_mut(id).expect("spawned");
    assert!(!entity.body().motor.is_enabled());
    entity.set_flashlight_lit(false);

    let events = run(&mut session, host, player, 2.0);
    assert_eq!(session.entity(id).and_then(|e| e.current_state()), Some(StateSlot::Freeze));
    assert_eq!(count(&events, &AiEventKind::FreezeEnded), 0);

    let events = run(&mut session, host, player, 1.5);
    assert_eq!(count(&events, &AiEventKind::FreezeEnded), 1);
    let entity = session.entity(id).expect("spawned");
    assert_eq!(entity.current_state(), Some(StateSlot::Search));
    assert!(entity.body().motor.is_enabled());
}

#[test]
fn test_two_somnids_never_share_a_sleep_point() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let player = Some(PlayerView::at(Vec3::new(0.0, 0.0, -30.0)));
    let mut level = stocked_level();
    let point = level.sleep_points.register(Vec3::new(8.0, 0.0, 8.0));
    let mut session = Session::new(level);

    let config = Archetype::Somnid.config();
    let a = spawn(&mut session, &config, Vec3::ZERO, 1, host, player);
    let b = spawn(&mut session, &config, Vec3::new(2.0, 0.0, 0.0), 2, host, player);

    let events = run(&mut session, host, player, 1.0);
    let claims: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind, AiEventKind::SleepPointClaimed { .. }))
        .collect();
    assert_eq!(claims.len(), 1);
    let holder = session.level().sleep_points.holder(point).expect("claimed");
    assert!(holder == a || holder == b);
    assert_eq!(claims[0].entity, holder);

    session.despawn(holder, host, None).expect("despawn");
    assert_eq!(session.level().sleep_points.holder(point), None);
}

#[test]
fn test_retreat_restores_speed() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let mut session = Session::new(stocked_level());

    let config = Archetype::Stalker.config();
    let base_speed = config.motion.speed;
    let id = spawn(&mut session, &config, Vec3::ZERO, 9, host, None);

    session
        .entity_mut(id)
        .expect("spawned")
        .set_flashlight_lit(true);
    let events = run(&mut session, host, None, 2.0);
    assert!(state_changes(&events, id)
        .iter()
        .any(|(_, to)| *to == StateSlot::Retreat));
    let entity = session.entity_mut(id).expect("spawned");
    assert_eq!(entity.current_state(), Some(StateSlot::Retreat));
    assert!((entity.body().motor.speed() - base_speed * 2.0).abs() < 1e-4);
    entity.set_flashlight_lit(false);

    let mut ended = false;
    for _ in 0..400 {
        let events = run(&mut session, host, None, DT);
        if count(&events, &AiEventKind::RetreatEnded) > 0 {
            ended = true;
            break;
        }
    }
    assert!(ended, "retreat never reached its way-point");
    let entity = session.entity(id).expect("spawned");
    assert_eq!(entity.current_state(), Some(StateSlot::Idle));
    assert!((entity.body().motor.speed() - base_speed).abs() < 1e-4);
}

#[test]
fn test_flash_count_makes_stalker_disappear() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let mut session = Session::new(stocked_level());
    let id = spawn(
        &mut session,
        &Archetype::Stalker.config(),
        Vec3::new(30.0, 0.0, -25.0),
        4,
        host,
        None,
    );

    let entity = session.entity_mut(id).expect("spawned");
    for _ in 0..3 {
        entity.register_flash();
    }
    let events = run(&mut session, host, None, DT);
    assert_eq!(count(&events, &AiEventKind::FlashCountReached), 1);
    let entity = session.entity(id).expect("spawned");
    assert_eq!(entity.current_state(), Some(StateSlot::Disappear));
    assert!(planar_distance(entity.position(), Vec3::new(-35.0, 0.0, -35.0)) < 1.0);
}

#[test]
fn test_two_flashes_are_not_enough() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let mut session = Session::new(stocked_level());
    let id = spawn(&mut session, &Archetype::Stalker.config(), Vec3::ZERO, 4, host, None);

    session.entity_mut(id).expect("spawned").register_flash();
    run(&mut session, host, None, 1.0);
    session.entity_mut(id).expect("spawned").register_flash();
    // two seconds without a flash resets the count
    run(&mut session, host, None, 2.5);
    session.entity_mut(id).expect("spawned").register_flash();
    let events = run(&mut session, host, None, DT);
    assert_eq!(count(&events, &AiEventKind::FlashCountReached), 0);
}

#[test]
fn test_footstep_sends_stalker_to_investigate() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let mut session = Session::new(stocked_level());
    let id = spawn(&mut session, &Archetype::Stalker.config(), Vec3::ZERO, 8, host, None);

    let step = Vec3::new(6.0, 0.0, -3.0);
    session
        .entity_mut(id)
        .expect("spawned")
        .hear_footstep(step, 1.0);
    let events = run(&mut session, host, None, DT);
    assert_eq!(count(&events, &AiEventKind::FootstepHeard { position: step }), 1);
    let entity = session.entity(id).expect("spawned");
    assert_eq!(entity.current_state(), Some(StateSlot::Investigate));
    assert_eq!(entity.body().point_of_interest, Some(step));
}

#[test]
fn test_catch_is_terminal() {
    let floor = OpenFloor::new();
    let spatial = MockSpatial::new();
    let host = Host::new(&floor, &spatial);
    let player = Some(PlayerView::at(Vec3::new(1.0, 0.0, 0.0)));
    let mut session = Session::new(stocked_level());
    let id = spawn(&mut session, &Archetype::Stalker.config(), Vec3::ZERO, 6, host, player);

    let events = run(&mut session, host, player, DT);
    assert_eq!(count(&events, &AiEventKind::CaughtPlayer), 1);

    let entity = session.entity_mut(id).expect("spawned");
    entity.set_flashlight_lit(true);
    entity.hear_footstep(Vec3::new(2.0, 0.0, 0.0), 1.0);
    let events = run(&mut session, host, player, 3.0);
    assert!(state_changes(&events, id).is_empty());
    assert_eq!(
        session.entity(id).and_then(|e| e.current_state()),
        Some(StateSlot::CaughtPlayer)
    );
}
