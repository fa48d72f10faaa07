use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use horde_core::{
    CadenceConfig, Command, Event, PlayMode, PoolConfig, Position, SlotId, SpawnBoundary,
    SpeciesConfig, SpeciesId, TemplateId,
};
use horde_system_spawning::{Config, Spawning};
use horde_world::{self as world, query, World};

const ENEMY: SpeciesId = SpeciesId::new(1);
const BOSS: SpeciesId = SpeciesId::new(2);

fn pool_config(enemy_capacity: u32, boss_capacity: u32) -> PoolConfig {
    let mut species = vec![
        SpeciesConfig::new(ENEMY, TemplateId::new(100), enemy_capacity).expect("enemy config"),
    ];
    if boss_capacity > 0 {
        species
            .push(SpeciesConfig::new(BOSS, TemplateId::new(200), boss_capacity).expect("boss"));
    }
    PoolConfig::new(species).expect("pool config")
}

fn spawning_config(initial_ms: u64, floor_ms: u64, decay: f64) -> Config {
    let cadence = CadenceConfig::new(
        Duration::from_millis(initial_ms),
        Duration::from_millis(floor_ms),
        decay,
    )
    .expect("cadence");
    let boundary = SpawnBoundary::ring(Position::new(0.0, 0.0), 20.0, 20.0, 10.0).expect("ring");
    Config::new(cadence, boundary, Position::new(0.0, 0.0), 0x4d59_5df4_d0f3_3173)
}

fn start_assault(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SetPlayMode {
            mode: PlayMode::Assault,
        },
        &mut events,
    );
    events
}

#[test]
fn emits_multiple_spawn_commands_for_large_dt() {
    let config = pool_config(8, 0);
    let mut world = World::new(&config);
    let mut spawning = Spawning::new(spawning_config(2000, 500, 0.9));
    let species = query::species_table(&world);

    let mut events = start_assault(&mut world);
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(5500),
        },
        &mut events,
    );

    let mut commands = Vec::new();
    spawning.handle(&events, query::play_mode(&world), &species, &mut commands);

    // 5.5 s covers the 2.0 s, 1.8 s, and 1.62 s intervals but not a fourth.
    assert_eq!(commands.len(), 3, "expected one spawn per elapsed interval");
    for command in &commands {
        assert!(
            matches!(command, Command::SpawnCreature { species, .. } if *species == ENEMY),
            "unexpected command emitted: {command:?}"
        );
    }
}

#[test]
fn interval_sequence_is_non_increasing_and_floored() {
    let config = pool_config(64, 0);
    let mut world = World::new(&config);
    let mut spawning = Spawning::new(spawning_config(2000, 500, 0.9));
    let species = query::species_table(&world);

    let mut events = start_assault(&mut world);
    let mut commands = Vec::new();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
    assert!(commands.is_empty(), "no spawn before any time advances");
    assert_eq!(spawning.current_interval(), Duration::from_millis(2000));

    let floor = Duration::from_millis(500);
    let mut previous = spawning.current_interval();
    for _ in 0..30 {
        // Advance by exactly the pending interval so each call spawns once.
        let dt = spawning.current_interval();
        events.clear();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        commands.clear();
        spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
        assert_eq!(commands.len(), 1, "expected exactly one spawn per interval");

        let current = spawning.current_interval();
        assert!(current <= previous, "interval sequence must never grow");
        assert!(current >= floor, "interval must stay at or above the floor");
        previous = current;
    }
    assert_eq!(
        spawning.current_interval(),
        floor,
        "thirty spawns at decay 0.9 must reach the floor"
    );
}

#[test]
fn respite_resets_cadence_and_accumulator() {
    let config = pool_config(8, 0);
    let mut world = World::new(&config);
    let mut spawning = Spawning::new(spawning_config(1000, 200, 0.5));
    let species = query::species_table(&world);

    let mut events = start_assault(&mut world);
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(2000),
        },
        &mut events,
    );
    let mut commands = Vec::new();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
    // Intervals 1000, 500, 250, then the 200 ms floor all fit inside 2 s.
    assert_eq!(commands.len(), 4);
    assert_eq!(spawning.current_interval(), Duration::from_millis(200));

    // Part of the next interval accrues, then the assault pauses.
    events.clear();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(100),
        },
        &mut events,
    );
    commands.clear();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
    assert!(commands.is_empty(), "no spawn before the interval elapses");

    events.clear();
    world::apply(
        &mut world,
        Command::SetPlayMode {
            mode: PlayMode::Respite,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(5000),
        },
        &mut events,
    );
    commands.clear();
    spawning.handle(&events, PlayMode::Respite, &species, &mut commands);
    assert!(commands.is_empty(), "respite must halt scheduling");

    // Re-entering assault restarts the ramp from the initial interval.
    events.clear();
    world::apply(
        &mut world,
        Command::SetPlayMode {
            mode: PlayMode::Assault,
        },
        &mut events,
    );
    commands.clear();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
    assert_eq!(spawning.current_interval(), Duration::from_millis(1000));

    events.clear();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(999),
        },
        &mut events,
    );
    commands.clear();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
    assert!(
        commands.is_empty(),
        "accumulated respite time must not carry into the new assault"
    );

    events.clear();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(1),
        },
        &mut events,
    );
    commands.clear();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);
    assert_eq!(commands.len(), 1, "expected spawn after the full interval");
}

#[test]
fn exhausted_pool_recycles_through_the_full_pipeline() {
    let config = pool_config(1, 0);
    let mut world = World::new(&config);
    let mut spawning = Spawning::new(spawning_config(1000, 1000, 0.5));
    let species = query::species_table(&world);

    let mut activations: Vec<(SlotId, bool)> = Vec::new();
    let mut events = start_assault(&mut world);
    for _ in 0..3 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1000),
            },
            &mut events,
        );
        let mut commands = Vec::new();
        spawning.handle(&events, query::play_mode(&world), &species, &mut commands);
        events.clear();
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        for event in &events {
            if let Event::CreatureActivated { slot, recycled, .. } = event {
                activations.push((*slot, *recycled));
            }
        }
        events.clear();
    }

    assert_eq!(activations.len(), 3);
    assert!(!activations[0].1, "first activation fills the empty pool");
    assert!(activations[1].1, "second activation must recycle");
    assert!(activations[2].1, "third activation must recycle");
    assert!(
        activations.iter().all(|(slot, _)| *slot == activations[0].0),
        "a single-slot pool must reuse its one slot"
    );
    assert_eq!(query::active_count(&world, ENEMY), Some(1));
}

#[test]
fn species_rotation_follows_registration_order() {
    let config = pool_config(4, 4);
    let mut world = World::new(&config);
    let mut spawning = Spawning::new(spawning_config(500, 500, 0.5));
    let species = query::species_table(&world);

    let mut events = start_assault(&mut world);
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(2000),
        },
        &mut events,
    );
    let mut commands = Vec::new();
    spawning.handle(&events, PlayMode::Assault, &species, &mut commands);

    let spawned: Vec<SpeciesId> = commands
        .iter()
        .map(|command| match command {
            Command::SpawnCreature { species, .. } => *species,
            other => panic!("unexpected command emitted: {other:?}"),
        })
        .collect();
    assert_eq!(spawned, vec![ENEMY, BOSS, ENEMY, BOSS]);
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let config = pool_config(3, 1);
    let mut world = World::new(&config);
    let mut spawning = Spawning::new(spawning_config(750, 250, 0.8));
    let mut log = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        process_spawning(&mut world, &mut spawning, events, &mut log);
    }

    let creatures = query::creature_view(&world)
        .into_vec()
        .into_iter()
        .map(CreatureState::from)
        .collect();

    ReplayOutcome {
        creatures,
        spawns: log,
    }
}

fn process_spawning(
    world: &mut World,
    spawning: &mut Spawning,
    pending_events: Vec<Event>,
    log: &mut Vec<SpawnRecord>,
) {
    let mut events = pending_events;

    loop {
        if events.is_empty() {
            break;
        }

        let play_mode = query::play_mode(world);
        let species = query::species_table(world);
        let mut commands = Vec::new();
        spawning.handle(&events, play_mode, &species, &mut commands);

        if commands.is_empty() {
            break;
        }

        events.clear();

        for command in commands {
            let mut generated_events = Vec::new();
            world::apply(world, command, &mut generated_events);
            for event in &generated_events {
                if let Event::CreatureActivated {
                    slot,
                    species,
                    placement,
                    recycled,
                    ..
                } = event
                {
                    log.push(SpawnRecord {
                        slot: *slot,
                        species: *species,
                        x_bits: placement.position().x().to_bits(),
                        y_bits: placement.position().y().to_bits(),
                        recycled: *recycled,
                    });
                }
            }
            events.extend(generated_events);
        }
    }
}

fn scripted_commands() -> Vec<Command> {
    vec![
        Command::SetPlayMode {
            mode: PlayMode::Assault,
        },
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        Command::SetPlayMode {
            mode: PlayMode::Respite,
        },
        Command::SetPlayMode {
            mode: PlayMode::Assault,
        },
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        Command::Tick {
            dt: Duration::from_secs(2),
        },
        Command::Tick {
            dt: Duration::from_secs(2),
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    creatures: Vec<CreatureState>,
    spawns: Vec<SpawnRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SpawnRecord {
    slot: SlotId,
    species: SpeciesId,
    x_bits: u32,
    y_bits: u32,
    recycled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CreatureState {
    slot: SlotId,
    species: SpeciesId,
    active: bool,
    x_bits: u32,
    y_bits: u32,
}

impl From<horde_core::CreatureSnapshot> for CreatureState {
    fn from(snapshot: horde_core::CreatureSnapshot) -> Self {
        Self {
            slot: snapshot.slot,
            species: snapshot.species,
            active: snapshot.active,
            x_bits: snapshot.placement.position().x().to_bits(),
            y_bits: snapshot.placement.position().y().to_bits(),
        }
    }
}
