#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Horde Survival session.
//!
//! The adapter is the composition root: it owns the registry, the systems,
//! and the event bus, wires them together for a fixed number of ticks, and
//! prints a deterministic session summary. Creatures are released by a
//! stand-in consumer that eliminates each one a fixed number of ticks after
//! activation, exercising the full acquire/release lifecycle.

mod scenario_transfer;

use std::{
    cell::RefCell,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    rc::Rc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use horde_core::{
    bus::EventBus, CadenceConfig, Command, Event, PlayMode, PoolConfig, Position, SlotId,
    SpawnBoundary, SpeciesConfig, SpeciesId, TemplateId,
};
use horde_system_analytics::Analytics;
use horde_system_spawning::{Config as SpawningConfig, Spawning};
use horde_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::scenario_transfer::{ScenarioSnapshot, ScenarioSpecies};

#[derive(Debug, Parser)]
#[command(name = "horde", about = "Runs a headless Horde Survival spawn session")]
struct Args {
    /// Number of creature species to register.
    #[arg(long, default_value_t = 2)]
    species: u32,
    /// Pooled slot capacity per species.
    #[arg(long, default_value_t = 3)]
    capacity: u32,
    /// Interval between spawns when an assault begins, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    initial_interval_ms: u64,
    /// Lower bound on the spawn interval, in milliseconds.
    #[arg(long, default_value_t = 500)]
    floor_interval_ms: u64,
    /// Per-spawn geometric shrink factor applied to the interval.
    #[arg(long, default_value_t = 0.9)]
    decay: f64,
    /// Half extent of the square arena along each axis, in world units.
    #[arg(long, default_value_t = 40.0)]
    arena_half_extent: f32,
    /// Spacing between boundary spawn candidates, in world units.
    #[arg(long, default_value_t = 4.0)]
    boundary_spacing: f32,
    /// Ticks a creature stays active before the consumer releases it.
    #[arg(long, default_value_t = 40)]
    lifetime_ticks: u64,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Master seed; a random seed is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Encoded scenario produced by --export-scenario.
    #[arg(long)]
    scenario: Option<String>,
    /// Print the encoded scenario and exit without simulating.
    #[arg(long)]
    export_scenario: bool,
    /// Print every activation and release as it happens.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let scenario = match &args.scenario {
        Some(encoded) => {
            ScenarioSnapshot::decode(encoded).context("failed to decode --scenario payload")?
        }
        None => scenario_from_args(&args),
    };

    if args.export_scenario {
        println!("{}", scenario.encode());
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    run_session(&args, &scenario, seed)
}

fn scenario_from_args(args: &Args) -> ScenarioSnapshot {
    let species = (0..args.species.max(1))
        .map(|index| ScenarioSpecies {
            id: index + 1,
            template: u64::from(index + 1) * 100,
            capacity: args.capacity,
        })
        .collect();
    ScenarioSnapshot {
        species,
        initial_interval_ms: args.initial_interval_ms,
        floor_interval_ms: args.floor_interval_ms,
        decay: args.decay,
        arena_half_extent: args.arena_half_extent,
        boundary_spacing: args.boundary_spacing,
    }
}

fn build_configs(
    scenario: &ScenarioSnapshot,
) -> Result<(PoolConfig, CadenceConfig, SpawnBoundary)> {
    let mut species = Vec::with_capacity(scenario.species.len());
    for entry in &scenario.species {
        let config = SpeciesConfig::new(
            SpeciesId::new(entry.id),
            TemplateId::new(entry.template),
            entry.capacity,
        )
        .with_context(|| format!("invalid configuration for species {}", entry.id))?;
        species.push(config);
    }
    let pool = PoolConfig::new(species).context("invalid pool configuration")?;

    let cadence = CadenceConfig::new(
        Duration::from_millis(scenario.initial_interval_ms),
        Duration::from_millis(scenario.floor_interval_ms),
        scenario.decay,
    )
    .context("invalid spawn cadence configuration")?;

    let boundary = SpawnBoundary::ring(
        Position::new(0.0, 0.0),
        scenario.arena_half_extent,
        scenario.arena_half_extent,
        scenario.boundary_spacing,
    )
    .context("invalid spawn boundary configuration")?;

    Ok((pool, cadence, boundary))
}

fn run_session(args: &Args, scenario: &ScenarioSnapshot, seed: u64) -> Result<()> {
    let (pool_config, cadence, boundary) = build_configs(scenario)?;
    let rally_point = Position::new(0.0, 0.0);

    // Expand the master seed into independent per-system streams.
    let mut stream_rng = ChaCha8Rng::seed_from_u64(seed);
    let spawning_seed: u64 = stream_rng.gen();

    let mut world = World::new(&pool_config);
    let mut spawning = Spawning::new(SpawningConfig::new(
        cadence,
        boundary,
        rally_point,
        spawning_seed,
    ));
    let mut analytics = Analytics::new();
    let mut bus = EventBus::new();

    let activated: Rc<RefCell<Vec<SlotId>>> = Rc::new(RefCell::new(Vec::new()));
    let activation_sink = Rc::clone(&activated);
    let consumer_subscription = bus.subscribe(Box::new(move |event| {
        if let Event::CreatureActivated { slot, .. } = event {
            activation_sink.borrow_mut().push(*slot);
        }
    }));

    let positions: Rc<RefCell<Vec<Vec2>>> = Rc::new(RefCell::new(Vec::new()));
    let position_sink = Rc::clone(&positions);
    let stats_subscription = bus.subscribe(Box::new(move |event| {
        if let Event::CreatureActivated { placement, .. } = event {
            let position = placement.position();
            position_sink
                .borrow_mut()
                .push(Vec2::new(position.x(), position.y()));
        }
    }));

    let printer_subscription = args
        .verbose
        .then(|| bus.subscribe(Box::new(|event| print_event(event))));

    let dt = Duration::from_millis(args.tick_ms);
    let mut due: Vec<(u64, SlotId)> = Vec::new();
    let mut hasher = DefaultHasher::new();

    println!("session seed: {seed}");

    for tick in 0..args.ticks {
        let mut commands = Vec::new();
        if tick == 0 {
            commands.push(Command::SetPlayMode {
                mode: PlayMode::Assault,
            });
        }
        due.retain(|(deadline, slot)| {
            if *deadline <= tick {
                commands.push(Command::ReleaseCreature { slot: *slot });
                false
            } else {
                true
            }
        });
        if tick + 1 == args.ticks {
            commands.push(Command::RequestStatsRefresh);
        }
        commands.push(Command::Tick { dt });

        let mut events = Vec::new();
        for command in &commands {
            world::apply(&mut world, command.clone(), &mut events);
        }

        // Activation events never advance time, so one spawning pass per
        // tick drains every interval the tick covered.
        let species = query::species_table(&world);
        let mut spawn_commands = Vec::new();
        spawning.handle(&events, query::play_mode(&world), &species, &mut spawn_commands);
        for command in &spawn_commands {
            world::apply(&mut world, command.clone(), &mut events);
        }
        commands.extend(spawn_commands);

        let mut published = Vec::new();
        analytics.handle(&events, &commands, &mut published);
        events.extend(published);

        for event in &events {
            hash_event(&mut hasher, event);
            bus.publish(event);
        }

        for slot in activated.borrow_mut().drain(..) {
            // A recycled slot gets a fresh lease instead of a second entry.
            due.retain(|(_, scheduled)| *scheduled != slot);
            due.push((tick + args.lifetime_ticks, slot));
        }
    }

    if let Some(subscription) = printer_subscription {
        let _ = bus.unsubscribe(subscription);
    }
    let _ = bus.unsubscribe(stats_subscription);
    let _ = bus.unsubscribe(consumer_subscription);

    print_summary(&spawning, analytics.last_report(), &positions.borrow(), &hasher);
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::CreatureActivated {
            slot,
            species,
            placement,
            recycled,
            ..
        } => {
            let suffix = if *recycled { " (recycled)" } else { "" };
            println!(
                "+ slot {} species {} at ({:.1}, {:.1}){suffix}",
                slot.get(),
                species.get(),
                placement.position().x(),
                placement.position().y(),
            );
        }
        Event::CreatureReleased { slot, .. } => {
            println!("- slot {} released", slot.get());
        }
        Event::PlayModeChanged { mode } => {
            println!("mode: {mode:?}");
        }
        _ => {}
    }
}

fn print_summary(
    spawning: &Spawning,
    report: Option<&horde_core::StatsReport>,
    positions: &[Vec2],
    hasher: &DefaultHasher,
) {
    match report {
        Some(report) => {
            println!(
                "spawned {} ({} recycled), released {}, peak active {}",
                report.spawned, report.recycled, report.released, report.peak_active
            );
        }
        None => println!("no statistics were published"),
    }

    if !positions.is_empty() {
        let centroid =
            positions.iter().copied().sum::<Vec2>() / positions.len() as f32;
        let mean_radius = positions
            .iter()
            .map(|position| position.length())
            .sum::<f32>()
            / positions.len() as f32;
        println!(
            "spawn centroid ({:.2}, {:.2}), mean distance from rally {:.2}",
            centroid.x, centroid.y, mean_radius
        );
    }

    println!(
        "final spawn interval: {} ms",
        spawning.current_interval().as_millis()
    );
    println!("session fingerprint: {:#018x}", hasher.finish());
}

fn hash_event(hasher: &mut DefaultHasher, event: &Event) {
    match event {
        Event::TimeAdvanced { dt } => {
            (0u8, dt).hash(hasher);
        }
        Event::PlayModeChanged { mode } => {
            (1u8, mode).hash(hasher);
        }
        Event::CreatureActivated {
            slot,
            species,
            template,
            placement,
            recycled,
        } => {
            (
                2u8,
                slot,
                species,
                template,
                placement.position().x().to_bits(),
                placement.position().y().to_bits(),
                placement.orientation().radians().to_bits(),
                recycled,
            )
                .hash(hasher);
        }
        Event::CreatureReleased { slot, species } => {
            (3u8, slot, species).hash(hasher);
        }
        Event::StatsUpdated { report } => {
            (
                4u8,
                report.spawned,
                report.recycled,
                report.released,
                report.peak_active,
            )
                .hash(hasher);
        }
    }
}
