#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn direction system driving creature activation.
//!
//! The system decides *when* a creature enters the arena and *where* it is
//! placed. Difficulty progression is encoded purely in the spawn cadence: the
//! interval between spawns shrinks geometrically after every spawn and is
//! clamped at a configured floor, so pacing starts slow, intensifies through
//! the mid-game, and settles at a bounded worst case.

use std::time::Duration;

use horde_core::{
    CadenceConfig, Command, Event, Orientation, Placement, PlayMode, Position, SpawnBoundary,
    SpeciesId,
};
use sha2::{Digest, Sha256};

const RNG_STREAM_POSITION: &str = "spawn-position";

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    cadence: CadenceConfig,
    boundary: SpawnBoundary,
    rally_point: Position,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from already-validated components.
    #[must_use]
    pub fn new(
        cadence: CadenceConfig,
        boundary: SpawnBoundary,
        rally_point: Position,
        rng_seed: u64,
    ) -> Self {
        Self {
            cadence,
            boundary,
            rally_point,
            rng_seed,
        }
    }
}

/// Controller lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running,
}

/// Mode edges observed by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    AssaultEntered,
    RespiteEntered,
}

/// Full transition table for the controller lifecycle. The only states are
/// `Stopped` and `Running`; every (state, trigger) pair is listed.
const fn transition(phase: Phase, trigger: Trigger) -> Phase {
    match (phase, trigger) {
        (Phase::Stopped, Trigger::AssaultEntered) => Phase::Running,
        (Phase::Running, Trigger::AssaultEntered) => Phase::Running,
        (Phase::Stopped, Trigger::RespiteEntered) => Phase::Stopped,
        (Phase::Running, Trigger::RespiteEntered) => Phase::Stopped,
    }
}

/// Pure system that deterministically emits spawn commands during assaults.
#[derive(Debug)]
pub struct Spawning {
    cadence: CadenceConfig,
    boundary: SpawnBoundary,
    rally_point: Position,
    phase: Phase,
    current_interval: Duration,
    accumulator: Duration,
    species_cursor: usize,
    rng: SplitMix64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let seed = derive_labeled_seed(config.rng_seed, RNG_STREAM_POSITION);
        Self {
            current_interval: config.cadence.initial(),
            cadence: config.cadence,
            boundary: config.boundary,
            rally_point: config.rally_point,
            phase: Phase::Stopped,
            accumulator: Duration::ZERO,
            species_cursor: 0,
            rng: SplitMix64::new(seed),
        }
    }

    /// Interval that must elapse before the next spawn is scheduled.
    #[must_use]
    pub const fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Consumes events and immutable views to emit spawn commands.
    ///
    /// `species` is the registered species table in registration order;
    /// spawns rotate through it. Entering assault resets the cadence to its
    /// initial interval; respite halts scheduling without touching any
    /// already-active creature.
    pub fn handle(
        &mut self,
        events: &[Event],
        play_mode: PlayMode,
        species: &[SpeciesId],
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::PlayModeChanged { mode } = event {
                self.observe_mode(*mode);
            }
        }
        // The authoritative mode wins over any stale edge history, e.g. when
        // the system is constructed mid-assault and never saw the change.
        self.observe_mode(play_mode);

        if self.phase != Phase::Running {
            self.accumulator = Duration::ZERO;
            return;
        }
        if species.is_empty() {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }
        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        while self.accumulator >= self.current_interval {
            self.accumulator -= self.current_interval;
            let chosen = self.next_species(species);
            let placement = self.sample_placement();
            out.push(Command::SpawnCreature {
                species: chosen,
                placement,
            });
            self.tighten_cadence();
        }
    }

    fn observe_mode(&mut self, mode: PlayMode) {
        let trigger = match mode {
            PlayMode::Assault => Trigger::AssaultEntered,
            PlayMode::Respite => Trigger::RespiteEntered,
        };
        let next = transition(self.phase, trigger);
        if self.phase == Phase::Stopped && next == Phase::Running {
            self.current_interval = self.cadence.initial();
            self.accumulator = Duration::ZERO;
        }
        self.phase = next;
    }

    fn next_species(&mut self, table: &[SpeciesId]) -> SpeciesId {
        let species = table[self.species_cursor % table.len()];
        self.species_cursor = (self.species_cursor + 1) % table.len();
        species
    }

    fn sample_placement(&mut self) -> Placement {
        let points = self.boundary.points();
        let index = (self.rng.next_u64() % points.len() as u64) as usize;
        let position = points[index];
        Placement::new(position, orientation_toward(position, self.rally_point))
    }

    fn tighten_cadence(&mut self) {
        let decayed = self.current_interval.mul_f64(self.cadence.decay());
        self.current_interval = decayed.max(self.cadence.floor());
    }
}

fn orientation_toward(from: Position, to: Position) -> Orientation {
    Orientation::from_radians((to.y() - from.y()).atan2(to.x() - from.x()))
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}
