#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde Survival engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative slot registry, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the registry executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values for
//! systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

pub mod bus;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Describes the active gameplay mode for the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayMode {
    /// Assault mode in which the horde presses toward the rally point.
    Assault,
    /// Respite mode that pauses spawn scheduling between assaults.
    Respite,
}

/// Commands that express all permissible registry mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the simulation transition to the provided play mode.
    SetPlayMode {
        /// Mode the simulation should activate.
        mode: PlayMode,
    },
    /// Requests activation of one pooled creature slot at a placement.
    SpawnCreature {
        /// Species whose pool should provide the slot.
        species: SpeciesId,
        /// World placement the activated creature should assume.
        placement: Placement,
    },
    /// Requests that an active creature slot return to its pool.
    ReleaseCreature {
        /// Identifier of the slot being released.
        slot: SlotId,
    },
    /// Requests that analytics publish a fresh statistics report.
    RequestStatsRefresh,
}

/// Events broadcast by the registry after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new play mode.
    PlayModeChanged {
        /// Mode that became active after processing commands.
        mode: PlayMode,
    },
    /// Confirms that a creature slot was activated at a placement.
    CreatureActivated {
        /// Identifier of the slot that became active.
        slot: SlotId,
        /// Species that owns the slot.
        species: SpeciesId,
        /// Opaque template token registered for the species.
        template: TemplateId,
        /// World placement assigned to the creature.
        placement: Placement,
        /// Indicates the slot was reclaimed from the oldest active creature.
        recycled: bool,
    },
    /// Confirms that an active creature slot returned to its pool.
    CreatureReleased {
        /// Identifier of the slot that became inactive.
        slot: SlotId,
        /// Species that owns the slot.
        species: SpeciesId,
    },
    /// Publishes a fresh analytics report.
    StatsUpdated {
        /// Counters aggregated since the session started.
        report: StatsReport,
    },
}

/// Unique identifier assigned to a creature species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(u32);

impl SpeciesId {
    /// Creates a new species identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to one pooled creature slot.
///
/// Slots are minted once when the registry is constructed and never
/// destroyed; the identifier stays valid for the whole session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque template token carried by every slot of a species.
///
/// The engine-side binding of templates to meshes, behaviours, or prefabs is
/// the adapter's responsibility; the core stores the token and returns it
/// unchanged inside activation events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u64);

impl TemplateId {
    /// Creates a new template token with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the token.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Location in the arena expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from world-unit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Facing direction expressed as counter-clockwise radians from east.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation(f32);

impl Orientation {
    /// Creates an orientation from an angle in radians.
    #[must_use]
    pub const fn from_radians(radians: f32) -> Self {
        Self(radians)
    }

    /// Retrieves the angle in radians.
    #[must_use]
    pub const fn radians(&self) -> f32 {
        self.0
    }
}

/// World transform assigned to an active creature slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Placement {
    position: Position,
    orientation: Orientation,
}

impl Placement {
    /// Creates a placement from a position and facing direction.
    #[must_use]
    pub const fn new(position: Position, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Position component of the placement.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Orientation component of the placement.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Immutable representation of a single creature slot used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreatureSnapshot {
    /// Identifier of the slot.
    pub slot: SlotId,
    /// Species that owns the slot.
    pub species: SpeciesId,
    /// Opaque template token registered for the species.
    pub template: TemplateId,
    /// World placement most recently assigned to the slot.
    pub placement: Placement,
    /// Indicates whether the slot is currently active.
    pub active: bool,
    /// Monotonic sequence number of the most recent activation, zero if the
    /// slot has never been activated.
    pub activation_sequence: u64,
}

/// Read-only snapshot describing every slot in the registry.
#[derive(Clone, Debug, Default)]
pub struct CreatureView {
    snapshots: Vec<CreatureSnapshot>,
}

impl CreatureView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CreatureSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.slot);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &CreatureSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CreatureSnapshot> {
        self.snapshots
    }
}

/// Counters aggregated by the analytics system over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Total activations, including recycled ones.
    pub spawned: u64,
    /// Activations that reclaimed a slot from an active creature.
    pub recycled: u64,
    /// Releases that returned an active slot to its pool.
    pub released: u64,
    /// Highest number of simultaneously active slots observed.
    pub peak_active: u32,
}

/// Reasons a configuration is rejected at setup time.
///
/// Every variant is fatal to the setup call that produced it; the caller
/// must fix the configuration and retry setup. No runtime error kind exists
/// because spawning is total by construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A species was configured with a capacity of zero.
    #[error("species {species:?} requires a positive capacity")]
    InvalidCapacity {
        /// Species whose capacity was rejected.
        species: SpeciesId,
    },
    /// The same species appeared twice in one pool configuration.
    #[error("species {species:?} registered twice")]
    DuplicateSpecies {
        /// Species that was registered more than once.
        species: SpeciesId,
    },
    /// A spawn interval was zero or negative.
    #[error("spawn intervals must be positive")]
    InvalidInterval,
    /// The floor interval exceeded the initial interval.
    #[error("floor interval {floor:?} exceeds initial interval {initial:?}")]
    IntervalOrdering {
        /// Initial interval supplied by the configuration.
        initial: Duration,
        /// Floor interval supplied by the configuration.
        floor: Duration,
    },
    /// The decay multiplier fell outside the open interval (0, 1).
    #[error("decay multiplier must lie strictly inside (0, 1), got {decay}")]
    InvalidDecay {
        /// Multiplier supplied by the configuration.
        decay: f64,
    },
    /// A spawn boundary contained no candidate points.
    #[error("spawn boundary requires at least one candidate point")]
    EmptyBoundary,
    /// A spawn boundary ring had non-positive extent or spacing.
    #[error("spawn boundary ring requires positive extents and spacing")]
    InvalidBoundary,
}

/// Configuration describing one creature species and its pooled capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeciesConfig {
    species: SpeciesId,
    template: TemplateId,
    capacity: u32,
}

impl SpeciesConfig {
    /// Creates a species configuration, rejecting zero capacities.
    pub fn new(
        species: SpeciesId,
        template: TemplateId,
        capacity: u32,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { species });
        }
        Ok(Self {
            species,
            template,
            capacity,
        })
    }

    /// Species the configuration describes.
    #[must_use]
    pub const fn species(&self) -> SpeciesId {
        self.species
    }

    /// Opaque template token bound to every slot of the species.
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.template
    }

    /// Number of slots pre-populated for the species.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Validated table of species configurations for one registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolConfig {
    species: Vec<SpeciesConfig>,
}

impl PoolConfig {
    /// Creates a pool configuration, rejecting duplicate species.
    pub fn new(species: Vec<SpeciesConfig>) -> Result<Self, ConfigError> {
        for (index, config) in species.iter().enumerate() {
            let duplicate = species[..index]
                .iter()
                .any(|earlier| earlier.species() == config.species());
            if duplicate {
                return Err(ConfigError::DuplicateSpecies {
                    species: config.species(),
                });
            }
        }
        Ok(Self { species })
    }

    /// Species configurations in registration order.
    #[must_use]
    pub fn species(&self) -> &[SpeciesConfig] {
        &self.species
    }
}

/// Spawn cadence parameters controlling the difficulty ramp.
///
/// The interval between spawns shrinks geometrically by `decay` after each
/// spawn and never drops below `floor`, so the pacing starts slow, tightens
/// through the mid-game, and settles at a bounded worst case.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CadenceConfig {
    initial: Duration,
    floor: Duration,
    decay: f64,
}

impl CadenceConfig {
    /// Creates a cadence configuration, validating every parameter.
    ///
    /// Intervals must be positive, the floor must not exceed the initial
    /// interval, and the decay multiplier must lie strictly inside (0, 1);
    /// a multiplier of 1.0 or above would prevent the ramp from tightening.
    pub fn new(initial: Duration, floor: Duration, decay: f64) -> Result<Self, ConfigError> {
        if initial.is_zero() || floor.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        if floor > initial {
            return Err(ConfigError::IntervalOrdering { initial, floor });
        }
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ConfigError::InvalidDecay { decay });
        }
        Ok(Self {
            initial,
            floor,
            decay,
        })
    }

    /// Interval the schedule starts from whenever an assault begins.
    #[must_use]
    pub const fn initial(&self) -> Duration {
        self.initial
    }

    /// Lower bound the interval never drops below.
    #[must_use]
    pub const fn floor(&self) -> Duration {
        self.floor
    }

    /// Per-spawn geometric shrink factor applied to the interval.
    #[must_use]
    pub const fn decay(&self) -> f64 {
        self.decay
    }
}

/// Region of the arena perimeter from which creatures may enter.
///
/// The boundary is a validated, non-empty set of candidate points; spawn
/// positions are drawn uniformly from the set.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnBoundary {
    points: Vec<Position>,
}

impl SpawnBoundary {
    /// Creates a boundary from explicit candidate points.
    pub fn from_points(points: Vec<Position>) -> Result<Self, ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::EmptyBoundary);
        }
        Ok(Self { points })
    }

    /// Creates a boundary by walking a rectangle's perimeter.
    ///
    /// Candidate points are laid out clockwise from the top-left corner at
    /// `spacing` world units apart. Extents are measured from `center` to
    /// each edge.
    pub fn ring(
        center: Position,
        half_width: f32,
        half_height: f32,
        spacing: f32,
    ) -> Result<Self, ConfigError> {
        if !(half_width > 0.0 && half_height > 0.0 && spacing > 0.0) {
            return Err(ConfigError::InvalidBoundary);
        }

        let width = half_width * 2.0;
        let height = half_height * 2.0;
        let perimeter = (width + height) * 2.0;
        let count = (perimeter / spacing).floor().max(1.0) as u32;
        let step = perimeter / count as f32;

        let mut points = Vec::with_capacity(count as usize);
        for index in 0..count {
            let distance = step * index as f32;
            points.push(perimeter_point(center, half_width, half_height, distance));
        }
        Self::from_points(points)
    }

    /// Candidate points composing the boundary.
    #[must_use]
    pub fn points(&self) -> &[Position] {
        &self.points
    }
}

fn perimeter_point(
    center: Position,
    half_width: f32,
    half_height: f32,
    distance: f32,
) -> Position {
    let width = half_width * 2.0;
    let height = half_height * 2.0;
    let left = center.x() - half_width;
    let right = center.x() + half_width;
    let top = center.y() + half_height;
    let bottom = center.y() - half_height;

    let mut remaining = distance;
    if remaining < width {
        return Position::new(left + remaining, top);
    }
    remaining -= width;
    if remaining < height {
        return Position::new(right, top - remaining);
    }
    remaining -= height;
    if remaining < width {
        return Position::new(right - remaining, bottom);
    }
    remaining -= width;
    Position::new(left, bottom + remaining)
}
