#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative creature slot registry for Horde Survival.
//!
//! The registry owns a fixed set of reusable creature slots per species,
//! created once at construction and never destroyed. Activation and release
//! toggle a slot's active flag and move it between per-species bookkeeping
//! queues; no path ever allocates beyond the configured capacities.

use std::collections::VecDeque;

use horde_core::{
    Command, Event, Placement, PlayMode, PoolConfig, SlotId, SpeciesId, TemplateId,
};

#[derive(Debug)]
struct Slot {
    id: SlotId,
    active: bool,
    placement: Placement,
    activation_sequence: u64,
}

#[derive(Debug)]
struct SpeciesPool {
    species: SpeciesId,
    template: TemplateId,
    capacity: u32,
    slots: Vec<Slot>,
    /// Inactive slots in release order; the front is handed out next.
    available: VecDeque<usize>,
    /// Active slots in activation order; the front is reclaimed first.
    active_order: VecDeque<usize>,
}

impl SpeciesPool {
    fn new(species: SpeciesId, template: TemplateId, capacity: u32, first_slot: u32) -> Self {
        let mut slots = Vec::with_capacity(capacity as usize);
        let mut available = VecDeque::with_capacity(capacity as usize);
        for offset in 0..capacity {
            slots.push(Slot {
                id: SlotId::new(first_slot + offset),
                active: false,
                placement: Placement::default(),
                activation_sequence: 0,
            });
            available.push_back(offset as usize);
        }
        Self {
            species,
            template,
            capacity,
            slots,
            available,
            active_order: VecDeque::with_capacity(capacity as usize),
        }
    }
}

/// Represents the authoritative Horde Survival registry state.
#[derive(Debug)]
pub struct World {
    pools: Vec<SpeciesPool>,
    play_mode: PlayMode,
    tick_index: u64,
    activation_counter: u64,
}

impl World {
    /// Creates a registry with every configured slot pre-populated inactive.
    ///
    /// Capacity and duplicate-species validation already happened when the
    /// [`PoolConfig`] was constructed, so registry construction is total.
    #[must_use]
    pub fn new(config: &PoolConfig) -> Self {
        let mut pools = Vec::with_capacity(config.species().len());
        let mut next_slot = 0u32;
        for species in config.species() {
            pools.push(SpeciesPool::new(
                species.species(),
                species.template(),
                species.capacity(),
                next_slot,
            ));
            next_slot += species.capacity();
        }
        Self {
            pools,
            play_mode: PlayMode::Respite,
            tick_index: 0,
            activation_counter: 0,
        }
    }

    fn pool_index(&self, species: SpeciesId) -> Option<usize> {
        self.pools.iter().position(|pool| pool.species == species)
    }

    fn activate(&mut self, species: SpeciesId, placement: Placement, out: &mut Vec<Event>) {
        let Some(pool_index) = self.pool_index(species) else {
            return;
        };
        self.activation_counter += 1;
        let sequence = self.activation_counter;
        let pool = &mut self.pools[pool_index];

        let (index, recycled) = match pool.available.pop_front() {
            Some(index) => (index, false),
            None => match pool.active_order.pop_front() {
                Some(index) => (index, true),
                // Capacities are positive, so one of the queues always
                // holds every slot index.
                None => return,
            },
        };

        let slot = &mut pool.slots[index];
        slot.active = true;
        slot.placement = placement;
        slot.activation_sequence = sequence;
        pool.active_order.push_back(index);

        out.push(Event::CreatureActivated {
            slot: slot.id,
            species: pool.species,
            template: pool.template,
            placement,
            recycled,
        });
    }

    fn release(&mut self, slot: SlotId, out: &mut Vec<Event>) {
        for pool in &mut self.pools {
            let Some(index) = pool.slots.iter().position(|candidate| candidate.id == slot) else {
                continue;
            };
            if pool.slots[index].active {
                pool.slots[index].active = false;
                pool.active_order.retain(|&active| active != index);
                pool.available.push_back(index);
                out.push(Event::CreatureReleased {
                    slot,
                    species: pool.species,
                });
            }
            return;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}

/// Applies the provided command to the registry, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SetPlayMode { mode } => {
            if world.play_mode != mode {
                world.play_mode = mode;
                out_events.push(Event::PlayModeChanged { mode });
            }
        }
        Command::SpawnCreature { species, placement } => {
            world.activate(species, placement, out_events);
        }
        Command::ReleaseCreature { slot } => {
            world.release(slot, out_events);
        }
        // Consumed by the analytics system straight from the command batch.
        Command::RequestStatsRefresh => {}
    }
}

/// Query functions that provide read-only access to the registry state.
pub mod query {
    use horde_core::{CreatureSnapshot, CreatureView, PlayMode, SpeciesId, TemplateId};

    use super::World;

    /// Retrieves the play mode currently governing the simulation.
    #[must_use]
    pub fn play_mode(world: &World) -> PlayMode {
        world.play_mode
    }

    /// Number of ticks applied since the registry was constructed.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Enumerates registered species in registration order.
    #[must_use]
    pub fn species_table(world: &World) -> Vec<SpeciesId> {
        world.pools.iter().map(|pool| pool.species).collect()
    }

    /// Configured slot capacity for the species, if registered.
    #[must_use]
    pub fn capacity(world: &World, species: SpeciesId) -> Option<u32> {
        world
            .pools
            .iter()
            .find(|pool| pool.species == species)
            .map(|pool| pool.capacity)
    }

    /// Number of currently active slots for the species, if registered.
    #[must_use]
    pub fn active_count(world: &World, species: SpeciesId) -> Option<u32> {
        world
            .pools
            .iter()
            .find(|pool| pool.species == species)
            .map(|pool| pool.active_order.len() as u32)
    }

    /// Opaque template token registered for the species, if any.
    #[must_use]
    pub fn template(world: &World, species: SpeciesId) -> Option<TemplateId> {
        world
            .pools
            .iter()
            .find(|pool| pool.species == species)
            .map(|pool| pool.template)
    }

    /// Captures a read-only view of every slot in the registry.
    #[must_use]
    pub fn creature_view(world: &World) -> CreatureView {
        let snapshots: Vec<CreatureSnapshot> = world
            .pools
            .iter()
            .flat_map(|pool| {
                pool.slots.iter().map(|slot| CreatureSnapshot {
                    slot: slot.id,
                    species: pool.species,
                    template: pool.template,
                    placement: slot.placement,
                    active: slot.active,
                    activation_sequence: slot.activation_sequence,
                })
            })
            .collect();
        CreatureView::from_snapshots(snapshots)
    }
}
