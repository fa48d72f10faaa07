#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system aggregating session spawn statistics.

use horde_core::{Command, Event, StatsReport};

/// Pure system that counts lifecycle events and publishes report updates.
#[derive(Debug, Default)]
pub struct Analytics {
    spawned: u64,
    recycled: u64,
    released: u64,
    active: u32,
    peak_active: u32,
    refresh_pending: bool,
    last_report: Option<StatsReport>,
}

impl Analytics {
    /// Creates a new analytics system with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last report published by the system, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&StatsReport> {
        self.last_report.as_ref()
    }

    /// Consumes events and applied commands to maintain counters.
    ///
    /// A report is published at most once per call, and only when a refresh
    /// was requested *and* a tick (`Event::TimeAdvanced`) has been observed,
    /// so adapters polling every frame see a stable cadence.
    pub fn handle(&mut self, events: &[Event], commands: &[Command], out: &mut Vec<Event>) {
        let mut tick_observed = false;

        for event in events {
            match event {
                Event::CreatureActivated { recycled, .. } => {
                    self.spawned += 1;
                    if *recycled {
                        self.recycled += 1;
                    } else {
                        // A recycled activation keeps the same slot active,
                        // so only fresh activations grow the active count.
                        self.active += 1;
                        self.peak_active = self.peak_active.max(self.active);
                    }
                }
                Event::CreatureReleased { .. } => {
                    self.released += 1;
                    self.active = self.active.saturating_sub(1);
                }
                Event::TimeAdvanced { .. } => {
                    tick_observed = true;
                }
                _ => {}
            }
        }

        for command in commands {
            if matches!(command, Command::RequestStatsRefresh) {
                self.refresh_pending = true;
            }
        }

        if !tick_observed || !self.refresh_pending {
            return;
        }
        self.refresh_pending = false;

        let report = StatsReport {
            spawned: self.spawned,
            recycled: self.recycled,
            released: self.released,
            peak_active: self.peak_active,
        };
        self.last_report = Some(report);
        out.push(Event::StatsUpdated { report });
    }
}
