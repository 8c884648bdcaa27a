//! Spin scheduler
//!
//! Drives per-frame motion of every unlocked column and the staggered
//! left-to-right stop. The scheduler only reports `Settled` once the last
//! pending stop has snapped its column; there is no global timeout.

use serde::{Deserialize, Serialize};

use crate::lattice::ReelLattice;
use crate::reel::ColumnMode;
use crate::symbols::SymbolId;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Spinning,
    /// Stops scheduled, some columns still moving
    Stopping,
    Settled,
}

#[derive(Debug, Clone, Copy)]
struct PendingStop {
    column: usize,
    due_ms: f64,
}

/// What happened during one scheduler tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Cells recycled across all columns
    pub recycled: u32,
    /// Columns snapped this tick, in stop order
    pub stopped: Vec<usize>,
    /// The last pending stop completed this tick
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub struct SpinScheduler {
    state: SchedulerState,
    clock_ms: f64,
    pending: Vec<PendingStop>,
}

impl SpinScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            clock_ms: 0.0,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state, SchedulerState::Spinning | SchedulerState::Stopping)
    }

    /// Stops still waiting to fire
    pub fn pending_stops(&self) -> usize {
        self.pending.len()
    }

    /// Start every unlocked column downward at `base_speed`
    pub fn start_all(&mut self, lattice: &mut ReelLattice, base_speed: f64) {
        self.start_with(lattice, |_| base_speed);
    }

    /// Start every unlocked column at a per-column signed speed
    pub fn start_with(&mut self, lattice: &mut ReelLattice, speed_for: impl Fn(usize) -> f64) {
        self.pending.clear();
        let mut started = 0;
        for column in lattice.columns_mut().iter_mut().filter(|c| !c.is_locked()) {
            column.start_spin(speed_for(column.index()));
            started += 1;
        }
        self.state = SchedulerState::Spinning;
        log::debug!("[Scheduler] Started {} columns", started);
    }

    /// Every unlocked column has recycled at least `n` cells
    pub fn all_columns_spun_at_least(&self, lattice: &ReelLattice, n: u32) -> bool {
        lattice
            .columns()
            .iter()
            .filter(|c| !c.is_locked())
            .all(|c| c.spin_count() >= n)
    }

    /// Schedule one stop per unlocked column at `column_index * per_column_delay_ms`.
    ///
    /// Ignored unless spinning. With no unlocked columns the scheduler settles at once.
    pub fn stop_staggered(&mut self, lattice: &ReelLattice, per_column_delay_ms: f64) {
        if self.state != SchedulerState::Spinning {
            return;
        }
        let delay = per_column_delay_ms.max(0.0);
        self.pending = lattice
            .columns()
            .iter()
            .filter(|c| !c.is_locked())
            .map(|c| PendingStop {
                column: c.index(),
                due_ms: self.clock_ms + c.index() as f64 * delay,
            })
            .collect();

        if self.pending.is_empty() {
            self.state = SchedulerState::Settled;
        } else {
            self.state = SchedulerState::Stopping;
            log::debug!(
                "[Scheduler] {} stops scheduled, {}ms apart",
                self.pending.len(),
                delay
            );
        }
    }

    /// One frame: fire due stops first, then move every column still spinning.
    pub fn tick(
        &mut self,
        dt_ms: f64,
        lattice: &mut ReelLattice,
        mut draw: impl FnMut() -> SymbolId,
    ) -> TickReport {
        let mut report = TickReport::default();
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.clock_ms += dt_ms;
        }

        if self.state == SchedulerState::Stopping {
            let now = self.clock_ms;
            // Pending stops are built in column order with non-decreasing due times
            while let Some(stop) = self.pending.first().copied() {
                if stop.due_ms > now {
                    break;
                }
                self.pending.remove(0);
                match lattice.column_mut(stop.column) {
                    Some(column) if !column.is_locked() => {
                        column.snap_to_grid();
                        column.set_speed(0.0);
                        report.stopped.push(stop.column);
                    }
                    _ => log::debug!("[Scheduler] Stop for column {} skipped", stop.column),
                }
            }
            if self.pending.is_empty() {
                self.state = SchedulerState::Settled;
                report.settled = true;
            }
        }

        if self.is_spinning() {
            for column in lattice.columns_mut().iter_mut() {
                if column.is_locked() || column.mode() != ColumnMode::Spinning {
                    continue;
                }
                let speed = column.speed();
                report.recycled += column.tick(speed, &mut draw);
            }
        }
        report
    }

    /// Drop pending stops and return to idle
    pub fn reset(&mut self) {
        self.pending.clear();
        self.state = SchedulerState::Idle;
    }
}

impl Default for SpinScheduler {
    fn default() -> Self {
        Self::new()
    }
}
