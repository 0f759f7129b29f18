//! Timing policies that decide how many ticks a host frame runs
//!
//! The simulation itself only knows about single fixed steps. A host picks a
//! `Scheduler` and feeds it wall-clock deltas (or explicit tick requests);
//! `run_frame` turns that into zero or more `sim::tick` calls.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::sim::{GameEvent, GameState, TickInput, tick};

/// Converts elapsed host time into a number of simulation steps
pub trait Scheduler {
    /// Steps to run for a frame that took `elapsed` seconds
    fn steps(&mut self, elapsed: f32) -> u32;

    /// Drop any carried-over time (e.g. after a restart or load)
    fn reset(&mut self) {}
}

/// Fixed-timestep accumulator with a substep cap
#[derive(Debug, Clone, Default)]
pub struct FixedTimestep {
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for FixedTimestep {
    fn steps(&mut self, elapsed: f32) -> u32 {
        // Long stalls (tab switches, breakpoints) are clamped, not replayed
        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Host-driven stepping: exactly one tick per signal, elapsed time ignored
#[derive(Debug, Clone, Default)]
pub struct HostSignal {
    queued: u32,
}

impl HostSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one more tick on the next frame
    pub fn signal(&mut self) {
        self.queued += 1;
    }
}

impl Scheduler for HostSignal {
    fn steps(&mut self, _elapsed: f32) -> u32 {
        std::mem::take(&mut self.queued)
    }

    fn reset(&mut self) {
        self.queued = 0;
    }
}

/// Run every step the scheduler grants for this frame.
///
/// One-shot inputs (purchases, closing the marketplace) are only applied on
/// the first step; held inputs repeat on every step.
pub fn run_frame<S: Scheduler + ?Sized>(
    state: &mut GameState,
    input: &TickInput,
    scheduler: &mut S,
    elapsed: f32,
) -> Vec<GameEvent> {
    let steps = scheduler.steps(elapsed);
    let mut events = Vec::new();
    if steps == 0 {
        return events;
    }

    events.extend(tick(state, input));
    let held = TickInput {
        purchases: Vec::new(),
        close_marketplace: false,
        ..input.clone()
    };
    for _ in 1..steps {
        events.extend(tick(state, &held));
    }
    events
}
