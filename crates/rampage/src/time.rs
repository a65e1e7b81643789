//! Fixed-tick timing.
//!
//! The simulation never reads the wall clock. [`TickClock`] turns real
//! elapsed time into a whole number of ticks, and the [`FixedTime`] resource
//! tells systems which tick they are in and how long it is.

use std::time::Duration;

/// Per-tick timing resource, advanced once before every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTime {
    tick: u64,
    delta: Duration,
    elapsed: Duration,
}

impl FixedTime {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            delta: tick_duration(tick_rate),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.tick += 1;
        self.elapsed += self.delta;
    }

    /// Number of ticks run so far. The first tick sees 1.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

impl Default for FixedTime {
    fn default() -> Self {
        Self::new(60)
    }
}

fn tick_duration(tick_rate: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(tick_rate.max(1)))
}

/// Accumulator converting elapsed real time into whole ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    step: Duration,
    accumulated: Duration,
    max_ticks: u32,
}

impl TickClock {
    pub fn new(tick_rate: u32, max_ticks: u32) -> Self {
        Self {
            step: tick_duration(tick_rate),
            accumulated: Duration::ZERO,
            max_ticks: max_ticks.max(1),
        }
    }

    /// Add `elapsed` and return how many ticks are due. The remainder carries
    /// over. More than `max_ticks` due ticks are clamped and the backlog is
    /// dropped, so a long stall cannot snowball into ever-longer catch-ups.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let due = self.accumulated.as_nanos() / self.step.as_nanos().max(1);
        if due > u128::from(self.max_ticks) {
            log::warn!(
                "simulation fell behind by {due} ticks; running {} and dropping the rest",
                self.max_ticks
            );
            self.accumulated = Duration::ZERO;
            return self.max_ticks;
        }
        let due = due as u32;
        self.accumulated -= self.step * due;
        due
    }

    /// Time carried towards the next tick.
    pub fn remainder(&self) -> Duration {
        self.accumulated
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}
