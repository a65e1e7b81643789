//! App builder and the fixed-tick simulation loop.
//!
//! The [`App`] collects resources, systems and plugins, then
//! [`build`](App::build)s a [`Simulation`]. The simulation owns the world and
//! schedule behind a single lock shared with any number of presentation
//! readers:
//!
//! ```text
//!  simulation thread                      presentation thread
//!  ─────────────────                      ───────────────────
//!  advance(elapsed)                       handle.frame(|world| ..)
//!    ticks = clock.advance(elapsed)         lock ─ read positions ─ unlock
//!    for each tick:
//!      lock ─ FixedTime += 1 ─ run schedule ─ unlock
//! ```
//!
//! A tick always runs to completion with the lock held, so a frame read sees
//! the world between ticks, never halfway through one.
//!
//! ## Example
//!
//! ```ignore
//! use rampage::prelude::*;
//!
//! let mut sim = App::new()
//!     .add_plugins(PhysicsPlugin)
//!     .add_plugins(GameplayPlugin)
//!     .build();
//! let handle = sim.handle();
//! std::thread::spawn(move || loop {
//!     handle.frame(|world| draw(world));
//! });
//! loop {
//!     sim.advance(frame_elapsed());
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::SimConfig;
use crate::ecs::system::{Schedule, System};
use crate::ecs::world::World;
use crate::time::{FixedTime, TickClock};

/// A plugin can add resources and systems to the app.
pub trait Plugin {
    fn build(&self, app: &mut App);
}

/// The app builder. Configure the simulation, then call [`build()`](App::build).
pub struct App {
    pub world: World,
    pub schedule: Schedule,
    config: SimConfig,
}

impl App {
    /// An empty world with the default [`SimConfig`].
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            world: World::new(),
            schedule: Schedule::new(),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Insert a resource into the world.
    pub fn insert_resource<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.world.insert_resource(value);
        self
    }

    /// Add a system that runs every tick, after those already added.
    pub fn add_system<S: System + 'static>(mut self, system: S) -> Self {
        self.schedule.add_system(system);
        self
    }

    /// Apply a plugin.
    pub fn add_plugins<P: Plugin>(mut self, plugin: P) -> Self {
        plugin.build(&mut self);
        self
    }

    /// Run `f` against the world once, before the first tick.
    pub fn setup(mut self, f: impl FnOnce(&mut World)) -> Self {
        f(&mut self.world);
        self
    }

    pub fn build(mut self) -> Simulation {
        if !self.world.has_resource::<FixedTime>() {
            self.world
                .insert_resource(FixedTime::new(self.config.tick_rate));
        }
        log::info!(
            "simulation built: {} system(s), {} Hz, catch-up limit {}",
            self.schedule.len(),
            self.config.tick_rate,
            self.config.max_ticks_per_advance
        );
        let clock = TickClock::new(self.config.tick_rate, self.config.max_ticks_per_advance);
        self.world.insert_resource(self.config);
        Simulation {
            state: Arc::new(Mutex::new(SimState {
                world: self.world,
                schedule: self.schedule,
            })),
            clock,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one tick touches. Guarded as a unit.
pub struct SimState {
    pub world: World,
    pub schedule: Schedule,
}

impl SimState {
    pub fn tick(&mut self) {
        if let Some(time) = self.world.get_resource_mut::<FixedTime>() {
            time.advance();
        }
        self.schedule.run(&mut self.world);
    }
}

pub struct Simulation {
    state: Arc<Mutex<SimState>>,
    clock: TickClock,
}

impl Simulation {
    /// Account for `elapsed` real time and run the ticks it makes due.
    /// The lock is taken per tick, so readers can interleave between ticks.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let ticks = self.clock.advance(elapsed);
        for _ in 0..ticks {
            lock(&self.state).tick();
        }
        ticks
    }

    /// Run exactly one tick regardless of the clock.
    pub fn tick(&mut self) {
        lock(&self.state).tick();
    }

    /// Read the world between ticks.
    pub fn frame<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&lock(&self.state).world)
    }

    /// Mutate the world between ticks (spawning from outside the schedule).
    pub fn with_world<R>(&mut self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut lock(&self.state).world)
    }

    /// A cloneable read handle for a presentation thread.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    #[cfg(feature = "diagnostics")]
    pub fn diagnostics(&self) -> Diagnostics {
        let state = lock(&self.state);
        Diagnostics {
            tick: state.world.get_resource::<FixedTime>().map_or(0, FixedTime::tick),
            world: state.world.stats(),
            bodies: state
                .world
                .get_resource::<crate::physics::PhysicsWorld>()
                .map_or(0, |physics| physics.len()),
            systems: state.schedule.timings().to_vec(),
        }
    }

    /// [`diagnostics`](Simulation::diagnostics) as a JSON document.
    #[cfg(feature = "diagnostics")]
    pub fn diagnostics_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.diagnostics())
    }
}

/// Shared read access to a running [`Simulation`].
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    /// Read the world between ticks. Blocks while a tick is running.
    pub fn frame<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&lock(&self.state).world)
    }
}

/// Snapshot of simulation counters, taken between ticks.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, serde::Serialize)]
pub struct Diagnostics {
    pub tick: u64,
    pub world: crate::ecs::world::WorldStats,
    pub bodies: usize,
    pub systems: Vec<crate::ecs::system::SystemTiming>,
}

// A panicking system leaves the world as it was at the panic; later readers
// still get it.
fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
