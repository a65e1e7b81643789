//! # Rampage — Entity Store and Arcade Physics
//!
//! The runtime core of a top-down survival game: an archetype-indexed
//! entity/component store with transaction-safe iteration, and a 2D physics
//! world with a quad-tree broadphase, SAT narrowphase and positional
//! collision response. Both are driven by a fixed-tick [`Simulation`](app::Simulation)
//! that a presentation thread can read between ticks.
//!
//! Start with `use rampage::prelude::*` and build an [`App`](app::App).

pub mod app;
pub mod config;
pub mod ecs;
pub mod gameplay;
pub mod math;
pub mod physics;
pub mod prelude;
pub mod time;
