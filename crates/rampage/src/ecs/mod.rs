//! # Archetype-Indexed Entity/Component Store
//!
//! Entities are grouped by their exact set of component types (their
//! [`TagSet`]). Queries resolve to "every tag set containing mine" through a
//! superset cache, and structural changes made while iterating are held in a
//! transaction until the iteration ends.
//!
//! ## Module Overview
//!
//! - [`entity`] — Generational entity handles
//! - [`tag_set`] — Sorted component-id sets, the archetype key
//! - [`component`] — The `Component` trait, ids and type-erased storage
//! - `archetype` — Entity lists per tag set and the superset cache
//! - `deferred` — The transaction queue
//! - [`world`] — The store itself, plus resources
//! - [`query`] — Required-set queries and `ComponentSet` tuples
//! - [`system`] — System trait and schedule runner

pub(crate) mod archetype;
pub mod component;
pub(crate) mod deferred;
pub mod entity;
pub mod query;
pub mod system;
pub mod tag_set;
pub mod world;

pub use component::{Component, ComponentId, ComponentRegistry, Enabled};
pub use entity::Entity;
pub use query::{ComponentSet, Query};
pub use system::{Schedule, System};
pub use tag_set::TagSet;
pub use world::World;
