//! # System — Per-Tick Logic Over the World
//!
//! A system is any `FnMut(&mut World)`. Systems that iterate entities own a
//! [`Query`](super::query::Query) in their closure state, so the query's
//! resolved superset list lives as long as the system does:
//!
//! ```ignore
//! let mut query = Query::of::<(Lifetime,)>();
//! schedule.add_system(move |world: &mut World| {
//!     query.for_each(world, |world, entity| { /* ... */ });
//! });
//! ```
//!
//! A [`Schedule`] runs its systems sequentially in insertion order, once per
//! simulation tick. With the `diagnostics` feature each run also records how
//! long every system took.

use super::world::World;

pub trait System: Send {
    fn run(&mut self, world: &mut World);
}

impl<F: FnMut(&mut World) + Send> System for F {
    fn run(&mut self, world: &mut World) {
        (self)(world);
    }
}

struct NamedSystem {
    #[cfg(any(feature = "diagnostics", test))]
    name: String,
    system: Box<dyn System>,
}

/// Wall time one system took during the latest [`Schedule::run`].
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, serde::Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// Ordered list of systems.
pub struct Schedule {
    systems: Vec<NamedSystem>,
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(NamedSystem {
            #[cfg(any(feature = "diagnostics", test))]
            name: short_system_name(std::any::type_name::<S>()),
            system: Box::new(system),
        });
    }

    pub fn run(&mut self, world: &mut World) {
        #[cfg(feature = "diagnostics")]
        {
            self.timings.clear();
            for ns in &mut self.systems {
                let start = std::time::Instant::now();
                ns.system.run(world);
                self.timings.push(SystemTiming {
                    name: ns.name.clone(),
                    duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
                });
            }
        }
        #[cfg(not(feature = "diagnostics"))]
        {
            for ns in &mut self.systems {
                ns.system.run(world);
            }
        }
    }

    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Last path segment of a system's type name (`rampage::gameplay::health_system`
/// → `health_system`). Closures are named after the function that built them
/// (`physics_system::{{closure}}` → `physics_system`).
#[cfg(any(feature = "diagnostics", test))]
fn short_system_name(full: &str) -> String {
    full.rsplit("::")
        .find(|segment| !segment.contains("closure"))
        .unwrap_or(full)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace(Vec<&'static str>);

    fn first(world: &mut World) {
        world.resource_mut::<Trace>().0.push("first");
    }

    fn second(world: &mut World) {
        world.resource_mut::<Trace>().0.push("second");
    }

    #[test]
    fn systems_run_in_insertion_order() {
        let mut world = World::new();
        world.insert_resource(Trace::default());
        let mut schedule = Schedule::new();
        schedule.add_system(first);
        schedule.add_system(second);
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(
            world.resource::<Trace>().0,
            vec!["first", "second", "first", "second"]
        );
    }

    #[test]
    fn schedule_captures_system_name() {
        let mut schedule = Schedule::new();
        schedule.add_system(first);
        schedule.add_system(|_world: &mut World| {});
        assert_eq!(schedule.systems[0].name, "first");
        assert_eq!(schedule.systems[1].name, "schedule_captures_system_name");
        assert_eq!(schedule.len(), 2);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn run_records_one_timing_per_system() {
        let mut world = World::new();
        world.insert_resource(Trace::default());
        let mut schedule = Schedule::new();
        schedule.add_system(first);
        schedule.add_system(second);
        schedule.run(&mut world);
        let names: Vec<_> = schedule.timings().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
