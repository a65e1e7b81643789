//! Arena — a headless survival round.
//!
//! A guarded player sits in a walled arena. Hostiles spawn at the edges and
//! walk towards it; a turret on the player fires projectiles at the nearest
//! one. A second thread plays the presentation side, reading the world
//! between ticks the way a renderer would.
//!
//! Run with `RUST_LOG=info cargo run --example arena`; pass a JSON config
//! path as the first argument to override the defaults.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rampage::prelude::*;

const PLAYER: u32 = 1 << 0;
const ENEMY: u32 = 1 << 1;
const BULLET: u32 = 1 << 2;
const WALL: u32 = 1 << 3;

/// Ticks between enemy spawns and between turret shots.
struct Cadence {
    spawn_every: u64,
    fire_every: u64,
}

#[derive(Clone, Copy)]
struct Player(Entity);

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}; falling back to defaults");
                SimConfig::default()
            }
        },
        None => SimConfig::default(),
    };
    let (width, height) = (config.world_width, config.world_height);

    let mut sim = App::with_config(config)
        .add_plugins(PhysicsPlugin)
        .add_plugins(GameplayPlugin)
        .insert_resource(Cadence {
            spawn_every: 20,
            fire_every: 12,
        })
        .setup(|world| build_arena(world, width, height))
        .add_system(spawn_hostiles)
        .add_system(seek_player)
        .add_system(fire_turret)
        .build();

    let running = Arc::new(AtomicBool::new(true));
    let presenter = {
        let handle = sim.handle();
        let running = Arc::clone(&running);
        std::thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                let (entities, state) =
                    handle.frame(|world| (world.entity_count(), *world.resource::<GameState>()));
                log::info!(
                    "frame: {entities} entities, score {}, base {}",
                    state.score,
                    state.base_integrity
                );
                std::thread::sleep(Duration::from_millis(250));
            }
        })
    };

    let start = Instant::now();
    let mut last = start;
    while start.elapsed() < Duration::from_secs(3) {
        let now = Instant::now();
        sim.advance(now - last);
        last = now;
        std::thread::sleep(Duration::from_millis(4));
    }
    running.store(false, Ordering::Relaxed);
    if presenter.join().is_err() {
        log::error!("presentation thread panicked");
    }

    match sim.diagnostics_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("diagnostics: {e}"),
    }
}

fn build_arena(world: &mut World, width: f32, height: f32) {
    let thickness = 20.0;
    let walls = [
        (Vec2::new(width / 2.0, thickness / 2.0), width, thickness),
        (Vec2::new(width / 2.0, height - thickness / 2.0), width, thickness),
        (Vec2::new(thickness / 2.0, height / 2.0), thickness, height),
        (Vec2::new(width - thickness / 2.0, height / 2.0), thickness, height),
    ];
    for (center, w, h) in walls {
        let wall = world.create_entity();
        attach_body(
            world,
            wall,
            BodyDesc::fixed(Fixture::rectangle(0.0, w, h))
                .at(center)
                .with_masks(WALL, PLAYER | ENEMY | BULLET),
        );
    }

    let player = world.create_entity();
    world.add_component(player, Health::new(20));
    world.add_component(player, Guarded);
    attach_body(
        world,
        player,
        BodyDesc::dynamic(Fixture::circle(5.0, 12.0))
            .at(Vec2::new(width / 2.0, height / 2.0))
            .with_masks(PLAYER, ENEMY | WALL)
            .with_linear_damping(0.5),
    );
    world.insert_resource(Player(player));
}

fn spawn_hostiles(world: &mut World) {
    let tick = world.resource::<FixedTime>().tick();
    if tick % world.resource::<Cadence>().spawn_every != 0 {
        return;
    }
    let config = world.resource::<SimConfig>();
    let (width, height) = (config.world_width, config.world_height);
    // Walk the spawn point around the arena edge.
    let corners = [
        Vec2::new(40.0, 40.0),
        Vec2::new(width - 40.0, 40.0),
        Vec2::new(width - 40.0, height - 40.0),
        Vec2::new(40.0, height - 40.0),
    ];
    let at = corners[(tick / world.resource::<Cadence>().spawn_every) as usize % corners.len()];

    let enemy = world.create_entity();
    world.add_component(enemy, Hostile);
    world.add_component(enemy, Health::new(3));
    attach_body(
        world,
        enemy,
        BodyDesc::dynamic(Fixture::rectangle(1.0, 16.0, 16.0))
            .at(at)
            .with_masks(ENEMY, PLAYER | ENEMY | BULLET | WALL),
    );
}

fn seek_player(world: &mut World) {
    let Some(&Player(player)) = world.get_resource::<Player>() else {
        return;
    };
    let Some(target) = world.get::<Transform>(player).map(|t| t.position) else {
        return;
    };
    let hostiles: Vec<(BodyHandle, Vec2)> = Query::of::<(Hostile, Transform, RigidBodyComponent)>()
        .entities(world)
        .into_iter()
        .filter_map(|e| {
            let position = world.get::<Transform>(e)?.position;
            Some((world.get::<RigidBodyComponent>(e)?.handle, position))
        })
        .collect();
    let physics = world.resource_mut::<PhysicsWorld>();
    for (handle, position) in hostiles {
        if let Some(body) = physics.body_mut(handle) {
            let heading = (target - position).normalize_or_zero();
            body.set_linear_velocity(heading * 1.5);
        }
    }
}

fn fire_turret(world: &mut World) {
    let tick = world.resource::<FixedTime>().tick();
    if tick % world.resource::<Cadence>().fire_every != 0 {
        return;
    }
    let Some(&Player(player)) = world.get_resource::<Player>() else {
        return;
    };
    let Some(origin) = world.get::<Transform>(player).map(|t| t.position) else {
        return;
    };

    let mut hostiles = Query::of::<(Hostile, Transform)>();
    let nearest = hostiles
        .entities(world)
        .into_iter()
        .filter_map(|e| world.get::<Transform>(e).map(|t| t.position))
        .min_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)));
    let Some(aim) = nearest else {
        return;
    };
    let heading = (aim - origin).normalize_or_zero();

    let bullet = world.create_entity();
    world.add_component(bullet, Projectile { hits_left: 1 });
    world.add_component(bullet, Lifetime::new(1.5));
    if let Some(handle) = attach_body(
        world,
        bullet,
        BodyDesc::dynamic(Fixture::circle(0.1, 3.0))
            .at(origin + heading * 20.0)
            .with_masks(BULLET, ENEMY | WALL),
    ) {
        if let Some(body) = world.resource_mut::<PhysicsWorld>().body_mut(handle) {
            body.set_linear_velocity(heading * 8.0);
        }
    }
}
