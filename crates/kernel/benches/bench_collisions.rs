use std::hint::black_box;
use std::time::Instant;

use actorloop_assets::{AssetStore, BUILTIN_CUBE};
use actorloop_kernel::{BehaviorKind, DebugOverlay, EntityRegistry};
use glam::Vec3;

fn make_registry(assets: &mut AssetStore, entity_count: usize, spacing: f32) -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    let side = (entity_count as f32).sqrt().ceil() as usize;
    for i in 0..entity_count {
        let x = (i % side) as f32 * spacing;
        let z = (i / side) as f32 * spacing;
        let handle = assets.load(BUILTIN_CUBE).expect("builtin cube");
        registry
            .insert_end(assets, handle, Vec3::new(x, 0.0, z), BehaviorKind::default())
            .expect("insert");
    }
    registry
        .update_bounding_volumes(assets)
        .expect("bounding volumes");
    registry
}

fn bench_detect(entity_count: usize, spacing: f32, iterations: usize) {
    let mut assets = AssetStore::new();
    let mut registry = make_registry(&mut assets, entity_count, spacing);
    let mut overlay = DebugOverlay::default();

    let start = Instant::now();
    let mut contacts = 0;
    for _ in 0..iterations {
        contacts = black_box(registry.detect_collisions(&mut overlay)).len();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  detect ({entity_count} entities, spacing {spacing}, {iterations} iters): {per_iter:?}/iter, {contacts} contacts"
    );
    registry.destroy(&mut assets).expect("teardown");
}

fn bench_bounding_volumes(entity_count: usize, iterations: usize) {
    let mut assets = AssetStore::new();
    let mut registry = make_registry(&mut assets, entity_count, 2.0);

    let start = Instant::now();
    for _ in 0..iterations {
        registry
            .update_bounding_volumes(black_box(&assets))
            .expect("bounding volumes");
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  bounding volumes ({entity_count} entities, {iterations} iters): {per_iter:?}/iter");
    registry.destroy(&mut assets).expect("teardown");
}

fn main() {
    println!("=== collision detection (O(n^2)) ===");
    for &n in &[10, 100, 500] {
        bench_detect(n, 2.0, 100);
        bench_detect(n, 0.5, 100);
    }

    println!("=== bounding volume refresh ===");
    for &n in &[100, 1_000, 10_000] {
        bench_bounding_volumes(n, 100);
    }
}
