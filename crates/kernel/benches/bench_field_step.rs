use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use lightfield_kernel::{BoxField, SceneConfig};

fn bench_generate(count: usize, iterations: usize) {
    let config = SceneConfig::default();
    let mut field = BoxField::with_count(&config, count, 1);

    let start = Instant::now();
    for _ in 0..iterations {
        field.regenerate_with_count(black_box(&config), black_box(count));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  generate ({count} boxes, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_step(count: usize, light: Vec3, iterations: usize) {
    let mut config = SceneConfig::default();
    if let Err(e) = config.set_light_position(light) {
        panic!("bad light position: {e}");
    }
    let mut field = BoxField::with_count(&config, count, 7);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(field.step(black_box(1.0 / 60.0), &config));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  step ({count} boxes, light={light}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Box Field Benchmarks ===\n");

    println!("Generate:");
    bench_generate(1000, 200);
    bench_generate(4000, 50);

    println!("\nStep (light in the field):");
    bench_step(1000, Vec3::ZERO, 2000);
    bench_step(4000, Vec3::ZERO, 500);

    println!("\nStep (light outside the field):");
    bench_step(4000, Vec3::splat(20.0), 500);

    println!("\n=== Done ===");
}
