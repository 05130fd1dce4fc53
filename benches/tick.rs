//! Benchmarks for the CPU side of a simulation tick.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{UVec2, Vec2};

use fieldviz::actors::{compute_actors, ActorSet, DefaultScene};
use fieldviz::shaders::update_shader;
use fieldviz::surface::{grow_to_cover, DEFAULT_MAX_SURFACE};

fn bench_actors(c: &mut Criterion) {
    let mut group = c.benchmark_group("actors");
    let grid = Vec2::new(768.0, 480.0);

    group.bench_function("compute_default_scene", |b| {
        let mut tick = 0u32;
        b.iter(|| {
            tick = tick.wrapping_add(1);
            black_box(compute_actors(&DefaultScene, black_box(tick), grid))
        })
    });

    group.bench_function("live_ranges", |b| {
        let actors = compute_actors(&DefaultScene, 42, grid);
        b.iter(|| black_box(actors.live_ranges()))
    });

    for count in [1usize, 8, 16] {
        group.bench_with_input(BenchmarkId::new("fill", count), &count, |b, &count| {
            let mut actors = ActorSet::new();
            b.iter(|| {
                actors.clear();
                for i in 0..count {
                    actors.add_vortex(Vec2::splat(i as f32), 1.0);
                    actors.add_pusher(Vec2::splat(i as f32), -1.0);
                }
                black_box(bytemuck::bytes_of(actors.block()).len())
            })
        });
    }

    group.finish();
}

fn bench_surface_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface");

    group.bench_function("covered", |b| {
        let current = UVec2::new(2048, 1024);
        let required = UVec2::new(1560, 960);
        b.iter(|| black_box(grow_to_cover(current, black_box(required), DEFAULT_MAX_SURFACE)))
    });

    group.bench_function("resize_drag", |b| {
        b.iter(|| {
            let mut size = UVec2::ZERO;
            for w in (800..1900).step_by(7) {
                let required = UVec2::new(w, 900);
                if let Ok(Some(next)) = grow_to_cover(size, required, DEFAULT_MAX_SURFACE) {
                    size = next;
                }
            }
            black_box(size)
        })
    });

    group.finish();
}

fn bench_shader_gen(c: &mut Criterion) {
    c.bench_function("update_shader", |b| {
        b.iter(|| black_box(update_shader(black_box(UVec2::new(16, 16)))))
    });
}

criterion_group!(benches, bench_actors, bench_surface_policy, bench_shader_gen);
criterion_main!(benches);
