use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geodyn::collision::{find_next_collision, find_next_collision_parallel};
use geodyn::geometry::Ellipse;
use geodyn::particle::generate_random_particles;

pub fn criterion_benchmark(c: &mut Criterion) {
    let ellipse = Ellipse::new(2.0, 1.0).unwrap();
    let mut group = c.benchmark_group("pair_scan");
    for n in [32, 64, 128, 256] {
        let particles =
            generate_random_particles(n, 1.0, 0.005, &ellipse, -1.0..1.0, 42).unwrap();
        group.bench_with_input(BenchmarkId::new("serial", n), &particles, |b, particles| {
            b.iter(|| find_next_collision(&ellipse, black_box(particles), 1.0, 1e-9))
        });
        group.bench_with_input(
            BenchmarkId::new("parallel", n),
            &particles,
            |b, particles| {
                b.iter(|| find_next_collision_parallel(&ellipse, black_box(particles), 1.0, 1e-9))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
