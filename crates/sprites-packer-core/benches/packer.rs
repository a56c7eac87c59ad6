use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use sprites_packer_core::prelude::*;
use std::hint::black_box;

fn generate_rects(count: usize, min_size: u32, max_size: u32) -> Vec<PlaceableRect> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            PlaceableRect::new(i, w, h)
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for count in [100usize, 500, 2000] {
        let rects = generate_rects(count, 8, 96);
        group.throughput(Throughput::Elements(count as u64));
        for padding in [0u32, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("padding_{padding}"), count),
                &rects,
                |b, rects| {
                    let packer = RectanglePacker::with_limits(1024, 1024, padding);
                    b.iter(|| black_box(packer.pack(rects.clone()).expect("pack")));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pack);
criterion_main!(benches);
