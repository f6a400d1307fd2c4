use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use lumen_core::percentile;

// Dimmer-like samples from a tiny PRNG so runs are reproducible.
fn samples(n: usize, seed: u32) -> Vec<i64> {
    let mut state = seed.max(1);
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            i64::from(state % 256)
        })
        .collect()
}

fn bench_percentile(c: &mut Criterion) {
    // Two weeks of 10s polls in one hour bucket is ~5k samples.
    for n in [14usize, 500, 5_000] {
        let data = samples(n, 0xC0FFEE);
        c.bench_function(&format!("percentile_p85_n{n}"), |b| {
            b.iter_batched(
                || data.clone(),
                |v| black_box(percentile(black_box(&v), 85.0)),
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_percentile);
criterion_main!(benches);
