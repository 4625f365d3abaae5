// SPDX-License-Identifier: MIT OR Apache-2.0

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ila_align::{CostMatrix, min_cost_assignment};

fn deterministic_costs(rows: usize, cols: usize) -> Vec<f64> {
    // Cheap LCG so the matrix is stable across runs without a rand dep.
    let mut state = 0x2545F491_4F6CDD1Du64;
    (0..rows * cols)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 40) as f64 / (1u64 << 24) as f64
        })
        .collect()
}

fn bench_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("min_cost_assignment");
    for size in [16usize, 64, 128] {
        let matrix = CostMatrix::new(size, size, deterministic_costs(size, size))
            .expect("bench matrix should be valid");
        group.bench_function(format!("square_{size}"), |b| {
            b.iter(|| min_cost_assignment(black_box(&matrix)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_assignment);
criterion_main!(benches);
