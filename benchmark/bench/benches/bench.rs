use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use bench::{dispatch_gemm, stored_sizes, GemmBackend};
use stra_base::StraPar;
use stra_dev::{random_matrix_uniform, ABLayout, Bound};

trait BenchmarkType {
    type T: bench::BenchScalar + Bound + Default;
    const ONE: Self::T;
    const ZERO: Self::T;
}

struct BenchmarkF32;
impl BenchmarkType for BenchmarkF32 {
    type T = f32;
    const ONE: f32 = 1.0;
    const ZERO: f32 = 0.0;
}

struct BenchmarkF64;
impl BenchmarkType for BenchmarkF64 {
    type T = f64;
    const ONE: f64 = 1.0;
    const ZERO: f64 = 0.0;
}

#[cfg(not(feature = "bench-f32"))]
type MainBenchmarkType = BenchmarkF64;
#[cfg(feature = "bench-f32")]
type MainBenchmarkType = BenchmarkF32;

fn bench_square(c: &mut Criterion) {
    let mut group = c.benchmark_group("square");
    let layout = ABLayout::NN;
    let par = StraPar::from_env();
    let mnk_vec = vec![
        // 128, 256,
        512, 1024, 2048,
    ];
    for dt in mnk_vec {
        let (a_len, b_len) = stored_sizes(&layout, dt, dt, dt);
        let mut a = vec![<MainBenchmarkType as BenchmarkType>::T::default(); a_len];
        let mut b = vec![<MainBenchmarkType as BenchmarkType>::T::default(); b_len];
        let mut c_vec = vec![<MainBenchmarkType as BenchmarkType>::T::default(); dt * dt];
        random_matrix_uniform(&mut a);
        random_matrix_uniform(&mut b);
        for (name, backend) in [("blocked", GemmBackend::Blocked), ("strassen", GemmBackend::Strassen)] {
            group.bench_with_input(BenchmarkId::new(name, dt), &dt, |bench_b, &dt| {
                bench_b.iter(|| {
                    dispatch_gemm(
                        backend,
                        &layout,
                        dt,
                        dt,
                        dt,
                        MainBenchmarkType::ONE,
                        &a,
                        &b,
                        MainBenchmarkType::ZERO,
                        &mut c_vec,
                        &par,
                    )
                })
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(10);
    targets = bench_square
);
criterion_main!(benches);
