use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_reference_distributions(c: &mut Criterion) {
    let xs: Vec<f64> = (0..10_000).map(|i| (i as f64) * 0.0005).collect();

    c.bench_function("student_t_sf_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += sw_prob::student_t::sf(x, 7.0).unwrap();
            }
            black_box(acc)
        })
    });

    c.bench_function("fisher_f_sf_10k", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += sw_prob::fisher_f::sf(x, 3.0, 20.0).unwrap();
            }
            black_box(acc)
        })
    });

    c.bench_function("chi_squared_quantile_100", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for i in 1..100 {
                acc += sw_prob::chi_squared::quantile(i as f64 / 100.0, 4.0).unwrap();
            }
            black_box(acc)
        })
    });
}

fn bench_studentized_range(c: &mut Criterion) {
    c.bench_function("studentized_range_cdf", |b| {
        b.iter(|| black_box(sw_prob::studentized_range::cdf(black_box(3.5), 4.0, 20.0).unwrap()))
    });
    c.bench_function("studentized_range_quantile", |b| {
        b.iter(|| {
            black_box(sw_prob::studentized_range::quantile(black_box(0.95), 4.0, 20.0).unwrap())
        })
    });
}

criterion_group!(benches, bench_reference_distributions, bench_studentized_range);
criterion_main!(benches);
