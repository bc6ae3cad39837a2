use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Array3;
use num_complex::Complex64;
use std::hint::black_box;
use xtal_core::mappings::Mappings;
use xtal_types::config::{RunParams, SpaceGroupId};

fn solid(shape: [usize; 3]) -> Array3<Complex64> {
    Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(i, j, k)| {
        if i < shape[0] / 4 && j < shape[1] / 4 && k < shape[2] / 4 {
            Complex64::new(1.0 + (i + j + k) as f64 * 0.1, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    })
}

fn bench_solid_syms_p212121(c: &mut Criterion) {
    let mut params = RunParams::new(SpaceGroupId::P212121, [16.0, 16.0, 8.0], [32, 32, 16]);
    params.disorder.n = 20.0;
    params.disorder.sigma = 0.3;
    let maps = Mappings::new(&params).unwrap();
    let x = solid([32, 32, 16]);

    c.bench_function("solid_syms_p212121_32x32x16", |b| {
        b.iter(|| black_box(maps.solid_syms(&x).unwrap()))
    });
}

fn bench_predicted_intensity(c: &mut Criterion) {
    let mut params = RunParams::new(SpaceGroupId::P212121, [32.0, 32.0, 32.0], [64, 64, 64]);
    params.disorder.n = 20.0;
    params.disorder.sigma = 0.3;
    let maps = Mappings::new(&params).unwrap();
    let x = solid([64, 64, 64]);

    let mut group = c.benchmark_group("predicted_intensity_64^3");
    group.sample_size(10);

    group.bench_function("from_solid", |b| {
        b.iter(|| black_box(maps.predicted_intensity(&x).unwrap()[[1, 1, 1]]))
    });

    let syms = maps.solid_syms(&x).unwrap();
    group.bench_function("from_syms", |b| {
        b.iter(|| black_box(maps.predicted_intensity_from_syms(&syms).unwrap()[[1, 1, 1]]))
    });

    group.finish();
}

criterion_group!(benches, bench_solid_syms_p212121, bench_predicted_intensity);
criterion_main!(benches);
