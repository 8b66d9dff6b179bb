//! Band compressor benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use td_core::Band;
use td_dsp::compressor::{CompressorBand, CompressorSettings, NEPER_PER_DB};

fn bench_expander_path(c: &mut Criterion) {
    let mut band = CompressorBand::for_band(Band::Mid, 48000.0);
    let powers: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.02).sin().powi(2)).collect();

    c.bench_function("compressor_expander_1024", |b| {
        b.iter(|| {
            for &p in black_box(&powers) {
                black_box(band.process(p, 1.0, 1.0, NEPER_PER_DB));
            }
        })
    });
}

fn bench_main_path(c: &mut Criterion) {
    let settings = CompressorSettings {
        ratio: -1.0,
        ..CompressorSettings::for_band(Band::Low)
    };
    let mut band = CompressorBand::new(settings, 48000.0);
    let powers: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.02).sin().powi(2)).collect();

    c.bench_function("compressor_main_1024", |b| {
        b.iter(|| {
            for &p in black_box(&powers) {
                black_box(band.process(p, 1.0, 1.0, NEPER_PER_DB));
            }
        })
    });
}

criterion_group!(benches, bench_expander_path, bench_main_path);
criterion_main!(benches);
