//! Full engine benchmarks

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use td_core::ParameterId;
use td_engine::{Engine, EngineConfig};

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_process");

    for (name, advanced) in [("simple", 0.0), ("advanced", 1.0)] {
        for block in [64usize, 512] {
            let (mut engine, ctl) = Engine::new(EngineConfig::with_sample_rate(48000.0));
            ctl.set(ParameterId::AdvancedMode, advanced);

            let left: Vec<f64> = (0..block).map(|i| (i as f64 * 0.01).sin()).collect();
            let right: Vec<f64> = (0..block).map(|i| (i as f64 * 0.013).cos()).collect();
            let mut out_l = vec![0.0; block];
            let mut out_r = vec![0.0; block];

            group.bench_with_input(BenchmarkId::new(name, block), &block, |b, &block| {
                b.iter(|| {
                    engine.process(
                        black_box(&[left.as_slice(), right.as_slice()]),
                        &mut [out_l.as_mut_slice(), out_r.as_mut_slice()],
                        block,
                    );
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
