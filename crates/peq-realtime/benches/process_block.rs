//! Audio callback benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use peq_core::{ChainSettings, Slope};
use peq_realtime::{EngineConfig, EqEngine, ParameterStore};
use std::sync::Arc;

fn bench_process_block(c: &mut Criterion) {
    let store = Arc::new(ParameterStore::from_settings(&ChainSettings {
        high_pass_freq: 60.0,
        low_pass_freq: 14000.0,
        peak_freq: 2500.0,
        peak_gain_db: -3.0,
        peak_quality: 1.4,
        high_pass_slope: Slope::Db48,
        low_pass_slope: Slope::Db24,
    }));
    // Filter path only; the analyzer FIFO would fill up without an editor
    let config = EngineConfig {
        analyzer_enabled: false,
        ..Default::default()
    };
    let engine = EqEngine::new(config, store);
    let Ok((mut audio, _editor)) = engine.prepare(48000.0, 512) else {
        return;
    };

    let mut left: Vec<f64> = (0..512).map(|i| (i as f64 * 0.01).sin()).collect();
    let mut right = left.clone();

    c.bench_function("engine_process_block_512", |b| {
        b.iter(|| {
            audio.process_block(
                black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]),
                48000.0,
            );
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let store = ParameterStore::new();
    c.bench_function("parameter_snapshot", |b| b.iter(|| black_box(store.snapshot())));
}

criterion_group!(benches, bench_process_block, bench_snapshot);
criterion_main!(benches);
