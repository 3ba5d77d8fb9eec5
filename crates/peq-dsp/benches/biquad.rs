//! Biquad and filter chain benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use peq_core::{ChainSettings, Slope};
use peq_dsp::biquad::{BiquadCoeffs, BiquadTDF2};
use peq_dsp::{FilterChain, MonoProcessor, SharedChain, design_chain};
use std::sync::Arc;

fn bench_biquad_scalar(c: &mut Criterion) {
    let mut filter = BiquadTDF2::with_coeffs(BiquadCoeffs::lowpass(1000.0, 0.707, 48000.0));

    let mut buffer: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.01).sin()).collect();

    c.bench_function("biquad_scalar_1024", |b| {
        b.iter(|| {
            filter.process_block(black_box(&mut buffer));
        })
    });
}

fn bench_filter_chain(c: &mut Criterion) {
    let settings = ChainSettings {
        high_pass_freq: 80.0,
        low_pass_freq: 12000.0,
        peak_gain_db: 4.0,
        high_pass_slope: Slope::Db48,
        low_pass_slope: Slope::Db24,
        ..Default::default()
    };
    let shared = Arc::new(SharedChain::new());
    shared.publish(&design_chain(&settings, 48000.0));
    let mut chain = FilterChain::new(shared);

    let mut buffer: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.01).sin()).collect();

    c.bench_function("filter_chain_1024", |b| {
        b.iter(|| {
            chain.process_block(black_box(&mut buffer));
        })
    });
}

fn bench_publish(c: &mut Criterion) {
    let shared = SharedChain::new();
    let settings = ChainSettings::default();

    c.bench_function("design_and_publish", |b| {
        b.iter(|| {
            shared.publish(&design_chain(black_box(&settings), 48000.0));
        })
    });
}

criterion_group!(benches, bench_biquad_scalar, bench_filter_chain, bench_publish);
criterion_main!(benches);
