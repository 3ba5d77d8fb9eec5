//! DSP Integration Tests
//!
//! Tests complete signal flow through the filter cascade.
//! Verifies:
//! - Measured streaming gain matches the designed response
//! - Full signal path integrity (no NaN/Inf)
//! - Coefficient updates while streaming stay click-free and finite
//! - Spectrum frames of filtered audio

use peq_core::{ChainSettings, Decibels, Slope};
use peq_dsp::analysis::{AnalyzerConfig, FftDataGenerator};
use peq_dsp::{FilterChain, MonoProcessor, Processor, SharedChain, StereoChain, StereoProcessor, design_chain};
use std::sync::Arc;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZE: usize = 256;

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Check signal has no NaN or Infinity
fn is_valid_signal(signal: &[f64]) -> bool {
    signal.iter().all(|&x| x.is_finite())
}

/// Calculate RMS of signal
fn rms(signal: &[f64]) -> f64 {
    let sum: f64 = signal.iter().map(|x| x * x).sum();
    (sum / signal.len() as f64).sqrt()
}

fn reference_settings() -> ChainSettings {
    ChainSettings {
        high_pass_freq: 100.0,
        low_pass_freq: 10000.0,
        peak_freq: 1000.0,
        peak_gain_db: 6.0,
        peak_quality: 1.0,
        high_pass_slope: Slope::Db12,
        low_pass_slope: Slope::Db12,
    }
}

fn chain_for(settings: &ChainSettings) -> FilterChain {
    let shared = Arc::new(SharedChain::new());
    shared.publish(&design_chain(settings, SAMPLE_RATE));
    FilterChain::new(shared)
}

/// Steady-state gain in dB of a sine pushed through the chain in blocks
fn measured_gain_db(chain: &mut FilterChain, freq: f64) -> f64 {
    chain.reset();
    let input = generate_sine(SAMPLE_RATE as usize, freq);
    let mut output = input.clone();
    for block in output.chunks_mut(BLOCK_SIZE) {
        chain.process_block(block);
    }
    assert!(is_valid_signal(&output));
    // Skip the first half second of settling
    let half = input.len() / 2;
    Decibels::from_gain(rms(&output[half..]) / rms(&input[half..])).0
}

#[test]
fn test_reference_settings_response() {
    let settings = reference_settings();
    let mut chain = chain_for(&settings);

    let at_peak = measured_gain_db(&mut chain, 1000.0);
    assert!((at_peak - 6.0).abs() < 0.5, "1 kHz gain {at_peak}");
    assert!(measured_gain_db(&mut chain, 50.0) < -3.0);
    assert!(measured_gain_db(&mut chain, 15000.0) < -3.0);
}

#[test]
fn test_measured_gain_tracks_published_magnitude() {
    let settings = ChainSettings {
        high_pass_freq: 200.0,
        low_pass_freq: 8000.0,
        peak_freq: 2500.0,
        peak_gain_db: -9.0,
        peak_quality: 2.0,
        high_pass_slope: Slope::Db36,
        low_pass_slope: Slope::Db24,
    };
    let mut chain = chain_for(&settings);

    for &freq in &[150.0, 500.0, 2500.0, 6000.0, 11000.0] {
        let designed = Decibels::from_gain(chain.magnitude_at(freq, SAMPLE_RATE)).0;
        let measured = measured_gain_db(&mut chain, freq);
        assert!(
            (designed - measured).abs() < 0.5,
            "{freq} Hz: designed {designed}, measured {measured}"
        );
    }
}

#[test]
fn test_republish_while_streaming() {
    let shared = Arc::new(SharedChain::new());
    let mut stereo = StereoChain::new(Arc::clone(&shared));
    let mut left = generate_sine(SAMPLE_RATE as usize, 440.0);
    let mut right = generate_sine(SAMPLE_RATE as usize, 660.0);

    let mut settings = reference_settings();
    for (i, (l, r)) in left
        .chunks_mut(BLOCK_SIZE)
        .zip(right.chunks_mut(BLOCK_SIZE))
        .enumerate()
    {
        // Sweep every control once per block
        settings.peak_freq = 200.0 + (i % 50) as f64 * 150.0;
        settings.peak_gain_db = ((i % 24) as f64 - 12.0) * 2.0;
        settings.high_pass_slope = Slope::from_index(i % 4);
        settings.low_pass_slope = Slope::from_index((i / 4) % 4);
        shared.publish(&design_chain(&settings.sanitized(SAMPLE_RATE), SAMPLE_RATE));
        stereo.process_block(l, r);
    }

    assert!(is_valid_signal(&left));
    assert!(is_valid_signal(&right));
    assert!(left.iter().chain(&right).all(|s| s.abs() < 50.0));
}

#[test]
fn test_spectrum_of_filtered_signal() {
    let settings = ChainSettings {
        low_pass_freq: 2000.0,
        low_pass_slope: Slope::Db48,
        ..Default::default()
    };
    let mut chain = chain_for(&settings);

    // Two tones, one far above the low-pass cutoff
    let low = generate_sine(8192, 500.0);
    let high = generate_sine(8192, 12000.0);
    let mut mix: Vec<f64> = low.iter().zip(&high).map(|(a, b)| 0.5 * (a + b)).collect();
    for block in mix.chunks_mut(BLOCK_SIZE) {
        chain.process_block(block);
    }

    let mut generator = FftDataGenerator::new(&AnalyzerConfig::default()).unwrap();
    assert!(generator.produce(&mix, -48.0));
    let frame = generator.pop_frame().unwrap();

    let width = generator.bin_width(SAMPLE_RATE);
    let low_bin = (500.0 / width).round() as usize;
    let high_bin = (12000.0 / width).round() as usize;
    assert!(frame[low_bin] > -10.0);
    assert!(frame[high_bin] <= -47.0);
}
