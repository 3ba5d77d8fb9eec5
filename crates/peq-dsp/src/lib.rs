//! peq-dsp: filter math and spectrum analysis for the parametric EQ
//!
//! ## Modules
//! - `biquad` - RBJ coefficients and the TDF-II biquad
//! - `design` - peak and Butterworth cut designs from a settings snapshot
//! - `shared` - seqlock cell for publishing coefficients across threads
//! - `chain` - fixed nine-slot cascade (high-pass x4, peak, low-pass x4)
//! - `analysis` - windows, analysis ring, FFT frame generator

pub mod analysis;
pub mod biquad;
pub mod chain;
pub mod design;
pub mod shared;

pub use analysis::{AnalysisRing, AnalyzerConfig, FftDataGenerator, WindowFunction};
pub use biquad::{BiquadCoeffs, BiquadTDF2};
pub use chain::{ChainMonitor, ChainPosition, FilterChain, NUM_STAGES, SharedChain, StageId, StereoChain};
pub use design::{
    ChainDesign, CutDesign, CutKind, design_chain, make_high_pass_filter, make_low_pass_filter,
    make_peak_filter,
};
pub use shared::CoefficientCell;

use peq_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Stereo processor trait
pub trait StereoProcessor: Processor {
    /// Process a stereo sample pair
    fn process_sample(&mut self, left: Sample, right: Sample) -> (Sample, Sample);

    /// Process stereo blocks
    fn process_block(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_sample(*l, *r);
        }
    }
}
