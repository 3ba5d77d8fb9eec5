//! Spectrum analysis: windowing, rolling analysis buffer, FFT frames
//!
//! Runs on the UI side of the FIFO. Frames are dB magnitude vectors handed
//! over through a bounded queue; when the consumer falls behind, new frames
//! are dropped and counted.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::debug;
use peq_core::{Decibels, PeqError, PeqResult, Sample};
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

// ============================================================================
// VALIDATION CONSTANTS
// ============================================================================

/// Smallest FFT order (64 points)
pub const MIN_FFT_ORDER: usize = 6;
/// Largest FFT order (32768 points)
pub const MAX_FFT_ORDER: usize = 15;
/// 2048 points
pub const DEFAULT_FFT_ORDER: usize = 11;
/// Frames held in the FFT queue before new ones are dropped
pub const DEFAULT_QUEUE_FRAMES: usize = 16;
/// Floor for analyzer dB values
pub const DEFAULT_NEGATIVE_INFINITY_DB: f64 = -48.0;

/// Analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowFunction {
    Rectangular,
    Hann,
    Blackman,
    #[default]
    BlackmanHarris,
}

impl WindowFunction {
    /// Periodic window value at `index` of `size`
    pub fn value(self, index: usize, size: usize) -> f64 {
        let x = index as f64 / size as f64;
        match self {
            WindowFunction::Rectangular => 1.0,
            WindowFunction::Hann => 0.5 - 0.5 * (2.0 * PI * x).cos(),
            WindowFunction::Blackman => {
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            }
            WindowFunction::BlackmanHarris => {
                let a0 = 0.35875;
                let a1 = 0.48829;
                let a2 = 0.14128;
                let a3 = 0.01168;
                a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
                    - a3 * (6.0 * PI * x).cos()
            }
        }
    }

    pub fn coefficients(self, size: usize) -> Vec<f64> {
        (0..size).map(|i| self.value(i, size)).collect()
    }
}

/// Analyzer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub fft_order: usize,
    pub window: WindowFunction,
    pub negative_infinity_db: f64,
    pub queue_frames: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_order: DEFAULT_FFT_ORDER,
            window: WindowFunction::default(),
            negative_infinity_db: DEFAULT_NEGATIVE_INFINITY_DB,
            queue_frames: DEFAULT_QUEUE_FRAMES,
        }
    }
}

impl AnalyzerConfig {
    pub fn fft_size(&self) -> usize {
        1 << self.fft_order
    }

    pub fn validate(&self) -> PeqResult<()> {
        if !(MIN_FFT_ORDER..=MAX_FFT_ORDER).contains(&self.fft_order) {
            return Err(PeqError::InvalidFftOrder(self.fft_order));
        }
        if !self.negative_infinity_db.is_finite() || self.negative_infinity_db >= 0.0 {
            return Err(PeqError::InvalidConfig(format!(
                "negative_infinity_db must be finite and below 0, got {}",
                self.negative_infinity_db
            )));
        }
        if self.queue_frames == 0 {
            return Err(PeqError::InvalidConfig("queue_frames must be at least 1".into()));
        }
        Ok(())
    }
}

// ============================================================================
// ANALYSIS RING
// ============================================================================

/// Rolling mono buffer of the most recent `len()` samples
#[derive(Debug, Clone)]
pub struct AnalysisRing {
    buffer: Vec<Sample>,
}

impl AnalysisRing {
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
        }
    }

    /// Shift out the oldest samples and append `block` at the end
    pub fn push_block(&mut self, block: &[Sample]) {
        let size = self.buffer.len();
        if block.len() >= size {
            self.buffer.copy_from_slice(&block[block.len() - size..]);
            return;
        }
        self.buffer.copy_within(block.len().., 0);
        self.buffer[size - block.len()..].copy_from_slice(block);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
    }
}

// ============================================================================
// FFT FRAMES
// ============================================================================

/// Turns sample windows into dB magnitude frames on a bounded queue
pub struct FftDataGenerator {
    fft: Arc<dyn RealToComplex<f64>>,
    fft_size: usize,
    window: Vec<f64>,
    /// Sum of the window over two: bin magnitude of a unit sine
    coherent_gain: f64,
    input: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    sender: Sender<Vec<f64>>,
    receiver: Receiver<Vec<f64>>,
    dropped_frames: u64,
}

impl FftDataGenerator {
    pub fn new(config: &AnalyzerConfig) -> PeqResult<Self> {
        config.validate()?;
        let fft_size = config.fft_size();

        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let window = config.window.coefficients(fft_size);
        let coherent_gain = window.iter().sum::<f64>() / 2.0;
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();
        let (sender, receiver) = bounded(config.queue_frames);

        Ok(Self {
            fft,
            fft_size,
            window,
            coherent_gain,
            input: vec![0.0; fft_size],
            spectrum,
            scratch,
            sender,
            receiver,
            dropped_frames: 0,
        })
    }

    /// Analyze the last `fft_size` samples of `samples` (zero-padded in front
    /// when shorter) and queue the frame. Returns `false` if the queue was
    /// full and the frame was dropped.
    pub fn produce(&mut self, samples: &[Sample], negative_infinity_db: f64) -> bool {
        let take = samples.len().min(self.fft_size);
        let pad = self.fft_size - take;
        self.input[..pad].fill(0.0);
        self.input[pad..].copy_from_slice(&samples[samples.len() - take..]);
        for (x, w) in self.input.iter_mut().zip(&self.window) {
            *x *= w;
        }

        let mut frame = vec![negative_infinity_db; self.num_bins()];
        if self
            .fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .is_ok()
        {
            for (db, bin) in frame.iter_mut().zip(&self.spectrum) {
                let magnitude = bin.norm() / self.coherent_gain;
                *db = Decibels::from_gain_floored(magnitude, negative_infinity_db).0;
            }
        }

        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped_frames += 1;
                debug!("FFT queue full, dropped frame ({} total)", self.dropped_frames);
                false
            }
        }
    }

    /// Oldest queued frame
    pub fn pop_frame(&mut self) -> Option<Vec<f64>> {
        self.receiver.try_recv().ok()
    }

    pub fn available_frames(&self) -> usize {
        self.receiver.len()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Bins per frame, DC through Nyquist
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn bin_width(&self, sample_rate: f64) -> f64 {
        sample_rate / self.fft_size as f64
    }
}

impl std::fmt::Debug for FftDataGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftDataGenerator")
            .field("fft_size", &self.fft_size)
            .field("queued", &self.receiver.len())
            .field("dropped_frames", &self.dropped_frames)
            .finish()
    }
}
