//! EQ engine facade
//!
//! `EqEngine::prepare` allocates everything and splits the engine into an
//! [`AudioHandle`] for the real-time callback and an [`EditorHandle`] for the
//! UI timer. After that the audio side never allocates, locks or logs.

use log::{debug, info};
use peq_core::{PeqError, PeqResult, Sample, is_valid_sample_rate};
use peq_dsp::{ChainMonitor, MonoProcessor, Processor, SharedChain, StereoChain, StereoProcessor, design_chain};
use peq_viz::{AnalyzerPath, DbRange, PathProducer, PathVertex, RenderArea, ResponseCurve};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::fifo::{BlockConsumer, ChannelSampleFifo};
use crate::state::ParameterStore;

/// Analysis channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Left,
    Right,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

/// Configuration plus the live parameters, before any allocation
#[derive(Debug, Clone)]
pub struct EqEngine {
    config: EngineConfig,
    store: Arc<ParameterStore>,
}

impl EqEngine {
    pub fn new(config: EngineConfig, store: Arc<ParameterStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    /// Validate and allocate for `sample_rate` and host blocks of up to
    /// `max_block` samples
    pub fn prepare(
        &self,
        sample_rate: f64,
        max_block: usize,
    ) -> PeqResult<(AudioHandle, EditorHandle)> {
        if !is_valid_sample_rate(sample_rate) {
            return Err(PeqError::InvalidSampleRate(sample_rate));
        }
        if max_block == 0 {
            return Err(PeqError::InvalidBlockSize(max_block));
        }
        self.config.validate()?;

        let config = self.config;
        let shared = Arc::new(SharedChain::new());
        let settings = self.store.snapshot().sanitized(sample_rate);
        shared.publish(&design_chain(&settings, sample_rate));

        let fifo_block = max_block.min(config.analyzer.fft_size());
        let mut fifos = [ChannelSampleFifo::new(), ChannelSampleFifo::new()];
        let mut producers = Vec::with_capacity(Channel::ALL.len());
        for fifo in &mut fifos {
            let consumer = fifo.prepare(fifo_block, config.fifo_capacity_blocks)?;
            producers.push(PathProducer::new(consumer, &config.analyzer, config.path)?);
        }
        let [left_producer, right_producer]: [PathProducer<BlockConsumer>; 2] =
            producers.try_into().map_err(|_| {
                PeqError::InvalidConfig("expected one analysis producer per channel".into())
            })?;

        let mut curve = ResponseCurve::new(sample_rate);
        curve.update(&settings);

        info!(
            "EQ prepared: {} Hz, max block {}, analysis block {}, FFT {} ({:?})",
            sample_rate,
            max_block,
            fifo_block,
            config.analyzer.fft_size(),
            config.analyzer.window
        );

        let audio = AudioHandle {
            store: Arc::clone(&self.store),
            chains: StereoChain::new(Arc::clone(&shared)),
            shared,
            fifos,
            sample_rate,
            analyzer_enabled: config.analyzer_enabled,
        };
        let editor = EditorHandle {
            store: Arc::clone(&self.store),
            curve,
            producers: [left_producer, right_producer],
            sample_rate,
            response_range: config.response_range,
            analysis_area: RenderArea::default(),
            analysis_range: config.path.db_range,
            reported_drops: 0,
        };
        Ok((audio, editor))
    }
}

// ============================================================================
// AUDIO SIDE
// ============================================================================

/// Real-time half: filter chains and the FIFO producers
#[derive(Debug)]
pub struct AudioHandle {
    store: Arc<ParameterStore>,
    shared: Arc<SharedChain>,
    chains: StereoChain,
    fifos: [ChannelSampleFifo; 2],
    sample_rate: f64,
    analyzer_enabled: bool,
}

impl AudioHandle {
    /// Snapshot, design and publish, then filter in place and feed the
    /// analyzer. A mono buffer runs the left chain only; channels past the
    /// second are left untouched. An invalid `sample_rate` falls back to
    /// the prepared one.
    pub fn process_block(&mut self, channels: &mut [&mut [Sample]], sample_rate: f64) {
        if is_valid_sample_rate(sample_rate) {
            self.sample_rate = sample_rate;
        }
        let settings = self.store.snapshot().sanitized(self.sample_rate);
        self.shared.publish(&design_chain(&settings, self.sample_rate));

        match channels {
            [] => {}
            [mono] => {
                self.chains.left_mut().process_block(mono);
                if self.analyzer_enabled {
                    self.fifos[Channel::Left.index()].update(mono);
                }
            }
            [left, right, ..] => {
                let frames = left.len().min(right.len());
                self.chains
                    .process_block(&mut left[..frames], &mut right[..frames]);
                if self.analyzer_enabled {
                    self.push_analysis_block(&left[..frames], &right[..frames]);
                }
            }
        }
    }

    /// Feed already-processed samples to the analyzer FIFOs
    pub fn push_analysis_block(&mut self, left: &[Sample], right: &[Sample]) {
        self.fifos[Channel::Left.index()].update(left);
        self.fifos[Channel::Right.index()].update(right);
    }

    /// Linear magnitude of the published audio chain
    pub fn magnitude_response(&self, freq: f64) -> f64 {
        self.shared.magnitude_at(freq, self.sample_rate)
    }

    /// Read and bypass access to the audio bank for other threads. Only
    /// `process_block` writes its coefficients.
    pub fn published_chain(&self) -> ChainMonitor {
        ChainMonitor::new(Arc::clone(&self.shared))
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Clear filter memory
    pub fn reset(&mut self) {
        self.chains.reset();
    }
}

// ============================================================================
// EDITOR SIDE
// ============================================================================

/// UI half: response curve and the two analyzer paths
#[derive(Debug)]
pub struct EditorHandle {
    store: Arc<ParameterStore>,
    curve: ResponseCurve,
    producers: [PathProducer<BlockConsumer>; 2],
    sample_rate: f64,
    response_range: DbRange,
    analysis_area: RenderArea,
    analysis_range: DbRange,
    reported_drops: u64,
}

impl EditorHandle {
    /// Timer tick. Recomputes the response curve if parameters changed since
    /// the last tick and drains both analyzer channels. Returns whether the
    /// curve was recomputed.
    pub fn refresh(&mut self) -> bool {
        let recomputed = self.store.take_changed();
        if recomputed {
            self.curve.update(&self.store.snapshot());
        }

        for producer in &mut self.producers {
            producer.process(self.sample_rate, self.analysis_area, self.analysis_range);
        }

        let dropped = self.dropped_blocks();
        if dropped > self.reported_drops {
            debug!(
                "analysis FIFO dropped {} blocks ({} total)",
                dropped - self.reported_drops,
                dropped
            );
            self.reported_drops = dropped;
        }
        recomputed
    }

    /// Linear magnitude of the response curve
    pub fn magnitude_response(&self, freq: f64) -> f64 {
        self.curve.magnitude_at(freq)
    }

    pub fn response_curve(&self) -> &ResponseCurve {
        &self.curve
    }

    pub fn response_curve_path(&self, area: RenderArea) -> Vec<PathVertex> {
        self.curve.path(area, self.response_range)
    }

    /// Drain `channel` and return its path laid out for `area` and `range`
    pub fn pull_analysis_path(
        &mut self,
        channel: Channel,
        area: RenderArea,
        range: DbRange,
    ) -> &AnalyzerPath {
        self.analysis_area = area;
        self.analysis_range = range;
        let producer = &mut self.producers[channel.index()];
        producer.process(self.sample_rate, area, range);
        producer.path()
    }

    /// Analysis blocks lost on both channels
    pub fn dropped_blocks(&self) -> u64 {
        self.producers
            .iter()
            .map(|producer| producer.source().dropped_blocks())
            .sum()
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
