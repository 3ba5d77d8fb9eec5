//! Spectrum analyzer path
//!
//! Drains analysis blocks, runs them through the analysis ring and FFT, and
//! keeps a smoothed dB frame that renders as a log-frequency polyline.

use peq_core::{PeqResult, Sample};
use peq_dsp::{AnalysisRing, AnalyzerConfig, FftDataGenerator};

use crate::common::{DbRange, PathConfig, PathVertex, RenderArea, db_to_y, frequency_to_x};

/// Fixed-size blocks of analysis samples
pub trait BlockSource {
    /// Length of every block
    fn block_size(&self) -> usize;

    /// Copy the oldest block into `out`; `false` when nothing is queued
    fn pop_block(&mut self, out: &mut [Sample]) -> bool;
}

// ============================================================================
// ANALYZER PATH
// ============================================================================

/// Smoothed dB frame plus the geometry it was built for
#[derive(Debug, Clone)]
pub struct AnalyzerPath {
    smoothed_db: Vec<f32>,
    bin_width: f32,
    area: RenderArea,
    range: DbRange,
    config: PathConfig,
}

impl AnalyzerPath {
    pub fn new(config: PathConfig) -> Self {
        Self {
            smoothed_db: Vec::new(),
            bin_width: 0.0,
            area: RenderArea::default(),
            range: config.db_range,
            config,
        }
    }

    /// Blend a new dB frame in. A change of render size, range, frame length
    /// or bin width restarts smoothing from this frame.
    pub fn generate(&mut self, frame_db: &[f64], bin_width: f64, area: RenderArea, range: DbRange) {
        let bin_width = bin_width as f32;
        let restart = area != self.area
            || range != self.range
            || bin_width != self.bin_width
            || frame_db.len() != self.smoothed_db.len();

        if restart {
            self.area = area;
            self.range = range;
            self.bin_width = bin_width;
            self.smoothed_db.clear();
            self.smoothed_db
                .extend(frame_db.iter().map(|&db| range.clamp(db as f32)));
            return;
        }

        let keep = self.config.smoothing;
        for (smoothed, &db) in self.smoothed_db.iter_mut().zip(frame_db) {
            *smoothed = keep * *smoothed + (1.0 - keep) * range.clamp(db as f32);
        }
    }

    pub fn smoothed_db(&self) -> &[f32] {
        &self.smoothed_db
    }

    pub fn area(&self) -> RenderArea {
        self.area
    }

    pub fn range(&self) -> DbRange {
        self.range
    }

    pub fn is_empty(&self) -> bool {
        self.vertices().next().is_none()
    }

    pub fn reset(&mut self) {
        self.smoothed_db.clear();
        self.bin_width = 0.0;
    }

    /// Bins inside the display range, skipping DC
    fn visible_bins(&self) -> std::ops::Range<usize> {
        if self.bin_width <= 0.0 || !self.bin_width.is_finite() || self.area.is_empty() {
            return 0..0;
        }
        let first = (self.config.min_freq / self.bin_width).ceil().max(1.0) as usize;
        let last = (self.config.max_freq / self.bin_width).floor() as usize + 1;
        let end = last.min(self.smoothed_db.len());
        first.min(end)..end
    }

    /// Polyline through the visible bins
    pub fn vertices(&self) -> PathVertices<'_> {
        PathVertices {
            path: self,
            bins: self.visible_bins(),
        }
    }
}

impl Default for AnalyzerPath {
    fn default() -> Self {
        Self::new(PathConfig::default())
    }
}

/// Lazy vertex iterator over an [`AnalyzerPath`]
#[derive(Debug, Clone)]
pub struct PathVertices<'a> {
    path: &'a AnalyzerPath,
    bins: std::ops::Range<usize>,
}

impl Iterator for PathVertices<'_> {
    type Item = PathVertex;

    fn next(&mut self) -> Option<PathVertex> {
        let bin = self.bins.next()?;
        let path = self.path;
        let freq = bin as f32 * path.bin_width;
        let x = frequency_to_x(freq, path.config.min_freq, path.config.max_freq);
        let y = db_to_y(path.smoothed_db[bin], path.range.min_db, path.range.max_db);
        Some(path.area.point(x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bins.size_hint()
    }
}

impl ExactSizeIterator for PathVertices<'_> {}

// ============================================================================
// PATH PRODUCER
// ============================================================================

/// Block source to render-ready path, one per channel
#[derive(Debug)]
pub struct PathProducer<S: BlockSource> {
    source: S,
    block: Vec<Sample>,
    ring: AnalysisRing,
    generator: FftDataGenerator,
    path: AnalyzerPath,
    negative_infinity_db: f64,
}

impl<S: BlockSource> PathProducer<S> {
    pub fn new(source: S, analyzer: &AnalyzerConfig, path: PathConfig) -> PeqResult<Self> {
        path.validate()?;
        let generator = FftDataGenerator::new(analyzer)?;
        Ok(Self {
            block: vec![0.0; source.block_size()],
            ring: AnalysisRing::new(generator.fft_size()),
            generator,
            path: AnalyzerPath::new(path),
            negative_infinity_db: analyzer.negative_infinity_db,
            source,
        })
    }

    /// Drain every ready block, folding each FFT frame into the path as soon
    /// as it is produced so a backlog never overflows the frame queue.
    /// Returns the number of frames consumed.
    pub fn process(&mut self, sample_rate: f64, area: RenderArea, range: DbRange) -> usize {
        let bin_width = self.generator.bin_width(sample_rate);
        let mut frames = 0;
        while self.source.pop_block(&mut self.block) {
            self.ring.push_block(&self.block);
            self.generator.produce(self.ring.samples(), self.negative_infinity_db);
            while let Some(frame) = self.generator.pop_frame() {
                self.path.generate(&frame, bin_width, area, range);
                frames += 1;
            }
        }
        frames
    }

    pub fn path(&self) -> &AnalyzerPath {
        &self.path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn generator(&self) -> &FftDataGenerator {
        &self.generator
    }

    pub fn reset(&mut self) {
        self.ring.reset();
        self.path.reset();
        while self.generator.pop_frame().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const SR: f64 = 48000.0;

    /// In-memory block source
    struct Blocks {
        size: usize,
        queue: VecDeque<Vec<Sample>>,
    }

    impl Blocks {
        fn sine(size: usize, count: usize, freq: f64) -> Self {
            let queue = (0..count)
                .map(|b| {
                    (0..size)
                        .map(|i| {
                            let n = (b * size + i) as f64;
                            (2.0 * std::f64::consts::PI * freq * n / SR).sin()
                        })
                        .collect()
                })
                .collect();
            Self { size, queue }
        }

        fn silence_then_sine(size: usize, silent: usize, count: usize, freq: f64) -> Self {
            let mut blocks = Self::sine(size, count, freq);
            for _ in 0..silent {
                blocks.queue.push_front(vec![0.0; size]);
            }
            blocks
        }
    }

    fn loudest_bin(path: &AnalyzerPath) -> (usize, f32) {
        path.smoothed_db()
            .iter()
            .enumerate()
            .skip(1)
            .fold((0, f32::MIN), |best, (i, &db)| if db > best.1 { (i, db) } else { best })
    }

    impl BlockSource for Blocks {
        fn block_size(&self) -> usize {
            self.size
        }

        fn pop_block(&mut self, out: &mut [Sample]) -> bool {
            match self.queue.pop_front() {
                Some(block) => {
                    out.copy_from_slice(&block);
                    true
                }
                None => false,
            }
        }
    }

    fn area() -> RenderArea {
        RenderArea::new(0.0, 0.0, 600.0, 200.0)
    }

    #[test]
    fn test_vertices_skip_dc_and_out_of_range_bins() {
        let mut path = AnalyzerPath::default();
        let frame = vec![0.0; 1025];
        path.generate(&frame, SR / 2048.0, area(), DbRange::SPECTRUM);

        let vertices: Vec<_> = path.vertices().collect();
        // 23.4 Hz bins: 1..=853 stay at or below 20 kHz
        assert_eq!(vertices.len(), 853);
        assert_eq!(path.vertices().len(), 853);
        assert!(vertices.windows(2).all(|w| w[0].x < w[1].x));
        assert!(vertices.iter().all(|v| area().contains(v)));
    }

    #[test]
    fn test_iterator_is_restartable() {
        let mut path = AnalyzerPath::default();
        path.generate(&[-10.0; 129], SR / 256.0, area(), DbRange::SPECTRUM);
        let first = path.vertices();
        let again = first.clone();
        assert_eq!(first.collect::<Vec<_>>(), again.collect::<Vec<_>>());
    }

    #[test]
    fn test_non_finite_input_stays_finite() {
        let mut path = AnalyzerPath::default();
        let frame = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -300.0, 40.0, f64::NAN, 0.0, 0.0, 0.0];
        path.generate(&frame, 3000.0, area(), DbRange::SPECTRUM);
        path.generate(&frame, 3000.0, area(), DbRange::SPECTRUM);
        assert!(path.vertices().all(|v| v.is_finite() && area().contains(&v)));
    }

    #[test]
    fn test_smoothing_converges_to_newest_frame() {
        let mut path = AnalyzerPath::default();
        let width = SR / 256.0;
        path.generate(&[-40.0; 129], width, area(), DbRange::SPECTRUM);
        path.generate(&[0.0; 129], width, area(), DbRange::SPECTRUM);
        assert_eq!(path.smoothed_db()[10], -20.0);
        for _ in 0..30 {
            path.generate(&[0.0; 129], width, area(), DbRange::SPECTRUM);
        }
        assert!(path.smoothed_db()[10].abs() < 1e-3);
    }

    #[test]
    fn test_resize_restarts_smoothing() {
        let mut path = AnalyzerPath::default();
        let width = SR / 256.0;
        path.generate(&[-40.0; 129], width, area(), DbRange::SPECTRUM);
        let resized = RenderArea::new(0.0, 0.0, 300.0, 100.0);
        path.generate(&[0.0; 129], width, resized, DbRange::SPECTRUM);
        assert_eq!(path.smoothed_db()[10], 0.0);
        assert_eq!(path.area(), resized);
    }

    #[test]
    fn test_empty_area_gives_no_vertices() {
        let mut path = AnalyzerPath::default();
        path.generate(&[0.0; 129], SR / 256.0, RenderArea::default(), DbRange::SPECTRUM);
        assert!(path.is_empty());
    }

    #[test]
    fn test_producer_tracks_sine() {
        let analyzer = AnalyzerConfig::default();
        let blocks = Blocks::sine(512, 8, 2000.0);
        let mut producer = PathProducer::new(blocks, &analyzer, PathConfig::default()).unwrap();

        let frames = producer.process(SR, area(), DbRange::SPECTRUM);
        assert_eq!(frames, 8);
        assert!(producer.source().queue.is_empty());

        let path = producer.path();
        let bin_width = producer.generator().bin_width(SR) as f32;
        let loudest = loudest_bin(path);
        assert!((loudest.0 as f32 * bin_width - 2000.0).abs() <= bin_width);
        assert!(path.vertices().all(|v| v.is_finite()));

        // Nothing new queued: path is left as it was
        assert_eq!(producer.process(SR, area(), DbRange::SPECTRUM), 0);
    }

    #[test]
    fn test_backlog_longer_than_frame_queue_ends_on_newest_audio() {
        let analyzer = AnalyzerConfig::default();
        assert!(analyzer.queue_frames < 28);
        let blocks = Blocks::silence_then_sine(512, 20, 8, 2000.0);
        let mut producer = PathProducer::new(blocks, &analyzer, PathConfig::default()).unwrap();

        assert_eq!(producer.process(SR, area(), DbRange::SPECTRUM), 28);
        assert_eq!(producer.generator().dropped_frames(), 0);
        assert_eq!(producer.generator().available_frames(), 0);

        let bin_width = producer.generator().bin_width(SR) as f32;
        let (bin, db) = loudest_bin(producer.path());
        assert!((bin as f32 * bin_width - 2000.0).abs() <= bin_width);
        assert!(db > -10.0, "tone only reached {db} dB");
    }
}
