//! EQ response curve
//!
//! Keeps its own mono coefficient bank so drawing never touches the audio
//! chain. Recomputed only when the parameters change.

use log::debug;
use peq_core::{ChainSettings, Decibels, MIN_DB, sanitize_sample_rate};
use peq_dsp::{SharedChain, design_chain};

use crate::common::{
    DbRange, MAX_DISPLAY_FREQ, MIN_DISPLAY_FREQ, PathVertex, RenderArea, db_to_y, x_to_frequency,
};

/// Combined magnitude response of the whole cascade
#[derive(Debug)]
pub struct ResponseCurve {
    chain: SharedChain,
    settings: ChainSettings,
    sample_rate: f64,
    updates: u64,
}

impl ResponseCurve {
    pub fn new(sample_rate: f64) -> Self {
        let mut curve = Self {
            chain: SharedChain::new(),
            settings: ChainSettings::default(),
            sample_rate: sanitize_sample_rate(sample_rate),
            updates: 0,
        };
        curve.update(&ChainSettings::default());
        curve
    }

    /// Redesign from a settings snapshot
    pub fn update(&mut self, settings: &ChainSettings) {
        self.settings = settings.sanitized(self.sample_rate);
        self.chain.publish(&design_chain(&self.settings, self.sample_rate));
        self.updates += 1;
        debug!(
            "response curve recomputed (#{}) at {} Hz",
            self.updates, self.sample_rate
        );
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        let settings = self.settings;
        self.update(&settings);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    pub fn chain(&self) -> &SharedChain {
        &self.chain
    }

    /// Number of recomputes since construction
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn magnitude_at(&self, freq: f64) -> f64 {
        self.chain.magnitude_at(freq, self.sample_rate)
    }

    /// Response in dB, never below `MIN_DB`
    pub fn magnitude_db_at(&self, freq: f64) -> f64 {
        Decibels::from_gain_floored(self.magnitude_at(freq), MIN_DB).0
    }

    /// One dB value per pixel column, log-spaced from 20 Hz to 20 kHz
    pub fn magnitudes_db(&self, width: usize) -> Vec<f64> {
        (0..width)
            .map(|i| {
                let x = i as f32 / width as f32;
                let freq = x_to_frequency(x, MIN_DISPLAY_FREQ, MAX_DISPLAY_FREQ);
                self.magnitude_db_at(f64::from(freq))
            })
            .collect()
    }

    /// Polyline with one vertex per pixel column of `area`
    pub fn path(&self, area: RenderArea, range: DbRange) -> Vec<PathVertex> {
        if area.is_empty() {
            return Vec::new();
        }
        let columns = area.width.round().max(1.0) as usize;
        self.magnitudes_db(columns)
            .into_iter()
            .enumerate()
            .map(|(i, db)| {
                let y = db_to_y(range.clamp(db as f32), range.min_db, range.max_db);
                area.point(i as f32 / columns as f32, y)
            })
            .collect()
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::new(peq_core::DEFAULT_SAMPLE_RATE)
    }
}
