//! Engine configuration

use log::warn;
use peq_core::{PeqError, PeqResult};
use peq_dsp::AnalyzerConfig;
use peq_viz::{DbRange, PathConfig};
use serde::{Deserialize, Serialize};

use crate::fifo::DEFAULT_CAPACITY_BLOCKS;

/// Everything `EqEngine::prepare` sizes and wires up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Blocks per channel FIFO, power of two
    pub fifo_capacity_blocks: usize,
    /// Feed the spectrum analyzer at all
    pub analyzer_enabled: bool,
    pub analyzer: AnalyzerConfig,
    pub path: PathConfig,
    pub response_range: DbRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fifo_capacity_blocks: DEFAULT_CAPACITY_BLOCKS,
            analyzer_enabled: true,
            analyzer: AnalyzerConfig::default(),
            path: PathConfig::default(),
            response_range: DbRange::RESPONSE,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> PeqResult<()> {
        self.validate_fifo()?;
        self.analyzer.validate()?;
        self.path.validate()?;
        self.response_range.validate()
    }

    fn validate_fifo(&self) -> PeqResult<()> {
        let blocks = self.fifo_capacity_blocks;
        if blocks < 2 || !blocks.is_power_of_two() {
            return Err(PeqError::InvalidConfig(format!(
                "fifo_capacity_blocks must be a power of two >= 2, got {blocks}"
            )));
        }
        Ok(())
    }

    /// Replace every invalid section with its default, logging each swap
    pub fn repaired(mut self) -> Self {
        let defaults = Self::default();
        if let Err(e) = self.validate_fifo() {
            warn!("{e}; using {} blocks", defaults.fifo_capacity_blocks);
            self.fifo_capacity_blocks = defaults.fifo_capacity_blocks;
        }
        if let Err(e) = self.analyzer.validate() {
            warn!("invalid analyzer config ({e}); using defaults");
            self.analyzer = defaults.analyzer;
        }
        if let Err(e) = self.path.validate() {
            warn!("invalid path config ({e}); using defaults");
            self.path = defaults.path;
        }
        if let Err(e) = self.response_range.validate() {
            warn!("invalid response range ({e}); using defaults");
            self.response_range = defaults.response_range;
        }
        self
    }
}
