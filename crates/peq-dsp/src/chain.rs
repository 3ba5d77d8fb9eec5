//! Fixed-topology filter cascade
//!
//! Nine slots per channel: four high-pass sections, one peak, four low-pass
//! sections. Slots are never added or removed; unused cut sections are
//! bypassed. Coefficients live in a [`SharedChain`] so the left and right
//! chains (and any renderer) read one published set while each channel keeps
//! its own filter memory.

use peq_core::{MAX_CUT_SECTIONS, Sample};
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::biquad::{BiquadCoeffs, BiquadTDF2};
use crate::design::{ChainDesign, CutDesign};
use crate::shared::CoefficientCell;
use crate::{MonoProcessor, Processor, StereoProcessor};

/// Total slots in a chain
pub const NUM_STAGES: usize = 2 * MAX_CUT_SECTIONS + 1;

/// Kind of stage occupying a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainPosition {
    HighPass,
    Peak,
    LowPass,
}

/// Slot address inside the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(usize);

impl StageId {
    pub const PEAK: StageId = StageId(MAX_CUT_SECTIONS);

    /// High-pass section `section` (0..4); saturates at the last section
    pub const fn high_pass(section: usize) -> Self {
        let section = if section < MAX_CUT_SECTIONS { section } else { MAX_CUT_SECTIONS - 1 };
        StageId(section)
    }

    /// Low-pass section `section` (0..4); saturates at the last section
    pub const fn low_pass(section: usize) -> Self {
        let section = if section < MAX_CUT_SECTIONS { section } else { MAX_CUT_SECTIONS - 1 };
        StageId(MAX_CUT_SECTIONS + 1 + section)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < NUM_STAGES).then_some(StageId(index))
    }

    /// Cascade order, first to last
    pub fn all() -> impl Iterator<Item = StageId> {
        (0..NUM_STAGES).map(StageId)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    pub fn position(self) -> ChainPosition {
        match self.0 {
            i if i < MAX_CUT_SECTIONS => ChainPosition::HighPass,
            i if i == MAX_CUT_SECTIONS => ChainPosition::Peak,
            _ => ChainPosition::LowPass,
        }
    }

    /// Section index within a cut filter, 0 for the peak
    pub fn section(self) -> usize {
        match self.position() {
            ChainPosition::HighPass => self.0,
            ChainPosition::Peak => 0,
            ChainPosition::LowPass => self.0 - MAX_CUT_SECTIONS - 1,
        }
    }
}

// ============================================================================
// SHARED COEFFICIENT BANK
// ============================================================================

/// Published coefficients and bypass flags for one cascade.
///
/// Coefficients have a single writer: whoever owns the bank and calls
/// [`publish`](Self::publish) or [`set_coefficients`](Self::set_coefficients).
/// Other threads get a [`ChainMonitor`]. A slot is bypassed when the user
/// switched it off or when the current design has no use for it; publishing
/// only ever touches the second.
#[derive(Debug)]
pub struct SharedChain {
    cells: [CoefficientCell; NUM_STAGES],
    user_bypassed: [AtomicBool; NUM_STAGES],
    inactive: [AtomicBool; NUM_STAGES],
}

impl SharedChain {
    /// Identity coefficients everywhere, nothing bypassed
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| CoefficientCell::default()),
            user_bypassed: std::array::from_fn(|_| AtomicBool::new(false)),
            inactive: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    /// Replace one stage's coefficients as a unit. Single writer only.
    #[inline]
    pub fn set_coefficients(&self, stage: StageId, coeffs: BiquadCoeffs) {
        self.cells[stage.index()].store(coeffs);
    }

    #[inline]
    pub fn coefficients(&self, stage: StageId) -> BiquadCoeffs {
        self.cells[stage.index()].load()
    }

    /// User bypass switch; survives every later publish
    #[inline]
    pub fn set_bypass(&self, stage: StageId, bypassed: bool) {
        self.user_bypassed[stage.index()].store(bypassed, Ordering::Release);
    }

    #[inline]
    pub fn is_user_bypassed(&self, stage: StageId) -> bool {
        self.user_bypassed[stage.index()].load(Ordering::Acquire)
    }

    /// Whether the last published design uses this slot
    #[inline]
    pub fn is_active(&self, stage: StageId) -> bool {
        !self.inactive[stage.index()].load(Ordering::Acquire)
    }

    /// Effective bypass: switched off by the user or unused by the design
    #[inline]
    pub fn is_bypassed(&self, stage: StageId) -> bool {
        self.is_user_bypassed(stage) || !self.is_active(stage)
    }

    fn publish_cut(&self, design: &CutDesign, stage: fn(usize) -> StageId) {
        for section in 0..MAX_CUT_SECTIONS {
            let id = stage(section);
            let active = section < design.active();
            // Unused slots keep their old coefficients so they come back seamlessly
            if active {
                self.set_coefficients(id, design.section(section));
            }
            self.inactive[id.index()].store(!active, Ordering::Release);
        }
    }

    /// Publish a full design: active cut sections get coefficients, the rest
    /// go inactive. User bypass switches are left as they are.
    pub fn publish(&self, design: &ChainDesign) {
        self.publish_cut(&design.high_pass, StageId::high_pass);
        self.set_coefficients(StageId::PEAK, design.peak);
        self.publish_cut(&design.low_pass, StageId::low_pass);
    }

    /// Product of the magnitudes of every non-bypassed stage
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        StageId::all()
            .filter(|&stage| !self.is_bypassed(stage))
            .map(|stage| self.coefficients(stage).magnitude_at(freq, sample_rate))
            .product()
    }
}

impl Default for SharedChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Another thread's handle on a [`SharedChain`]: reads coefficients and
/// flips bypass switches, never writes coefficients.
#[derive(Debug, Clone)]
pub struct ChainMonitor {
    shared: Arc<SharedChain>,
}

impl ChainMonitor {
    pub fn new(shared: Arc<SharedChain>) -> Self {
        Self { shared }
    }

    pub fn coefficients(&self, stage: StageId) -> BiquadCoeffs {
        self.shared.coefficients(stage)
    }

    pub fn set_bypass(&self, stage: StageId, bypassed: bool) {
        self.shared.set_bypass(stage, bypassed);
    }

    pub fn is_bypassed(&self, stage: StageId) -> bool {
        self.shared.is_bypassed(stage)
    }

    pub fn is_active(&self, stage: StageId) -> bool {
        self.shared.is_active(stage)
    }

    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        self.shared.magnitude_at(freq, sample_rate)
    }
}

// ============================================================================
// PER-CHANNEL CHAIN
// ============================================================================

/// One channel's cascade: shared coefficients, private filter memory
#[derive(Debug, Clone)]
pub struct FilterChain {
    shared: Arc<SharedChain>,
    filters: [BiquadTDF2; NUM_STAGES],
    bypassed: [bool; NUM_STAGES],
}

impl FilterChain {
    pub fn new(shared: Arc<SharedChain>) -> Self {
        let mut chain = Self {
            shared,
            filters: std::array::from_fn(|_| BiquadTDF2::new()),
            bypassed: [false; NUM_STAGES],
        };
        chain.refresh();
        chain
    }

    pub fn shared(&self) -> &Arc<SharedChain> {
        &self.shared
    }

    /// Take a snapshot of the published coefficients and bypass flags.
    /// Each slot swaps wholesale; filter memory is kept.
    pub fn refresh(&mut self) {
        for stage in StageId::all() {
            let i = stage.index();
            self.filters[i].set_coeffs(self.shared.coefficients(stage));
            self.bypassed[i] = self.shared.is_bypassed(stage);
        }
    }

    /// Coefficients this chain is currently running with
    pub fn active_coefficients(&self, stage: StageId) -> &BiquadCoeffs {
        self.filters[stage.index()].coeffs()
    }

    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        self.shared.magnitude_at(freq, sample_rate)
    }
}

impl Processor for FilterChain {
    fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

impl MonoProcessor for FilterChain {
    /// Runs every slot. A bypassed slot still advances its own memory but
    /// passes its input through, so re-enabling it is seamless.
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let mut signal = input;
        for (filter, &bypassed) in self.filters.iter_mut().zip(&self.bypassed) {
            let filtered = filter.process_sample(signal);
            if !bypassed {
                signal = filtered;
            }
        }
        signal
    }

    fn process_block(&mut self, buffer: &mut [Sample]) {
        self.refresh();
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Left/right chains over one coefficient bank
#[derive(Debug, Clone)]
pub struct StereoChain {
    left: FilterChain,
    right: FilterChain,
}

impl StereoChain {
    pub fn new(shared: Arc<SharedChain>) -> Self {
        Self {
            left: FilterChain::new(Arc::clone(&shared)),
            right: FilterChain::new(shared),
        }
    }

    pub fn shared(&self) -> &Arc<SharedChain> {
        self.left.shared()
    }

    pub fn left_mut(&mut self) -> &mut FilterChain {
        &mut self.left
    }

    pub fn right_mut(&mut self) -> &mut FilterChain {
        &mut self.right
    }
}

impl Processor for StereoChain {
    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl StereoProcessor for StereoChain {
    #[inline]
    fn process_sample(&mut self, left: Sample, right: Sample) -> (Sample, Sample) {
        (self.left.process_sample(left), self.right.process_sample(right))
    }

    fn process_block(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        debug_assert_eq!(left.len(), right.len());
        self.left.process_block(left);
        self.right.process_block(right);
    }
}
