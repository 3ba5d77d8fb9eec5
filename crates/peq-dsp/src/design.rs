//! Coefficient designer
//!
//! Pure functions turning a [`ChainSettings`] snapshot into biquad
//! coefficients. Nothing here clamps: settings are sanitized before they
//! arrive (see [`ChainSettings::sanitized`]).

use peq_core::{ChainSettings, MAX_CUT_SECTIONS, Slope};

use crate::biquad::BiquadCoeffs;

/// Cut filter direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    HighPass,
    LowPass,
}

/// Butterworth cut filter split into cascaded biquad sections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutDesign {
    sections: [BiquadCoeffs; MAX_CUT_SECTIONS],
    active: usize,
}

impl CutDesign {
    /// Sections beyond `slope.sections()` stay at identity
    pub fn butterworth(kind: CutKind, freq: f64, slope: Slope, sample_rate: f64) -> Self {
        let mut sections = [BiquadCoeffs::bypass(); MAX_CUT_SECTIONS];
        let qs = slope.butterworth_qs();
        for (section, &q) in sections.iter_mut().zip(qs) {
            *section = match kind {
                CutKind::HighPass => BiquadCoeffs::highpass(freq, q, sample_rate),
                CutKind::LowPass => BiquadCoeffs::lowpass(freq, q, sample_rate),
            };
        }

        Self {
            sections,
            active: qs.len(),
        }
    }

    /// Number of sections in use (1..=4)
    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Coefficients for `index`, identity when the section is unused
    #[inline]
    pub fn section(&self, index: usize) -> BiquadCoeffs {
        self.sections.get(index).copied().unwrap_or(BiquadCoeffs::bypass())
    }

    /// Active sections only
    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections[..self.active]
    }

    /// Product of the active sections' magnitudes
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        self.sections()
            .iter()
            .map(|c| c.magnitude_at(freq, sample_rate))
            .product()
    }
}

/// Coefficients for the whole cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainDesign {
    pub high_pass: CutDesign,
    pub peak: BiquadCoeffs,
    pub low_pass: CutDesign,
}

impl ChainDesign {
    /// Combined magnitude of all active stages
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        self.high_pass.magnitude_at(freq, sample_rate)
            * self.peak.magnitude_at(freq, sample_rate)
            * self.low_pass.magnitude_at(freq, sample_rate)
    }
}

#[inline]
fn debug_check(settings: &ChainSettings, sample_rate: f64) {
    debug_assert!(
        settings.is_valid(sample_rate),
        "unsanitized settings reached the designer: {settings:?} @ {sample_rate} Hz"
    );
}

/// Peaking bell at `peak_freq` with linear gain 10^(dB/20) at the center
pub fn make_peak_filter(settings: &ChainSettings, sample_rate: f64) -> BiquadCoeffs {
    debug_check(settings, sample_rate);
    BiquadCoeffs::peaking(
        settings.peak_freq,
        settings.peak_quality,
        settings.peak_gain_db,
        sample_rate,
    )
}

pub fn make_high_pass_filter(settings: &ChainSettings, sample_rate: f64) -> CutDesign {
    debug_check(settings, sample_rate);
    CutDesign::butterworth(
        CutKind::HighPass,
        settings.high_pass_freq,
        settings.high_pass_slope,
        sample_rate,
    )
}

pub fn make_low_pass_filter(settings: &ChainSettings, sample_rate: f64) -> CutDesign {
    debug_check(settings, sample_rate);
    CutDesign::butterworth(
        CutKind::LowPass,
        settings.low_pass_freq,
        settings.low_pass_slope,
        sample_rate,
    )
}

/// Design every stage of the cascade. Closed-form, allocation-free.
pub fn design_chain(settings: &ChainSettings, sample_rate: f64) -> ChainDesign {
    ChainDesign {
        high_pass: make_high_pass_filter(settings, sample_rate),
        peak: make_peak_filter(settings, sample_rate),
        low_pass: make_low_pass_filter(settings, sample_rate),
    }
}
