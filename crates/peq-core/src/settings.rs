//! Chain settings snapshot and filter slopes

use serde::{Deserialize, Serialize};

use crate::params::ParamId;

/// Lowest frequency any control can reach (Hz)
pub const MIN_FREQ: f64 = 20.0;
/// Highest frequency any control can reach (Hz)
pub const MAX_FREQ: f64 = 20000.0;
pub const MIN_GAIN_DB: f64 = -24.0;
pub const MAX_GAIN_DB: f64 = 24.0;
pub const MIN_QUALITY: f64 = 0.1;
pub const MAX_QUALITY: f64 = 10.0;

/// Cutoffs are kept below this fraction of the sample rate
pub const MAX_NYQUIST_RATIO: f64 = 0.49;

/// Maximum biquad sections per cut filter (48 dB/oct)
pub const MAX_CUT_SECTIONS: usize = 4;

/// Filter slope for the cut filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Out-of-range indices saturate to the nearest slope
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Slope from a (possibly fractional) choice parameter value
    pub fn from_choice(value: f64) -> Self {
        if value.is_finite() {
            Self::from_index(value.round().max(0.0) as usize)
        } else {
            Self::default()
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn db_per_octave(self) -> u32 {
        (self.index() as u32 + 1) * 12
    }

    /// Butterworth filter order
    pub fn order(self) -> usize {
        self.sections() * 2
    }

    /// Number of biquad stages needed for this slope
    pub fn sections(self) -> usize {
        self.index() + 1
    }

    /// Q values for cascaded Butterworth response
    pub fn butterworth_qs(self) -> &'static [f64] {
        match self {
            Slope::Db12 => &[std::f64::consts::FRAC_1_SQRT_2],
            Slope::Db24 => &[0.5411961001461969, 1.3065629648763764],
            Slope::Db36 => &[
                0.5176380902050415,
                std::f64::consts::FRAC_1_SQRT_2,
                1.9318516525781366,
            ],
            Slope::Db48 => &[
                0.5097956518498039,
                0.6013448869350453,
                0.8999762231364156,
                2.5629154477415055,
            ],
        }
    }
}

/// Snapshot of every user-facing control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    pub high_pass_freq: f64,
    pub low_pass_freq: f64,
    pub peak_freq: f64,
    pub peak_gain_db: f64,
    pub peak_quality: f64,
    pub high_pass_slope: Slope,
    pub low_pass_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            high_pass_freq: 20.0,
            low_pass_freq: 20000.0,
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            high_pass_slope: Slope::Db12,
            low_pass_slope: Slope::Db12,
        }
    }
}

impl ChainSettings {
    /// Build from raw parameter values indexed by [`ParamId::index`]
    pub fn from_values(values: &[f64; ParamId::COUNT]) -> Self {
        Self {
            high_pass_freq: values[ParamId::HighPassFreq.index()],
            low_pass_freq: values[ParamId::LowPassFreq.index()],
            peak_freq: values[ParamId::PeakFreq.index()],
            peak_gain_db: values[ParamId::PeakGain.index()],
            peak_quality: values[ParamId::PeakQuality.index()],
            high_pass_slope: Slope::from_choice(values[ParamId::HighPassSlope.index()]),
            low_pass_slope: Slope::from_choice(values[ParamId::LowPassSlope.index()]),
        }
    }

    /// Raw parameter values indexed by [`ParamId::index`]
    pub fn to_values(&self) -> [f64; ParamId::COUNT] {
        let mut values = [0.0; ParamId::COUNT];
        values[ParamId::HighPassFreq.index()] = self.high_pass_freq;
        values[ParamId::LowPassFreq.index()] = self.low_pass_freq;
        values[ParamId::PeakFreq.index()] = self.peak_freq;
        values[ParamId::PeakGain.index()] = self.peak_gain_db;
        values[ParamId::PeakQuality.index()] = self.peak_quality;
        values[ParamId::HighPassSlope.index()] = self.high_pass_slope.index() as f64;
        values[ParamId::LowPassSlope.index()] = self.low_pass_slope.index() as f64;
        values
    }

    /// Clamp every field into its legal domain for `sample_rate`.
    ///
    /// This is the only place out-of-range settings are repaired; the
    /// coefficient designer assumes its input already passed through here.
    pub fn sanitized(&self, sample_rate: f64) -> Self {
        let nyquist_limit = (sample_rate * MAX_NYQUIST_RATIO).clamp(MIN_FREQ, MAX_FREQ);
        let freq = |value: f64, id: ParamId| {
            let value = if value.is_finite() { value } else { id.range().default };
            value.clamp(MIN_FREQ, nyquist_limit)
        };
        let linear = |value: f64, id: ParamId| {
            let range = id.range();
            if value.is_finite() {
                value.clamp(range.min, range.max)
            } else {
                range.default
            }
        };

        Self {
            high_pass_freq: freq(self.high_pass_freq, ParamId::HighPassFreq),
            low_pass_freq: freq(self.low_pass_freq, ParamId::LowPassFreq),
            peak_freq: freq(self.peak_freq, ParamId::PeakFreq),
            peak_gain_db: linear(self.peak_gain_db, ParamId::PeakGain),
            peak_quality: linear(self.peak_quality, ParamId::PeakQuality),
            high_pass_slope: self.high_pass_slope,
            low_pass_slope: self.low_pass_slope,
        }
    }

    /// True if the designer can use these settings as they are
    pub fn is_valid(&self, sample_rate: f64) -> bool {
        *self == self.sanitized(sample_rate)
    }
}
