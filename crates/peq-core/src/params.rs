//! Parameter types for the seven user-facing EQ controls

use serde::{Deserialize, Serialize};

use crate::settings::{MAX_FREQ, MAX_GAIN_DB, MAX_QUALITY, MIN_FREQ, MIN_GAIN_DB, MIN_QUALITY, Slope};

/// Parameter ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParamId {
    HighPassFreq = 0,
    LowPassFreq = 1,
    PeakFreq = 2,
    PeakGain = 3,
    PeakQuality = 4,
    HighPassSlope = 5,
    LowPassSlope = 6,
}

impl ParamId {
    pub const COUNT: usize = 7;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::HighPassFreq,
        ParamId::LowPassFreq,
        ParamId::PeakFreq,
        ParamId::PeakGain,
        ParamId::PeakQuality,
        ParamId::HighPassSlope,
        ParamId::LowPassSlope,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Host-facing parameter name
    pub fn name(self) -> &'static str {
        match self {
            ParamId::HighPassFreq => "HighPass Freq",
            ParamId::LowPassFreq => "LowPass Freq",
            ParamId::PeakFreq => "Peak Freq",
            ParamId::PeakGain => "Peak Gain",
            ParamId::PeakQuality => "Peak Quality",
            ParamId::HighPassSlope => "HighPass Slope",
            ParamId::LowPassSlope => "LowPass Slope",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    pub fn unit(self) -> &'static str {
        match self {
            ParamId::HighPassFreq | ParamId::LowPassFreq | ParamId::PeakFreq => "Hz",
            ParamId::PeakGain => "dB",
            ParamId::PeakQuality => "",
            ParamId::HighPassSlope | ParamId::LowPassSlope => "dB/Oct",
        }
    }

    pub fn is_choice(self) -> bool {
        matches!(self, ParamId::HighPassSlope | ParamId::LowPassSlope)
    }

    /// Range, skew, step and default of this control
    pub fn range(self) -> ParamRange {
        match self {
            ParamId::HighPassFreq => ParamRange::logarithmic(MIN_FREQ, MAX_FREQ, 20.0).with_interval(1.0),
            ParamId::LowPassFreq => ParamRange::logarithmic(MIN_FREQ, MAX_FREQ, 20000.0).with_interval(1.0),
            ParamId::PeakFreq => ParamRange::logarithmic(MIN_FREQ, MAX_FREQ, 750.0).with_interval(1.0),
            ParamId::PeakGain => ParamRange::linear(MIN_GAIN_DB, MAX_GAIN_DB, 0.0).with_interval(0.5),
            ParamId::PeakQuality => ParamRange::linear(MIN_QUALITY, MAX_QUALITY, 1.0).with_interval(0.05),
            ParamId::HighPassSlope | ParamId::LowPassSlope => {
                ParamRange::choice(Slope::ALL.len(), Slope::default().index())
            }
        }
    }

    /// Labels for choice parameters, empty for continuous ones
    pub fn choices(self) -> &'static [&'static str] {
        const SLOPES: [&str; 4] = ["12 db/Oct", "24 db/Oct", "36 db/Oct", "48 db/Oct"];
        if self.is_choice() { &SLOPES } else { &[] }
    }
}

/// Parameter range specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Step between legal values, 0 = continuous
    pub interval: f64,
    pub skew: ParamSkew,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            interval: 0.0,
            skew: ParamSkew::Linear,
        }
    }

    pub fn logarithmic(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            interval: 0.0,
            skew: ParamSkew::Logarithmic,
        }
    }

    /// Index range `0..count` with unit steps
    pub fn choice(count: usize, default: usize) -> Self {
        Self {
            min: 0.0,
            max: count.saturating_sub(1) as f64,
            default: default as f64,
            interval: 1.0,
            skew: ParamSkew::Linear,
        }
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval.max(0.0);
        self
    }

    /// Denormalize a 0-1 value to actual value
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            self.normalize(self.default)
        };
        let value = match self.skew {
            ParamSkew::Linear => self.min + normalized * (self.max - self.min),
            ParamSkew::Logarithmic => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (log_min + normalized * (log_max - log_min)).exp()
            }
        };
        self.snap(value)
    }

    /// Normalize an actual value to 0-1
    pub fn normalize(&self, value: f64) -> f64 {
        let clamped = if value.is_finite() { value.clamp(self.min, self.max) } else { self.default };
        if self.max <= self.min {
            return 0.0;
        }
        match self.skew {
            ParamSkew::Linear => (clamped - self.min) / (self.max - self.min),
            ParamSkew::Logarithmic => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (clamped.ln() - log_min) / (log_max - log_min)
            }
        }
    }

    /// Clamp into range and round to the step interval. NaN becomes the default.
    pub fn snap(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.interval > 0.0 {
            let steps = ((clamped - self.min) / self.interval).round();
            let snapped = (self.min + steps * self.interval).clamp(self.min, self.max);
            // Values already on the grid come back bit-exact
            if (snapped - clamped).abs() < self.interval * 1e-9 { clamped } else { snapped }
        } else {
            clamped
        }
    }
}

/// Parameter skew type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamSkew {
    Linear,
    Logarithmic,
}
