//! peq-core: Shared types, parameters and errors for the parametric EQ
//!
//! This crate provides the foundational types used across all peq crates.

mod sample;
mod params;
mod settings;
mod error;

pub use sample::*;
pub use params::*;
pub use settings::*;
pub use error::*;

/// Floor used whenever a gain of zero has to be shown in decibels
pub const MIN_DB: f64 = -144.0;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 || !gain.is_finite() {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    /// Same as `from_gain` but never below `floor_db`
    #[inline]
    pub fn from_gain_floored(gain: f64, floor_db: f64) -> Self {
        let db = Self::from_gain(gain).0;
        if db.is_nan() || db < floor_db {
            Self(floor_db)
        } else {
            Self(db)
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= MIN_DB {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}
