//! Sample type and sample-rate helpers

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Default sample rate for fallback
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Lowest sample rate the processors accept
pub const MIN_SAMPLE_RATE: f64 = 8000.0;

/// Highest sample rate the processors accept
pub const MAX_SAMPLE_RATE: f64 = 768000.0;

/// Returns true if `sample_rate` can drive the filters
#[inline]
pub fn is_valid_sample_rate(sample_rate: f64) -> bool {
    sample_rate.is_finite() && (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
}

/// Fall back to [`DEFAULT_SAMPLE_RATE`] for unusable rates
#[inline]
pub fn sanitize_sample_rate(sample_rate: f64) -> f64 {
    if is_valid_sample_rate(sample_rate) {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sample_rate() {
        assert_eq!(sanitize_sample_rate(44100.0), 44100.0);
        assert_eq!(sanitize_sample_rate(0.0), DEFAULT_SAMPLE_RATE);
        assert_eq!(sanitize_sample_rate(-48000.0), DEFAULT_SAMPLE_RATE);
        assert_eq!(sanitize_sample_rate(f64::NAN), DEFAULT_SAMPLE_RATE);
    }
}
