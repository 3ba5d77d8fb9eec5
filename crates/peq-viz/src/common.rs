//! Coordinate mapping and render types shared by the curve renderers

use peq_core::{PeqError, PeqResult};
use serde::{Deserialize, Serialize};

/// Left edge of the frequency axis
pub const MIN_DISPLAY_FREQ: f32 = 20.0;
/// Right edge of the frequency axis
pub const MAX_DISPLAY_FREQ: f32 = 20000.0;

/// Convert normalized X (0-1) to frequency (Hz)
pub fn x_to_frequency(x: f32, min_freq: f32, max_freq: f32) -> f32 {
    let log_min = min_freq.log10();
    let log_max = max_freq.log10();
    10.0_f32.powf(log_min + x * (log_max - log_min))
}

/// Convert frequency (Hz) to normalized X (0-1). Non-positive frequencies
/// map to the left edge.
pub fn frequency_to_x(freq: f32, min_freq: f32, max_freq: f32) -> f32 {
    if freq.is_nan() || freq <= 0.0 {
        return 0.0;
    }
    let log_min = min_freq.log10();
    let log_max = max_freq.log10();
    (freq.log10() - log_min) / (log_max - log_min)
}

/// Convert normalized Y (0-1, top to bottom) to dB
pub fn y_to_db(y: f32, min_db: f32, max_db: f32) -> f32 {
    max_db - y * (max_db - min_db)
}

/// Convert dB to normalized Y (0-1, top to bottom)
pub fn db_to_y(db: f32, min_db: f32, max_db: f32) -> f32 {
    (max_db - db) / (max_db - min_db)
}

/// Vertical dB range of a plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbRange {
    pub min_db: f32,
    pub max_db: f32,
}

impl DbRange {
    /// Analyzer default
    pub const SPECTRUM: Self = Self::new(-48.0, 6.0);
    /// Response-curve default
    pub const RESPONSE: Self = Self::new(-24.0, 24.0);

    pub const fn new(min_db: f32, max_db: f32) -> Self {
        Self { min_db, max_db }
    }

    pub fn validate(&self) -> PeqResult<()> {
        if !self.min_db.is_finite() || !self.max_db.is_finite() || self.min_db >= self.max_db {
            return Err(PeqError::InvalidConfig(format!(
                "dB range [{}, {}] is empty or not finite",
                self.min_db, self.max_db
            )));
        }
        Ok(())
    }

    /// Clamp into the range; NaN lands on the bottom edge
    pub fn clamp(&self, db: f32) -> f32 {
        if db.is_nan() {
            self.min_db
        } else {
            db.clamp(self.min_db, self.max_db)
        }
    }
}

impl Default for DbRange {
    fn default() -> Self {
        Self::SPECTRUM
    }
}

/// Pixel rectangle a path is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RenderArea {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn with_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        let finite = [self.x, self.y, self.width, self.height].iter().all(|v| v.is_finite());
        !finite || self.width <= 0.0 || self.height <= 0.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Map normalized coordinates, each clamped to 0-1, into the area
    pub fn point(&self, norm_x: f32, norm_y: f32) -> PathVertex {
        let nx = if norm_x.is_nan() { 0.0 } else { norm_x.clamp(0.0, 1.0) };
        let ny = if norm_y.is_nan() { 1.0 } else { norm_y.clamp(0.0, 1.0) };
        PathVertex::new(self.x + nx * self.width, self.y + ny * self.height)
    }

    pub fn contains(&self, vertex: &PathVertex) -> bool {
        vertex.x >= self.x && vertex.x <= self.right() && vertex.y >= self.y && vertex.y <= self.bottom()
    }
}

/// Polyline vertex in pixels
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PathVertex {
    pub x: f32,
    pub y: f32,
}

impl PathVertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Analyzer path settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Weight of the previous frame, 0 = no smoothing
    pub smoothing: f32,
    pub db_range: DbRange,
    pub min_freq: f32,
    pub max_freq: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.5,
            db_range: DbRange::SPECTRUM,
            min_freq: MIN_DISPLAY_FREQ,
            max_freq: MAX_DISPLAY_FREQ,
        }
    }
}

impl PathConfig {
    pub fn validate(&self) -> PeqResult<()> {
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(PeqError::InvalidConfig(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        let axis_ok = self.min_freq > 0.0 && self.max_freq > self.min_freq;
        if !axis_ok || !self.max_freq.is_finite() {
            return Err(PeqError::InvalidConfig(format!(
                "frequency axis [{}, {}] is invalid",
                self.min_freq, self.max_freq
            )));
        }
        self.db_range.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frequency_mapping() {
        assert_relative_eq!(frequency_to_x(20.0, 20.0, 20000.0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(frequency_to_x(20000.0, 20.0, 20000.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(frequency_to_x(632.4555, 20.0, 20000.0), 0.5, epsilon = 1e-4);
        assert_relative_eq!(x_to_frequency(0.5, 20.0, 20000.0), 632.4555, epsilon = 0.01);
        assert_eq!(frequency_to_x(0.0, 20.0, 20000.0), 0.0);
        assert_eq!(frequency_to_x(-5.0, 20.0, 20000.0), 0.0);
    }

    #[test]
    fn test_db_mapping() {
        assert_relative_eq!(db_to_y(24.0, -24.0, 24.0), 0.0);
        assert_relative_eq!(db_to_y(-24.0, -24.0, 24.0), 1.0);
        assert_relative_eq!(db_to_y(0.0, -24.0, 24.0), 0.5);
        assert_relative_eq!(y_to_db(0.25, -48.0, 6.0), -7.5);
    }

    #[test]
    fn test_db_range() {
        assert_eq!(DbRange::default(), DbRange::new(-48.0, 6.0));
        assert!(DbRange::RESPONSE.validate().is_ok());
        assert!(DbRange::new(6.0, 6.0).validate().is_err());
        assert_eq!(DbRange::SPECTRUM.clamp(f32::NAN), -48.0);
        assert_eq!(DbRange::SPECTRUM.clamp(20.0), 6.0);
    }

    #[test]
    fn test_render_area_point_is_inside() {
        let area = RenderArea::new(10.0, 20.0, 300.0, 100.0);
        let v = area.point(0.5, 0.5);
        assert_eq!(v, PathVertex::new(160.0, 70.0));
        for (nx, ny) in [(-1.0, 2.0), (f32::NAN, f32::NAN), (f32::INFINITY, -0.5)] {
            let v = area.point(nx, ny);
            assert!(v.is_finite());
            assert!(area.contains(&v));
        }
        assert!(RenderArea::with_size(0.0, 100.0).is_empty());
        assert!(!area.is_empty());
    }

    #[test]
    fn test_vertices_are_pod() {
        let vertices = [PathVertex::new(1.0, 2.0), PathVertex::new(3.0, 4.0)];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_path_config_validation() {
        assert!(PathConfig::default().validate().is_ok());
        let bad = PathConfig { smoothing: 1.0, ..Default::default() };
        assert!(bad.validate().is_err());
        let json = r#"{ "smoothing": 0.8 }"#;
        let config: PathConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.smoothing, 0.8);
        assert_eq!(config.db_range, DbRange::SPECTRUM);
    }
}
