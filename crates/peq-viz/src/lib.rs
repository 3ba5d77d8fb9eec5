//! peq-viz: render-ready data for the EQ editor
//!
//! Produces polylines, not pixels:
//! - Response curve of the full cascade (one vertex per pixel column)
//! - Smoothed spectrum analyzer path (log-frequency, linear dB)
//! - Coordinate mapping shared by both

pub mod common;
pub mod response_curve;
pub mod spectrum_path;

pub use common::{
    DbRange, MAX_DISPLAY_FREQ, MIN_DISPLAY_FREQ, PathConfig, PathVertex, RenderArea, db_to_y,
    frequency_to_x, x_to_frequency, y_to_db,
};
pub use response_curve::ResponseCurve;
pub use spectrum_path::{AnalyzerPath, BlockSource, PathProducer, PathVertices};
