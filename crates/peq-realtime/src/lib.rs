//! # Parametric EQ Real-Time Engine
//!
//! - Atomic parameter store with consistent snapshots and a dirty flag
//! - SPSC block FIFO from the audio callback to the editor
//! - Engine facade split into audio and editor handles

pub mod config;
pub mod engine;
pub mod fifo;
pub mod state;

pub use config::*;
pub use engine::*;
pub use fifo::*;
pub use state::*;
