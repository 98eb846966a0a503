// Gesture-gated challenge engine: classifies pose/face landmark frames into
// gestures, sequences multi-stage challenges, and signals completion to the
// host that locked a resource behind the challenge.

pub mod config;
pub mod data_structures;
pub mod error;
pub mod protocol;

pub mod gestures;
pub mod challenge;
pub mod session;
pub mod server;

pub mod test_utils; // Shared frame builders for unit and integration tests

pub use config::GateConfig;
pub use error::{GateError, Result};
