// Gesture classification: landmark geometry, motion history and per-gesture classifiers

pub mod types;
pub mod geometry;
pub mod history;
pub mod static_pose;
pub mod motion;
pub mod classifier;

// Re-export key types
pub use types::{GestureKind, MotionFeature};
pub use history::{HistoryKey, MotionHistory};
pub use classifier::matches;
