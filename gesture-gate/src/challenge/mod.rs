// Challenge module entry point

pub mod types;
pub mod sequencer;
pub mod runtime; // Browser-side frame loop

// Re-export key types
pub use types::{ChallengeSnapshot, ChallengeStatus, FrameOutcome, GestureStage, StagePlan, StageStatus};
pub use sequencer::Challenge;
pub use runtime::{run_challenge, ChannelFrameSource, CompletionSignal, FrameSource, RunReport};
