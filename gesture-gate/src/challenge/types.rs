// Define types describing a multi-stage gesture challenge

use serde::{Deserialize, Serialize};

use crate::gestures::types::GestureKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,       // Not yet shown to the classifier
    Matching,      // Being classified frame by frame
    Matched,       // Confidence threshold reached
    Transitioning, // Cooling down before the next stage starts
}

/// One required gesture. Owned by exactly one challenge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GestureStage {
    pub kind: GestureKind,
    pub confidence_count: u32, // Consecutive matching frames so far
    pub threshold: u32,
    pub status: StageStatus,
}

impl GestureStage {
    pub fn new(kind: GestureKind, threshold: u32) -> Self {
        GestureStage {
            kind,
            confidence_count: 0,
            threshold,
            status: StageStatus::Pending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    InProgress,
    Complete,
    Abandoned,
}

/// What a single frame did to the challenge.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// No match (or nobody in view); the current stage's counter went back to zero.
    Miss { stage: usize },
    /// One more consecutive match on the current stage.
    Progress { stage: usize, confidence: u32 },
    /// The current stage just reached its threshold.
    StageMatched { stage: usize, kind: GestureKind },
    /// Frame ignored while the previous stage cools down.
    CoolingDown { stage: usize },
    /// The final stage matched; the challenge is over.
    Complete,
    /// The challenge already finished or was abandoned.
    Inactive,
}

/// Display-oriented view of a challenge's progress.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChallengeSnapshot {
    pub id: String,
    pub status: ChallengeStatus,
    pub cursor: usize,
    pub stages: Vec<GestureStage>,
}

/// What the challenge page needs to show for one stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagePlan {
    pub kind: GestureKind,
    pub instruction: String,
    pub image: String, // URL under /assets
}

impl StagePlan {
    pub fn for_kind(kind: GestureKind) -> Self {
        StagePlan {
            kind,
            instruction: kind.instruction().to_string(),
            image: format!("/assets/{}", kind.image_name()),
        }
    }
}
