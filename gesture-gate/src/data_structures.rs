use serde::{Deserialize, Serialize};

// Number of points in a full-body pose frame (MediaPipe Pose topology)
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Named skeletal points, indexed by their position in the pose frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose = 0,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftIndex = 19,
    RightIndex = 20,
    LeftHip = 23,
    RightHip = 24,
}

impl PoseLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

// Facial points used by the classifiers (MediaPipe FaceMesh indices)
pub mod face {
    pub const UPPER_LIP_INNER: usize = 13;
    pub const LOWER_LIP_INNER: usize = 14;
    pub const MOUTH_CORNER_LEFT: usize = 61;
    pub const MOUTH_CORNER_RIGHT: usize = 291;
    pub const JAW_LEFT: usize = 172;
    pub const JAW_RIGHT: usize = 397;
    pub const CHIN: usize = 152;
}

/// Which limb performs a one-sided gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn shoulder(self) -> PoseLandmark {
        match self {
            Side::Left => PoseLandmark::LeftShoulder,
            Side::Right => PoseLandmark::RightShoulder,
        }
    }

    pub fn elbow(self) -> PoseLandmark {
        match self {
            Side::Left => PoseLandmark::LeftElbow,
            Side::Right => PoseLandmark::RightElbow,
        }
    }

    pub fn wrist(self) -> PoseLandmark {
        match self {
            Side::Left => PoseLandmark::LeftWrist,
            Side::Right => PoseLandmark::RightWrist,
        }
    }

    pub fn index_finger(self) -> PoseLandmark {
        match self {
            Side::Left => PoseLandmark::LeftIndex,
            Side::Right => PoseLandmark::RightIndex,
        }
    }

    pub fn hip(self) -> PoseLandmark {
        match self {
            Side::Left => PoseLandmark::LeftHip,
            Side::Right => PoseLandmark::RightHip,
        }
    }
}

fn full_visibility() -> f32 {
    1.0
}

/// A single normalized point. `y` grows downwards, as in image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Landmark { x, y, visibility }
    }

    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility >= min_visibility
    }
}

/// One estimation cycle's output. Frames are never retained; only scalar
/// features derived from them survive, inside the motion history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub timestamp_ms: f64, // performance.now() milliseconds, fractional
    #[serde(default)]
    pub pose: Vec<Landmark>,
    #[serde(default)]
    pub face: Option<Vec<Landmark>>,
}

impl LandmarkFrame {
    /// An empty pose means the estimator found nobody in view.
    pub fn has_pose(&self) -> bool {
        !self.pose.is_empty()
    }

    pub fn pose_point(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        self.pose.get(landmark.index())
    }

    /// The point, but only if it clears `min_visibility`.
    pub fn visible(&self, landmark: PoseLandmark, min_visibility: f32) -> Option<Landmark> {
        self.pose_point(landmark)
            .filter(|p| p.is_visible(min_visibility))
            .copied()
    }

    pub fn face_point(&self, index: usize) -> Option<Landmark> {
        self.face.as_ref().and_then(|points| points.get(index)).copied()
    }
}
