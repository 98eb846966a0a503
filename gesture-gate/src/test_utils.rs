// gesture-gate/src/test_utils.rs
// Synthetic landmark frames shared by unit and integration tests

use crate::data_structures::{face, Landmark, LandmarkFrame, PoseLandmark, POSE_LANDMARK_COUNT};

// FaceMesh produces 468 points; only a handful matter to the classifiers
pub const FACE_LANDMARK_COUNT: usize = 468;

// One frame at 30 fps, as performance.now() reports it
pub const FRAME_MS: f64 = 33.3;

/// Builds a frame starting from a neutral standing pose with both arms down.
#[derive(Clone, Debug)]
pub struct FrameBuilder {
    timestamp_ms: f64,
    pose: Vec<Landmark>,
    face: Option<Vec<Landmark>>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        let mut pose = vec![Landmark::new(0.5, 0.5, 1.0); POSE_LANDMARK_COUNT];
        let neutral = [
            (PoseLandmark::Nose, 0.50, 0.20),
            (PoseLandmark::MouthLeft, 0.52, 0.25),
            (PoseLandmark::MouthRight, 0.48, 0.25),
            (PoseLandmark::LeftShoulder, 0.62, 0.35),
            (PoseLandmark::RightShoulder, 0.38, 0.35),
            (PoseLandmark::LeftElbow, 0.65, 0.50),
            (PoseLandmark::RightElbow, 0.35, 0.50),
            (PoseLandmark::LeftWrist, 0.66, 0.65),
            (PoseLandmark::RightWrist, 0.34, 0.65),
            (PoseLandmark::LeftIndex, 0.66, 0.69),
            (PoseLandmark::RightIndex, 0.34, 0.69),
            (PoseLandmark::LeftHip, 0.58, 0.70),
            (PoseLandmark::RightHip, 0.42, 0.70),
        ];
        for (landmark, x, y) in neutral {
            pose[landmark.index()] = Landmark::new(x, y, 1.0);
        }
        FrameBuilder { timestamp_ms: 0.0, pose, face: None }
    }

    pub fn at(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn point(mut self, landmark: PoseLandmark, x: f32, y: f32) -> Self {
        let visibility = self.pose[landmark.index()].visibility;
        self.pose[landmark.index()] = Landmark::new(x, y, visibility);
        self
    }

    pub fn visibility(mut self, landmark: PoseLandmark, visibility: f32) -> Self {
        self.pose[landmark.index()].visibility = visibility;
        self
    }

    /// Adds a relaxed face: closed mouth, corners level with the lips.
    pub fn neutral_face(mut self) -> Self {
        let mut points = vec![Landmark::new(0.5, 0.2, 1.0); FACE_LANDMARK_COUNT];
        let features = [
            (face::UPPER_LIP_INNER, 0.50, 0.250),
            (face::LOWER_LIP_INNER, 0.50, 0.255),
            (face::MOUTH_CORNER_LEFT, 0.47, 0.255),
            (face::MOUTH_CORNER_RIGHT, 0.53, 0.255),
            (face::JAW_LEFT, 0.46, 0.280),
            (face::JAW_RIGHT, 0.54, 0.280),
            (face::CHIN, 0.50, 0.300),
        ];
        for (index, x, y) in features {
            points[index] = Landmark::new(x, y, 1.0);
        }
        self.face = Some(points);
        self
    }

    pub fn face_point(mut self, index: usize, x: f32, y: f32) -> Self {
        if self.face.is_none() {
            self = self.neutral_face();
        }
        if let Some(points) = self.face.as_mut() {
            points[index] = Landmark::new(x, y, 1.0);
        }
        self
    }

    pub fn without_face(mut self) -> Self {
        self.face = None;
        self
    }

    pub fn build(self) -> LandmarkFrame {
        LandmarkFrame {
            timestamp_ms: self.timestamp_ms,
            pose: self.pose,
            face: self.face,
        }
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A frame where the estimator saw nobody.
pub fn empty_frame(timestamp_ms: f64) -> LandmarkFrame {
    LandmarkFrame { timestamp_ms, pose: Vec::new(), face: None }
}

pub fn neutral_frame() -> LandmarkFrame {
    FrameBuilder::new().neutral_face().build()
}

// Right index finger resting on the lips, wrist below the mouth
pub fn finger_to_lip() -> FrameBuilder {
    FrameBuilder::new()
        .point(PoseLandmark::RightElbow, 0.40, 0.50)
        .point(PoseLandmark::RightWrist, 0.47, 0.36)
        .point(PoseLandmark::RightIndex, 0.49, 0.26)
}

// Both forearms out to the sides, elbows bent, wrists between shoulders and hips
pub fn palms_up_shrug() -> FrameBuilder {
    FrameBuilder::new()
        .point(PoseLandmark::LeftElbow, 0.64, 0.52)
        .point(PoseLandmark::LeftWrist, 0.78, 0.48)
        .point(PoseLandmark::LeftIndex, 0.82, 0.47)
        .point(PoseLandmark::RightElbow, 0.36, 0.52)
        .point(PoseLandmark::RightWrist, 0.22, 0.48)
        .point(PoseLandmark::RightIndex, 0.18, 0.47)
}

// Right index finger under the right mouth corner, elbow sharply bent
pub fn finger_to_jaw() -> FrameBuilder {
    FrameBuilder::new()
        .point(PoseLandmark::RightElbow, 0.36, 0.48)
        .point(PoseLandmark::RightWrist, 0.44, 0.36)
        .point(PoseLandmark::RightIndex, 0.47, 0.31)
}

// Smiling face, left arm straight up with the index finger on top
pub fn smile_and_point_up() -> FrameBuilder {
    FrameBuilder::new()
        .neutral_face()
        .face_point(face::MOUTH_CORNER_LEFT, 0.47, 0.245)
        .face_point(face::MOUTH_CORNER_RIGHT, 0.53, 0.245)
        .point(PoseLandmark::LeftElbow, 0.66, 0.22)
        .point(PoseLandmark::LeftWrist, 0.68, 0.10)
        .point(PoseLandmark::LeftIndex, 0.685, 0.06)
}

// Right elbow tucked against the hip, left arm stretched out sideways
pub fn elbow_tuck_arm_extend() -> FrameBuilder {
    FrameBuilder::new()
        .point(PoseLandmark::RightElbow, 0.41, 0.52)
        .point(PoseLandmark::RightWrist, 0.48, 0.44)
        .point(PoseLandmark::RightIndex, 0.50, 0.42)
        .point(PoseLandmark::LeftElbow, 0.75, 0.36)
        .point(PoseLandmark::LeftWrist, 0.88, 0.37)
        .point(PoseLandmark::LeftIndex, 0.92, 0.37)
}

/// Frame `step` of a two-handed wave: both wrists alternate between two
/// heights `amplitude` apart.
pub fn oscillating_hands(step: usize, amplitude: f32) -> LandmarkFrame {
    let y = if step % 2 == 0 { 0.30 } else { 0.30 + amplitude };
    FrameBuilder::new()
        .at(step as f64 * FRAME_MS)
        .point(PoseLandmark::LeftWrist, 0.70, y)
        .point(PoseLandmark::RightWrist, 0.30, y)
        .build()
}

/// Frame `step` of a head shake with the mouth wide open.
pub fn tongue_and_headshake(step: usize, amplitude: f32) -> LandmarkFrame {
    let x = if step % 2 == 0 { 0.50 } else { 0.50 + amplitude };
    open_mouth().at(step as f64 * FRAME_MS).point(PoseLandmark::Nose, x, 0.20).build()
}

// Inner lip gap of 0.03 over a 0.06 wide mouth
pub fn open_mouth() -> FrameBuilder {
    FrameBuilder::new()
        .neutral_face()
        .face_point(face::UPPER_LIP_INNER, 0.50, 0.24)
        .face_point(face::LOWER_LIP_INNER, 0.50, 0.27)
}
