// Single-frame pose classifiers. Each one is a pure predicate over the frame:
// every required condition is ANDed, and one-handed gestures are ORed across
// the left and right side. Missing or low-visibility points never match.

use crate::config::{
    ElbowTuckArmExtendThresholds, FingerToJawThresholds, FingerToLipThresholds,
    PalmsUpShrugThresholds, SmileAndPointUpThresholds,
};
use crate::data_structures::{face, Landmark, LandmarkFrame, PoseLandmark, Side};
use crate::gestures::geometry::{distance, is_above, joint_angle, midpoint};

// Shoulder, elbow and wrist of one arm, all visible
struct Arm {
    shoulder: Landmark,
    elbow: Landmark,
    wrist: Landmark,
}

impl Arm {
    fn of(frame: &LandmarkFrame, side: Side, min_visibility: f32) -> Option<Arm> {
        Some(Arm {
            shoulder: frame.visible(side.shoulder(), min_visibility)?,
            elbow: frame.visible(side.elbow(), min_visibility)?,
            wrist: frame.visible(side.wrist(), min_visibility)?,
        })
    }

    fn angle(&self) -> Option<f32> {
        joint_angle(&self.shoulder, &self.elbow, &self.wrist)
    }

    fn bent_below(&self, max_degrees: f32) -> bool {
        self.angle().map_or(false, |angle| angle < max_degrees)
    }

    fn extended_beyond(&self, min_degrees: f32) -> bool {
        self.angle().map_or(false, |angle| angle > min_degrees)
    }
}

fn mouth_center(frame: &LandmarkFrame, min_visibility: f32) -> Option<Landmark> {
    let left = frame.visible(PoseLandmark::MouthLeft, min_visibility)?;
    let right = frame.visible(PoseLandmark::MouthRight, min_visibility)?;
    Some(midpoint(&left, &right))
}

/// Index fingertip on the lips with the hand held below the mouth.
pub fn finger_to_lip(frame: &LandmarkFrame, cfg: &FingerToLipThresholds) -> bool {
    let Some(mouth) = mouth_center(frame, cfg.min_visibility) else {
        return false;
    };

    Side::BOTH.iter().any(|&side| {
        let (Some(tip), Some(wrist)) = (
            frame.visible(side.index_finger(), cfg.min_visibility),
            frame.visible(side.wrist(), cfg.min_visibility),
        ) else {
            return false;
        };
        distance(&tip, &mouth) < cfg.max_distance && !is_above(&wrist, &mouth)
    })
}

/// Both elbows bent, both wrists between shoulder and hip height, and the
/// hands spread wider than the shoulders.
pub fn palms_up_shrug(frame: &LandmarkFrame, cfg: &PalmsUpShrugThresholds) -> bool {
    let (Some(left), Some(right)) = (
        Arm::of(frame, Side::Left, cfg.min_visibility),
        Arm::of(frame, Side::Right, cfg.min_visibility),
    ) else {
        return false;
    };
    let (Some(left_hip), Some(right_hip)) = (
        frame.visible(PoseLandmark::LeftHip, cfg.min_visibility),
        frame.visible(PoseLandmark::RightHip, cfg.min_visibility),
    ) else {
        return false;
    };

    let at_torso_height = |arm: &Arm, hip: &Landmark| {
        is_above(&arm.shoulder, &arm.wrist) && is_above(&arm.wrist, hip)
    };

    let shoulder_width = (left.shoulder.x - right.shoulder.x).abs();
    let wrist_spread = (left.wrist.x - right.wrist.x).abs();

    left.bent_below(cfg.max_elbow_angle)
        && right.bent_below(cfg.max_elbow_angle)
        && at_torso_height(&left, &left_hip)
        && at_torso_height(&right, &right_hip)
        && wrist_spread > shoulder_width * cfg.min_spread_ratio
}

// Jaw reference points. FaceMesh points when a face was tracked, otherwise an
// estimate one nose-to-mouth drop below each mouth corner.
fn jaw_points(frame: &LandmarkFrame, min_visibility: f32) -> Vec<Landmark> {
    let from_face: Vec<Landmark> = [face::JAW_LEFT, face::JAW_RIGHT, face::CHIN]
        .iter()
        .filter_map(|&index| frame.face_point(index))
        .filter(|p| p.is_visible(min_visibility))
        .collect();
    if !from_face.is_empty() {
        return from_face;
    }

    let Some(nose) = frame.visible(PoseLandmark::Nose, min_visibility) else {
        return Vec::new();
    };
    [PoseLandmark::MouthLeft, PoseLandmark::MouthRight]
        .iter()
        .filter_map(|&corner| frame.visible(corner, min_visibility))
        .map(|corner| Landmark {
            x: corner.x,
            y: corner.y + (corner.y - nose.y),
            visibility: corner.visibility.min(nose.visibility),
        })
        .collect()
}

/// Index fingertip against the jaw line with the elbow folded.
pub fn finger_to_jaw(frame: &LandmarkFrame, cfg: &FingerToJawThresholds) -> bool {
    let jaw = jaw_points(frame, cfg.min_visibility);
    if jaw.is_empty() {
        return false;
    }

    Side::BOTH.iter().any(|&side| {
        let (Some(arm), Some(tip)) = (
            Arm::of(frame, side, cfg.min_visibility),
            frame.visible(side.index_finger(), cfg.min_visibility),
        ) else {
            return false;
        };
        let near_jaw = jaw.iter().any(|point| distance(&tip, point) < cfg.max_distance);
        near_jaw && arm.bent_below(cfg.max_elbow_angle)
    })
}

/// Mouth corners raised above the inner lip line. Needs face landmarks.
pub fn is_smiling(frame: &LandmarkFrame, min_lift: f32) -> bool {
    let points = [
        face::UPPER_LIP_INNER,
        face::LOWER_LIP_INNER,
        face::MOUTH_CORNER_LEFT,
        face::MOUTH_CORNER_RIGHT,
    ]
    .map(|index| frame.face_point(index));
    let [Some(upper), Some(lower), Some(left), Some(right)] = points else {
        return false;
    };

    let width = distance(&left, &right);
    if width < 1e-4 {
        return false;
    }
    let lip_line = midpoint(&upper, &lower);
    let corners = midpoint(&left, &right);
    (lip_line.y - corners.y) / width > min_lift
}

/// Smiling while one straight arm points the index finger at the ceiling.
pub fn smile_and_point_up(frame: &LandmarkFrame, cfg: &SmileAndPointUpThresholds) -> bool {
    if !is_smiling(frame, cfg.min_smile_lift) {
        return false;
    }

    Side::BOTH.iter().any(|&side| {
        let (Some(arm), Some(tip)) = (
            Arm::of(frame, side, cfg.min_visibility),
            frame.visible(side.index_finger(), cfg.min_visibility),
        ) else {
            return false;
        };
        is_above(&arm.wrist, &arm.shoulder)
            && is_above(&tip, &arm.wrist)
            && arm.extended_beyond(cfg.min_elbow_angle)
    })
}

/// One elbow folded against the body, the other arm stretched outwards.
pub fn elbow_tuck_arm_extend(frame: &LandmarkFrame, cfg: &ElbowTuckArmExtendThresholds) -> bool {
    Side::BOTH.iter().any(|&tucked_side| {
        let extended_side = tucked_side.opposite();
        let (Some(tucked), Some(hip), Some(extended)) = (
            Arm::of(frame, tucked_side, cfg.min_visibility),
            frame.visible(tucked_side.hip(), cfg.min_visibility),
            Arm::of(frame, extended_side, cfg.min_visibility),
        ) else {
            return false;
        };

        let is_tucked = tucked.bent_below(cfg.max_tucked_angle)
            && (tucked.elbow.x - hip.x).abs() < cfg.max_tuck_offset
            && is_above(&tucked.shoulder, &tucked.elbow);

        let reach = |p: &Landmark| (p.x - extended.shoulder.x).abs();
        let is_extended = extended.extended_beyond(cfg.min_extended_angle)
            && reach(&extended.wrist) > reach(&extended.elbow);

        is_tucked && is_extended
    })
}
