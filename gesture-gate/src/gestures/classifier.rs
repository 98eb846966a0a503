// Fixed mapping from gesture kind to its classifier

use crate::config::GestureThresholds;
use crate::data_structures::LandmarkFrame;
use crate::gestures::history::MotionHistory;
use crate::gestures::types::GestureKind;
use crate::gestures::{motion, static_pose};

/// Runs the classifier for `kind` against one frame.
///
/// Static gestures only read the frame. Dynamic gestures also push their
/// tracked feature into `history`, which is the only side effect.
pub fn matches(
    kind: GestureKind,
    frame: &LandmarkFrame,
    history: &mut MotionHistory,
    thresholds: &GestureThresholds,
) -> bool {
    if !frame.has_pose() {
        return false;
    }
    match kind {
        GestureKind::OscillatingHands => {
            motion::oscillating_hands(frame, history, &thresholds.oscillating_hands)
        }
        GestureKind::TongueAndHeadshake => {
            motion::tongue_and_headshake(frame, history, &thresholds.tongue_and_headshake)
        }
        GestureKind::FingerToLip => static_pose::finger_to_lip(frame, &thresholds.finger_to_lip),
        GestureKind::PalmsUpShrug => static_pose::palms_up_shrug(frame, &thresholds.palms_up_shrug),
        GestureKind::FingerToJaw => static_pose::finger_to_jaw(frame, &thresholds.finger_to_jaw),
        GestureKind::SmileAndPointUp => {
            static_pose::smile_and_point_up(frame, &thresholds.smile_and_point_up)
        }
        GestureKind::ElbowTuckArmExtend => {
            static_pose::elbow_tuck_arm_extend(frame, &thresholds.elbow_tuck_arm_extend)
        }
    }
}
