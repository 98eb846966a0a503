// Gesture identifiers and the fixed metadata attached to each of them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    OscillatingHands,
    TongueAndHeadshake,
    FingerToLip,
    PalmsUpShrug,
    FingerToJaw,
    SmileAndPointUp,
    ElbowTuckArmExtend,
}

impl GestureKind {
    pub const ALL: [GestureKind; 7] = [
        GestureKind::OscillatingHands,
        GestureKind::TongueAndHeadshake,
        GestureKind::FingerToLip,
        GestureKind::PalmsUpShrug,
        GestureKind::FingerToJaw,
        GestureKind::SmileAndPointUp,
        GestureKind::ElbowTuckArmExtend,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            GestureKind::OscillatingHands => "oscillating-hands",
            GestureKind::TongueAndHeadshake => "tongue-and-headshake",
            GestureKind::FingerToLip => "finger-to-lip",
            GestureKind::PalmsUpShrug => "palms-up-shrug",
            GestureKind::FingerToJaw => "finger-to-jaw",
            GestureKind::SmileAndPointUp => "smile-and-point-up",
            GestureKind::ElbowTuckArmExtend => "elbow-tuck-arm-extend",
        }
    }

    /// Instruction shown to the user while this stage is active.
    pub fn instruction(self) -> &'static str {
        match self {
            GestureKind::OscillatingHands => "Raise both hands and wave them up and down",
            GestureKind::TongueAndHeadshake => "Open your mouth, stick out your tongue and shake your head",
            GestureKind::FingerToLip => "Press one index finger to your lips",
            GestureKind::PalmsUpShrug => "Shrug with both palms up and hands out to the sides",
            GestureKind::FingerToJaw => "Touch your jaw with one index finger",
            GestureKind::SmileAndPointUp => "Smile and point one finger straight up",
            GestureKind::ElbowTuckArmExtend => "Tuck one elbow to your side and stretch the other arm out",
        }
    }

    /// Reference image served from the asset directories.
    pub fn image_name(self) -> &'static str {
        match self {
            GestureKind::OscillatingHands => "oscillating_hands.jpg",
            GestureKind::TongueAndHeadshake => "tongue_and_headshake.jpg",
            GestureKind::FingerToLip => "finger_to_lip.jpg",
            GestureKind::PalmsUpShrug => "palms_up_shrug.jpg",
            GestureKind::FingerToJaw => "finger_to_jaw.jpg",
            GestureKind::SmileAndPointUp => "smile_and_point_up.jpg",
            GestureKind::ElbowTuckArmExtend => "elbow_tuck_arm_extend.jpg",
        }
    }

    /// Dynamic gestures need several frames of motion history before a verdict.
    pub fn is_dynamic(self) -> bool {
        matches!(self, GestureKind::OscillatingHands | GestureKind::TongueAndHeadshake)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for GestureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("unknown gesture kind: {}", s))
    }
}

/// Scalar features tracked across frames by the dynamic classifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MotionFeature {
    LeftWristY,
    RightWristY,
    NoseX,
}

impl MotionFeature {
    pub fn name(self) -> &'static str {
        match self {
            MotionFeature::LeftWristY => "left_wrist_y",
            MotionFeature::RightWristY => "right_wrist_y",
            MotionFeature::NoseX => "nose_x",
        }
    }
}
