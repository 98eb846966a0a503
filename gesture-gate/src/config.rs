use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GateError, Result};
use crate::gestures::types::GestureKind;

/// Thresholds shared by the oscillation-based (dynamic) classifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillationThresholds {
    pub min_samples: usize,   // No verdict before the window holds this many samples
    pub min_amplitude: f32,   // Window range (max - min) must reach this
    pub noise_floor: f32,     // Deltas at or below this are ignored when counting reversals
    pub min_reversals: usize, // Direction changes needed to call it an oscillation
    pub min_visibility: f32,
}

impl Default for OscillationThresholds {
    fn default() -> Self {
        OscillationThresholds {
            min_samples: 15,
            min_amplitude: 0.08,
            noise_floor: 0.015,
            min_reversals: 3,
            min_visibility: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TongueAndHeadshakeThresholds {
    pub head: OscillationThresholds,
    pub min_mouth_open_ratio: f32, // Inner lip gap / mouth width
}

impl Default for TongueAndHeadshakeThresholds {
    fn default() -> Self {
        TongueAndHeadshakeThresholds {
            head: OscillationThresholds {
                min_samples: 15,
                min_amplitude: 0.04,
                noise_floor: 0.008,
                min_reversals: 3,
                min_visibility: 0.2,
            },
            min_mouth_open_ratio: 0.35,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerToLipThresholds {
    pub max_distance: f32, // Index tip to mouth center
    pub min_visibility: f32,
}

impl Default for FingerToLipThresholds {
    fn default() -> Self {
        FingerToLipThresholds { max_distance: 0.07, min_visibility: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PalmsUpShrugThresholds {
    pub max_elbow_angle: f32,  // Both elbows must be bent below this (degrees)
    pub min_spread_ratio: f32, // Wrist spread relative to shoulder width
    pub min_visibility: f32,
}

impl Default for PalmsUpShrugThresholds {
    fn default() -> Self {
        PalmsUpShrugThresholds {
            max_elbow_angle: 130.0,
            min_spread_ratio: 1.0,
            min_visibility: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerToJawThresholds {
    pub max_distance: f32, // Index tip to nearest jaw point
    pub max_elbow_angle: f32,
    pub min_visibility: f32,
}

impl Default for FingerToJawThresholds {
    fn default() -> Self {
        FingerToJawThresholds {
            max_distance: 0.1,
            max_elbow_angle: 120.0,
            min_visibility: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileAndPointUpThresholds {
    pub min_smile_lift: f32,      // Corner lift above the lip line, relative to mouth width
    pub min_elbow_angle: f32,     // Pointing arm must be extended beyond this
    pub min_visibility: f32,
}

impl Default for SmileAndPointUpThresholds {
    fn default() -> Self {
        SmileAndPointUpThresholds {
            min_smile_lift: 0.04,
            min_elbow_angle: 110.0,
            min_visibility: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElbowTuckArmExtendThresholds {
    pub max_tucked_angle: f32,
    pub max_tuck_offset: f32, // Horizontal elbow distance from the hip on the tucked side
    pub min_extended_angle: f32,
    pub min_visibility: f32,
}

impl Default for ElbowTuckArmExtendThresholds {
    fn default() -> Self {
        ElbowTuckArmExtendThresholds {
            max_tucked_angle: 120.0,
            max_tuck_offset: 0.12,
            min_extended_angle: 110.0,
            min_visibility: 0.5,
        }
    }
}

/// Per-gesture tuning, kept apart from classifier logic so each can be tested
/// against custom values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    pub oscillating_hands: OscillationThresholds,
    pub tongue_and_headshake: TongueAndHeadshakeThresholds,
    pub finger_to_lip: FingerToLipThresholds,
    pub palms_up_shrug: PalmsUpShrugThresholds,
    pub finger_to_jaw: FingerToJawThresholds,
    pub smile_and_point_up: SmileAndPointUpThresholds,
    pub elbow_tuck_arm_extend: ElbowTuckArmExtendThresholds,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    // Challenge shape
    pub stage_count: usize,
    pub confidence_threshold: u32, // Consecutive matching frames per stage
    #[serde(with = "humantime_serde")]
    pub transition_cooldown: Duration,
    pub history_capacity: usize,

    // Control server
    pub listen_addr: String,
    pub asset_dirs: Vec<PathBuf>, // Searched in order for reference images
    #[serde(with = "humantime_serde")]
    pub header_read_timeout: Duration,
    pub max_request_bytes: usize,

    // Sessions
    #[serde(with = "humantime_serde")]
    pub session_expiry: Option<Duration>, // None keeps sessions until resolved

    pub gestures: GestureThresholds,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            stage_count: 3,
            confidence_threshold: 5,
            transition_cooldown: Duration::from_millis(2000),
            history_capacity: 30,

            listen_addr: "127.0.0.1:3742".to_string(),
            asset_dirs: vec![
                PathBuf::from("assets"),
                PathBuf::from("gate-host/assets"),
                PathBuf::from("../assets"),
            ],
            header_read_timeout: Duration::from_secs(10),
            max_request_bytes: 64 * 1024,

            session_expiry: None,

            gestures: GestureThresholds::default(),
        }
    }
}

impl GateConfig {
    /// Reads a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: GateConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stage_count == 0 || self.stage_count > GestureKind::ALL.len() {
            return Err(GateError::Config(format!(
                "stage_count must be between 1 and {}, got {}",
                GestureKind::ALL.len(),
                self.stage_count
            )));
        }
        if self.confidence_threshold == 0 {
            return Err(GateError::Config("confidence_threshold must be at least 1".into()));
        }
        let needed = self
            .gestures
            .oscillating_hands
            .min_samples
            .max(self.gestures.tongue_and_headshake.head.min_samples);
        if self.history_capacity < needed {
            return Err(GateError::Config(format!(
                "history_capacity {} is smaller than the {} samples a motion gesture needs",
                self.history_capacity, needed
            )));
        }
        Ok(())
    }
}
