// Motion classifiers: feed one scalar per frame into the motion history and
// look for a back-and-forth oscillation in the resulting window.

use crate::config::{OscillationThresholds, TongueAndHeadshakeThresholds};
use crate::data_structures::{face, LandmarkFrame, PoseLandmark, Side};
use crate::gestures::geometry::distance;
use crate::gestures::history::{HistoryKey, MotionHistory};
use crate::gestures::types::{GestureKind, MotionFeature};

/// Range (max - min) of a window. Zero for an empty window.
pub fn amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let (min, max) = samples
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    max - min
}

/// Counts direction reversals between consecutive deltas, ignoring any delta
/// whose magnitude does not exceed `noise_floor`.
pub fn count_reversals(samples: &[f32], noise_floor: f32) -> usize {
    let mut reversals = 0;
    let mut last_direction: Option<bool> = None; // true = increasing

    for pair in samples.windows(2) {
        let delta = pair[1] - pair[0];
        if delta.abs() <= noise_floor {
            continue;
        }
        let rising = delta > 0.0;
        if let Some(previous) = last_direction {
            if previous != rising {
                reversals += 1;
            }
        }
        last_direction = Some(rising);
    }
    reversals
}

/// Window-level oscillation test: enough samples, enough travel, enough reversals.
pub fn oscillates(samples: &[f32], cfg: &OscillationThresholds) -> bool {
    samples.len() >= cfg.min_samples
        && amplitude(samples) >= cfg.min_amplitude
        && count_reversals(samples, cfg.noise_floor) >= cfg.min_reversals
}

/// Both wrists moving up and down. Each visible frame pushes both wrists'
/// heights; a frame missing either wrist pushes nothing and does not match.
pub fn oscillating_hands(
    frame: &LandmarkFrame,
    history: &mut MotionHistory,
    cfg: &OscillationThresholds,
) -> bool {
    let (Some(left), Some(right)) = (
        frame.visible(Side::Left.wrist(), cfg.min_visibility),
        frame.visible(Side::Right.wrist(), cfg.min_visibility),
    ) else {
        return false;
    };

    let left_key = HistoryKey::new(GestureKind::OscillatingHands, MotionFeature::LeftWristY);
    let right_key = HistoryKey::new(GestureKind::OscillatingHands, MotionFeature::RightWristY);
    history.push(left_key, left.y);
    history.push(right_key, right.y);

    oscillates(&history.window(left_key), cfg) && oscillates(&history.window(right_key), cfg)
}

/// Vertical inner-lip gap over mouth width, or `None` without face landmarks.
pub fn mouth_open_ratio(frame: &LandmarkFrame) -> Option<f32> {
    let upper = frame.face_point(face::UPPER_LIP_INNER)?;
    let lower = frame.face_point(face::LOWER_LIP_INNER)?;
    let left = frame.face_point(face::MOUTH_CORNER_LEFT)?;
    let right = frame.face_point(face::MOUTH_CORNER_RIGHT)?;

    let width = distance(&left, &right);
    if width < 1e-4 {
        return None;
    }
    Some((lower.y - upper.y).abs() / width)
}

/// Head shaking side to side with the mouth wide open.
pub fn tongue_and_headshake(
    frame: &LandmarkFrame,
    history: &mut MotionHistory,
    cfg: &TongueAndHeadshakeThresholds,
) -> bool {
    let Some(nose) = frame.visible(PoseLandmark::Nose, cfg.head.min_visibility) else {
        return false;
    };

    let key = HistoryKey::new(GestureKind::TongueAndHeadshake, MotionFeature::NoseX);
    history.push(key, nose.x);

    let mouth_open = mouth_open_ratio(frame).map_or(false, |ratio| ratio > cfg.min_mouth_open_ratio);
    mouth_open && oscillates(&history.window(key), &cfg.head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, FrameBuilder};

    fn hands_cfg() -> OscillationThresholds {
        OscillationThresholds::default()
    }

    fn alternating(len: usize, low: f32, high: f32) -> Vec<f32> {
        (0..len).map(|i| if i % 2 == 0 { low } else { high }).collect()
    }

    #[test]
    fn amplitude_of_window() {
        assert_eq!(amplitude(&[]), 0.0);
        assert!((amplitude(&[0.3, 0.1, 0.25]) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn reversals_count_direction_changes() {
        assert_eq!(count_reversals(&[0.0, 0.1, 0.0, 0.1, 0.0], 0.01), 3);
        let rising: Vec<f32> = (0..20).map(|i| i as f32 * 0.05).collect();
        assert_eq!(count_reversals(&rising, 0.01), 0);
    }

    #[test]
    fn reversals_skip_jitter_below_noise_floor() {
        // Small wobble between two big strokes is ignored
        let samples = [0.0, 0.2, 0.205, 0.2, 0.0];
        assert_eq!(count_reversals(&samples, 0.015), 1);
        // A delta exactly at the floor is noise too
        assert_eq!(count_reversals(&[0.0, 0.5, 0.0], 0.5), 0);
    }

    #[test]
    fn alternating_window_oscillates() {
        let window = alternating(20, 0.0, 0.12);
        assert!(oscillates(&window, &hands_cfg()));
    }

    #[test]
    fn monotonic_window_never_oscillates() {
        let window: Vec<f32> = (0..20).map(|i| i as f32 * 0.1).collect();
        assert!(amplitude(&window) > 1.0);
        assert!(!oscillates(&window, &hands_cfg()));
    }

    #[test]
    fn short_or_shallow_windows_do_not_oscillate() {
        assert!(!oscillates(&alternating(14, 0.0, 0.12), &hands_cfg()));
        assert!(oscillates(&alternating(15, 0.0, 0.12), &hands_cfg()));
        // Fast jitter that never travels far enough
        assert!(!oscillates(&alternating(20, 0.0, 0.05), &hands_cfg()));
    }

    #[test]
    fn reversal_count_boundary_is_inclusive() {
        let cfg = OscillationThresholds {
            min_samples: 4,
            min_amplitude: 0.05,
            noise_floor: 0.01,
            min_reversals: 3,
            ..hands_cfg()
        };
        let three = [0.0, 0.1, 0.0, 0.1, 0.0];
        let two = [0.0, 0.1, 0.0, 0.1];
        assert_eq!(count_reversals(&three, cfg.noise_floor), 3);
        assert_eq!(count_reversals(&two, cfg.noise_floor), 2);

        assert!(oscillates(&three, &cfg));
        assert!(!oscillates(&two, &cfg));
        assert!(!oscillates(&three, &OscillationThresholds { min_reversals: 4, ..cfg }));
    }

    #[test]
    fn amplitude_boundary_is_inclusive() {
        let window = alternating(20, 0.0, 0.5);
        let exact = OscillationThresholds { min_amplitude: 0.5, noise_floor: 0.1, ..hands_cfg() };
        assert!(oscillates(&window, &exact));
    }

    #[test]
    fn oscillating_hands_matches_after_min_samples() {
        let cfg = hands_cfg();
        let mut history = MotionHistory::new(30);
        for step in 0..20 {
            let matched = oscillating_hands(&test_utils::oscillating_hands(step, 0.12), &mut history, &cfg);
            // 15 samples give 13 reversals, which is the first frame with a verdict
            assert_eq!(matched, step >= 14, "step {}", step);
        }
    }

    #[test]
    fn oscillating_hands_needs_both_wrists() {
        let cfg = hands_cfg();
        let mut history = MotionHistory::new(30);
        for step in 0..20 {
            // Only the left wrist waves; the right hand stays put
            let y = if step % 2 == 0 { 0.30 } else { 0.42 };
            let frame = FrameBuilder::new().point(PoseLandmark::LeftWrist, 0.7, y).build();
            assert!(!oscillating_hands(&frame, &mut history, &cfg));
        }
    }

    #[test]
    fn oscillating_hands_ignores_hidden_wrists() {
        let cfg = hands_cfg();
        let mut history = MotionHistory::new(30);
        let frame = FrameBuilder::new().visibility(PoseLandmark::RightWrist, 0.1).build();
        assert!(!oscillating_hands(&frame, &mut history, &cfg));
        assert!(history.is_empty());
    }

    #[test]
    fn mouth_open_ratio_from_face() {
        let open = test_utils::open_mouth().build();
        let closed = test_utils::neutral_frame();
        assert!((mouth_open_ratio(&open).unwrap() - 0.5).abs() < 1e-3);
        assert!(mouth_open_ratio(&closed).unwrap() < 0.35);
        assert!(mouth_open_ratio(&FrameBuilder::new().build()).is_none());
    }

    #[test]
    fn tongue_and_headshake_matches() {
        let cfg = TongueAndHeadshakeThresholds::default();
        let mut history = MotionHistory::new(30);
        let verdicts: Vec<bool> = (0..20)
            .map(|step| tongue_and_headshake(&test_utils::tongue_and_headshake(step, 0.06), &mut history, &cfg))
            .collect();
        assert!(!verdicts[13]);
        assert!(verdicts[19]);
    }

    #[test]
    fn mouth_open_ratio_boundary_is_strict() {
        let ratio = mouth_open_ratio(&test_utils::tongue_and_headshake(0, 0.06)).unwrap();
        let run = |min_mouth_open_ratio: f32| {
            let cfg = TongueAndHeadshakeThresholds { min_mouth_open_ratio, ..Default::default() };
            let mut history = MotionHistory::new(30);
            (0..20)
                .map(|step| tongue_and_headshake(&test_utils::tongue_and_headshake(step, 0.06), &mut history, &cfg))
                .any(|matched| matched)
        };

        assert!(!run(ratio));
        assert!(run(ratio - 0.001));
        // The stock threshold sits below the fixture's half-open mouth
        assert!(ratio > TongueAndHeadshakeThresholds::default().min_mouth_open_ratio);
    }

    #[test]
    fn headshake_with_closed_mouth_fails() {
        let cfg = TongueAndHeadshakeThresholds::default();
        let mut history = MotionHistory::new(30);
        for step in 0..20 {
            let x = if step % 2 == 0 { 0.50 } else { 0.56 };
            let frame = FrameBuilder::new().neutral_face().point(PoseLandmark::Nose, x, 0.2).build();
            assert!(!tongue_and_headshake(&frame, &mut history, &cfg));
        }
        // Motion was still recorded
        let key = HistoryKey::new(GestureKind::TongueAndHeadshake, MotionFeature::NoseX);
        assert_eq!(history.len(key), 20);
    }

    #[test]
    fn open_mouth_without_head_motion_fails() {
        let cfg = TongueAndHeadshakeThresholds::default();
        let mut history = MotionHistory::new(30);
        let frame = test_utils::open_mouth().build();
        for _ in 0..20 {
            assert!(!tongue_and_headshake(&frame, &mut history, &cfg));
        }
    }
}
