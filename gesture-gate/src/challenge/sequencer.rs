// Multi-stage challenge state machine
//
// Stage lifecycle: Pending -> Matching -> Matched -> Transitioning -> next stage
// (or Complete after the last one). Confidence only accumulates over strictly
// consecutive matching frames.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

use crate::challenge::types::{
    ChallengeSnapshot, ChallengeStatus, FrameOutcome, GestureStage, StagePlan, StageStatus,
};
use crate::config::{GateConfig, GestureThresholds};
use crate::data_structures::LandmarkFrame;
use crate::gestures::classifier;
use crate::gestures::history::MotionHistory;
use crate::gestures::types::GestureKind;

/// Draws `count` distinct gesture kinds in random order.
pub fn random_kinds<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<GestureKind> {
    let mut kinds = GestureKind::ALL.to_vec();
    kinds.shuffle(rng);
    kinds.truncate(count);
    kinds
}

pub fn random_challenge_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 8] = rng.gen();
    hex::encode(bytes)
}

#[derive(Debug)]
pub struct Challenge {
    id: String,
    stages: Vec<GestureStage>,
    cursor: usize,
    status: ChallengeStatus,
    history: MotionHistory, // Dropped with the challenge
    thresholds: GestureThresholds,
    cooldown: Duration,
    transition_until: Option<Instant>,
}

impl Challenge {
    /// Builds a challenge over an explicit stage order.
    pub fn new(id: impl Into<String>, kinds: Vec<GestureKind>, config: &GateConfig) -> Self {
        let stages: Vec<GestureStage> = kinds
            .into_iter()
            .map(|kind| GestureStage::new(kind, config.confidence_threshold))
            .collect();
        let status = if stages.is_empty() {
            ChallengeStatus::Complete
        } else {
            ChallengeStatus::InProgress
        };
        Challenge {
            id: id.into(),
            stages,
            cursor: 0,
            status,
            history: MotionHistory::new(config.history_capacity),
            thresholds: config.gestures.clone(),
            cooldown: config.transition_cooldown,
            transition_until: None,
        }
    }

    /// Builds a challenge of `config.stage_count` distinct gestures in random order.
    pub fn random<R: Rng + ?Sized>(config: &GateConfig, rng: &mut R) -> Self {
        let id = random_challenge_id(rng);
        let kinds = random_kinds(config.stage_count, rng);
        info!("Challenge {}: stages {:?}", id, kinds);
        Challenge::new(id, kinds, config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == ChallengeStatus::Complete
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stages(&self) -> &[GestureStage] {
        &self.stages
    }

    pub fn current_stage(&self) -> Option<&GestureStage> {
        match self.status {
            ChallengeStatus::InProgress => self.stages.get(self.cursor),
            _ => None,
        }
    }

    pub fn history(&self) -> &MotionHistory {
        &self.history
    }

    pub fn plan(&self) -> Vec<StagePlan> {
        self.stages.iter().map(|stage| StagePlan::for_kind(stage.kind)).collect()
    }

    pub fn snapshot(&self) -> ChallengeSnapshot {
        ChallengeSnapshot {
            id: self.id.clone(),
            status: self.status,
            cursor: self.cursor,
            stages: self.stages.clone(),
        }
    }

    /// Feeds one estimation cycle. `None` (or a frame without a pose) means
    /// landmarks were absent and counts as a miss.
    pub fn process_frame(&mut self, frame: Option<&LandmarkFrame>, now: Instant) -> FrameOutcome {
        if self.status != ChallengeStatus::InProgress {
            return FrameOutcome::Inactive;
        }
        if !self.poll_transition(now) {
            return FrameOutcome::CoolingDown { stage: self.cursor };
        }

        let index = self.cursor;
        let stage = &mut self.stages[index];
        if stage.status == StageStatus::Pending {
            stage.status = StageStatus::Matching;
        }

        let matched = match frame {
            Some(frame) => classifier::matches(stage.kind, frame, &mut self.history, &self.thresholds),
            None => false,
        };

        if !matched {
            if stage.confidence_count > 0 {
                debug!("Challenge {}: stage {} ({}) lost its streak at {}", self.id, index, stage.kind, stage.confidence_count);
            }
            stage.confidence_count = 0;
            return FrameOutcome::Miss { stage: index };
        }

        stage.confidence_count += 1;
        if stage.confidence_count < stage.threshold {
            return FrameOutcome::Progress { stage: index, confidence: stage.confidence_count };
        }

        let kind = stage.kind;
        stage.status = StageStatus::Matched;
        info!("Challenge {}: stage {} ({}) matched", self.id, index, kind);

        if index + 1 == self.stages.len() {
            self.finish_stage(index);
            self.status = ChallengeStatus::Complete;
            info!("Challenge {}: complete", self.id);
            return FrameOutcome::Complete;
        }

        if self.cooldown.is_zero() {
            self.finish_stage(index);
        } else {
            self.stages[index].status = StageStatus::Transitioning;
            self.transition_until = Some(now + self.cooldown);
        }
        FrameOutcome::StageMatched { stage: index, kind }
    }

    /// Ends a pending cooldown once it has elapsed. Returns `true` when the
    /// current stage is ready to classify frames.
    pub fn poll_transition(&mut self, now: Instant) -> bool {
        match self.transition_until {
            Some(until) if now < until => false,
            Some(_) => {
                self.transition_until = None;
                self.finish_stage(self.cursor);
                true
            }
            None => true,
        }
    }

    /// Gives up on the challenge; all motion history goes with it.
    pub fn abandon(&mut self) {
        if self.status == ChallengeStatus::InProgress {
            info!("Challenge {}: abandoned at stage {}", self.id, self.cursor);
            self.status = ChallengeStatus::Abandoned;
            self.transition_until = None;
            self.history.clear(None);
        }
    }

    // Clears the stage's motion history and counters, then moves the cursor on
    fn finish_stage(&mut self, index: usize) {
        let stage = &mut self.stages[index];
        stage.status = StageStatus::Matched;
        stage.confidence_count = 0;
        self.history.clear_gesture(stage.kind);

        if index + 1 < self.stages.len() {
            self.cursor = index + 1;
            debug!("Challenge {}: advancing to stage {} ({})", self.id, self.cursor, self.stages[self.cursor].kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn instant_config() -> GateConfig {
        GateConfig { transition_cooldown: Duration::ZERO, ..Default::default() }
    }

    fn feed(challenge: &mut Challenge, frame: &LandmarkFrame, times: usize, now: Instant) -> FrameOutcome {
        let mut outcome = FrameOutcome::Inactive;
        for _ in 0..times {
            outcome = challenge.process_frame(Some(frame), now);
        }
        outcome
    }

    #[test]
    fn random_kinds_are_distinct() {
        let mut rng = SmallRng::seed_from_u64(7);
        for count in 1..=GestureKind::ALL.len() {
            let kinds = random_kinds(count, &mut rng);
            let unique: HashSet<_> = kinds.iter().collect();
            assert_eq!(kinds.len(), count);
            assert_eq!(unique.len(), count);
        }
    }

    #[test]
    fn random_challenge_uses_configured_length() {
        let mut rng = SmallRng::seed_from_u64(1);
        let challenge = Challenge::random(&GateConfig::default(), &mut rng);
        assert_eq!(challenge.stages().len(), 3);
        assert_eq!(challenge.id().len(), 16);
        assert_eq!(challenge.status(), ChallengeStatus::InProgress);
        assert!(challenge.stages().iter().all(|s| s.status == StageStatus::Pending && s.threshold == 5));
    }

    #[test]
    fn first_frame_moves_stage_to_matching() {
        let mut challenge = Challenge::new("c", vec![GestureKind::FingerToLip], &instant_config());
        challenge.process_frame(Some(&test_utils::neutral_frame()), Instant::now());
        assert_eq!(challenge.stages()[0].status, StageStatus::Matching);
    }

    #[test]
    fn threshold_consecutive_matches_are_necessary_and_sufficient() {
        let now = Instant::now();
        let frame = test_utils::finger_to_lip().build();

        let mut short = Challenge::new("short", vec![GestureKind::FingerToLip], &instant_config());
        assert_eq!(feed(&mut short, &frame, 4, now), FrameOutcome::Progress { stage: 0, confidence: 4 });
        assert!(!short.is_complete());

        let mut exact = Challenge::new("exact", vec![GestureKind::FingerToLip], &instant_config());
        assert_eq!(feed(&mut exact, &frame, 5, now), FrameOutcome::Complete);
        assert!(exact.is_complete());
    }

    #[test]
    fn a_single_miss_resets_confidence() {
        let now = Instant::now();
        let hit = test_utils::finger_to_lip().build();
        let miss = test_utils::neutral_frame();
        let mut challenge = Challenge::new("c", vec![GestureKind::FingerToLip], &instant_config());

        for streak in 1..=4u32 {
            feed(&mut challenge, &hit, streak as usize, now);
            assert_eq!(challenge.stages()[0].confidence_count, streak);
            assert_eq!(challenge.process_frame(Some(&miss), now), FrameOutcome::Miss { stage: 0 });
            assert_eq!(challenge.stages()[0].confidence_count, 0);
        }
        // Absent landmarks reset just the same
        feed(&mut challenge, &hit, 3, now);
        challenge.process_frame(None, now);
        assert_eq!(challenge.stages()[0].confidence_count, 0);
        challenge.process_frame(Some(&test_utils::empty_frame(0.0)), now);
        assert_eq!(challenge.stages()[0].confidence_count, 0);
        assert!(!challenge.is_complete());
    }

    #[test]
    fn stages_complete_in_order() {
        let now = Instant::now();
        let kinds = vec![GestureKind::PalmsUpShrug, GestureKind::FingerToJaw, GestureKind::ElbowTuckArmExtend];
        let mut challenge = Challenge::new("c", kinds, &instant_config());

        // Showing a later stage's gesture does nothing for the current one
        feed(&mut challenge, &test_utils::finger_to_jaw().build(), 10, now);
        assert_eq!(challenge.cursor(), 0);

        assert_eq!(
            feed(&mut challenge, &test_utils::palms_up_shrug().build(), 5, now),
            FrameOutcome::StageMatched { stage: 0, kind: GestureKind::PalmsUpShrug }
        );
        assert_eq!(challenge.cursor(), 1);
        feed(&mut challenge, &test_utils::finger_to_jaw().build(), 5, now);
        assert_eq!(challenge.cursor(), 2);
        assert_eq!(
            feed(&mut challenge, &test_utils::elbow_tuck_arm_extend().build(), 5, now),
            FrameOutcome::Complete
        );
        assert!(challenge.stages().iter().all(|s| s.status == StageStatus::Matched));
        assert!(challenge.current_stage().is_none());
    }

    #[test]
    fn cooldown_freezes_classification() {
        let config = GateConfig::default(); // 2s cooldown
        let start = Instant::now();
        let lip = test_utils::finger_to_lip().build();
        let jaw = test_utils::finger_to_jaw().build();
        let mut challenge = Challenge::new("c", vec![GestureKind::FingerToLip, GestureKind::FingerToJaw], &config);

        feed(&mut challenge, &lip, 5, start);
        assert_eq!(challenge.stages()[0].status, StageStatus::Transitioning);
        assert_eq!(challenge.cursor(), 0);

        // Matching frames during the cooldown do not count
        let mid = start + Duration::from_millis(1999);
        assert_eq!(challenge.process_frame(Some(&jaw), mid), FrameOutcome::CoolingDown { stage: 0 });
        assert_eq!(challenge.stages()[1].confidence_count, 0);

        let after = start + Duration::from_millis(2000);
        assert_eq!(challenge.process_frame(Some(&jaw), after), FrameOutcome::Progress { stage: 1, confidence: 1 });
        assert_eq!(challenge.stages()[0].status, StageStatus::Matched);
        assert_eq!(challenge.stages()[0].confidence_count, 0);
        assert_eq!(challenge.cursor(), 1);
    }

    #[test]
    fn finishing_a_motion_stage_clears_its_history() {
        let now = Instant::now();
        let config = instant_config();
        let mut challenge = Challenge::new(
            "c",
            vec![GestureKind::OscillatingHands, GestureKind::FingerToLip],
            &config,
        );

        let mut step = 0;
        while challenge.cursor() == 0 {
            challenge.process_frame(Some(&test_utils::oscillating_hands(step, 0.12)), now);
            step += 1;
            assert!(step < 40, "stage never matched");
        }
        // 15 frames to fill the window, then 5 consecutive matches
        assert_eq!(step, 19);
        assert!(challenge.history().is_empty());
    }

    #[test]
    fn frames_after_completion_are_inactive() {
        let now = Instant::now();
        let frame = test_utils::finger_to_lip().build();
        let mut challenge = Challenge::new("c", vec![GestureKind::FingerToLip], &instant_config());
        feed(&mut challenge, &frame, 5, now);
        assert_eq!(challenge.process_frame(Some(&frame), now), FrameOutcome::Inactive);
    }

    #[test]
    fn abandon_clears_history_and_stops() {
        let now = Instant::now();
        let mut challenge = Challenge::new("c", vec![GestureKind::OscillatingHands], &instant_config());
        for step in 0..5 {
            challenge.process_frame(Some(&test_utils::oscillating_hands(step, 0.12)), now);
        }
        assert!(!challenge.history().is_empty());

        challenge.abandon();
        assert_eq!(challenge.status(), ChallengeStatus::Abandoned);
        assert!(challenge.history().is_empty());
        assert_eq!(
            challenge.process_frame(Some(&test_utils::oscillating_hands(5, 0.12)), now),
            FrameOutcome::Inactive
        );
    }

    #[test]
    fn snapshot_reflects_progress() {
        let now = Instant::now();
        let mut challenge = Challenge::new("snap", vec![GestureKind::FingerToLip, GestureKind::PalmsUpShrug], &instant_config());
        feed(&mut challenge, &test_utils::finger_to_lip().build(), 2, now);

        let snapshot = challenge.snapshot();
        assert_eq!(snapshot.id, "snap");
        assert_eq!(snapshot.cursor, 0);
        assert_eq!(snapshot.stages[0].confidence_count, 2);
        assert_eq!(snapshot.stages[1].status, StageStatus::Pending);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["stages"][0]["kind"], "finger-to-lip");
        assert_eq!(json["status"], "in_progress");
    }
}
