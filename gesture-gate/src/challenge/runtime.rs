// Frame-driven challenge loop. Runs in the browser-side context: it only
// suspends while waiting for the next frame, never mid-classification.

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::challenge::sequencer::Challenge;
use crate::challenge::types::{ChallengeStatus, FrameOutcome};
use crate::data_structures::LandmarkFrame;
use crate::error::Result;
use crate::protocol::CompletionPayload;

/// Supplies one landmark frame per estimation cycle.
#[async_trait]
pub trait FrameSource: Send {
    /// `None` once the source is gone (page closed, camera released).
    async fn next_frame(&mut self) -> Option<LandmarkFrame>;
}

/// Delivers the single completion message to the waiting host.
#[async_trait]
pub trait CompletionSignal: Send + Sync {
    async fn signal_complete(&self, payload: &CompletionPayload) -> Result<()>;
}

/// Frame source fed through a tokio channel.
pub struct ChannelFrameSource {
    rx: mpsc::Receiver<LandmarkFrame>,
}

impl ChannelFrameSource {
    pub fn new(rx: mpsc::Receiver<LandmarkFrame>) -> Self {
        ChannelFrameSource { rx }
    }

    pub fn channel(capacity: usize) -> (mpsc::Sender<LandmarkFrame>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, ChannelFrameSource::new(rx))
    }
}

#[async_trait]
impl FrameSource for ChannelFrameSource {
    async fn next_frame(&mut self) -> Option<LandmarkFrame> {
        self.rx.recv().await
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub status: ChallengeStatus,
    pub frames_processed: usize,
}

/// Drives `challenge` until it completes or the source runs dry.
///
/// On completion exactly one message goes out through `signal`. If the source
/// ends first the challenge is abandoned and nothing is sent.
pub async fn run_challenge<S, C>(
    challenge: &mut Challenge,
    source: &mut S,
    signal: &C,
    resource: Option<String>,
) -> Result<RunReport>
where
    S: FrameSource + ?Sized,
    C: CompletionSignal + ?Sized,
{
    let mut frames_processed = 0;
    info!("Challenge {}: waiting for frames", challenge.id());

    // A challenge without stages is complete before the first frame
    if !challenge.is_complete() {
        loop {
            let Some(frame) = source.next_frame().await else {
                warn!("Challenge {}: frame source closed before completion", challenge.id());
                challenge.abandon();
                return Ok(RunReport { status: challenge.status(), frames_processed });
            };
            frames_processed += 1;
            let now = tokio::time::Instant::now().into_std();
            match challenge.process_frame(Some(&frame), now) {
                FrameOutcome::Complete => break,
                FrameOutcome::StageMatched { stage, kind } => {
                    debug!("Challenge {}: stage {} ({}) done", challenge.id(), stage, kind);
                }
                FrameOutcome::Inactive => {
                    return Ok(RunReport { status: challenge.status(), frames_processed });
                }
                _ => {}
            }
        }
    }

    let payload = CompletionPayload::completed(resource, Some(challenge.id().to_string()));
    signal.signal_complete(&payload).await?;
    info!("Challenge {}: completion signalled after {} frames", challenge.id(), frames_processed);
    Ok(RunReport { status: ChallengeStatus::Complete, frames_processed })
}
