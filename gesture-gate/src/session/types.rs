// Session types: one waiting caller per locked resource

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveReason {
    Completion, // Control plane reported the challenge result
    Cancelled,
    Expired,
}

/// Final word on a session, delivered exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub success: bool,
    pub reason: ResolveReason,
}

pub type CompletionCallback = Box<dyn FnOnce(bool) + Send + 'static>;
pub type ErrorCallback = Arc<dyn Fn(String) + Send + Sync + 'static>;

/// Where the single outcome of a session goes.
pub enum CompletionSink {
    Callback(CompletionCallback),
    Channel(oneshot::Sender<SessionOutcome>),
}

impl CompletionSink {
    pub(crate) fn deliver(self, outcome: SessionOutcome) {
        match self {
            CompletionSink::Callback(callback) => callback(outcome.success),
            CompletionSink::Channel(tx) => {
                // Receiver gone means nobody is waiting any more
                let _ = tx.send(outcome);
            }
        }
    }
}

impl fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionSink::Callback(_) => f.write_str("CompletionSink::Callback"),
            CompletionSink::Channel(_) => f.write_str("CompletionSink::Channel"),
        }
    }
}

/// Public view of a registered session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionInfo {
    pub resource_id: String,
    pub display_name: String,
    pub opened_at: DateTime<Utc>,
    pub status: SessionStatus,
}

pub(crate) struct SessionEntry {
    pub info: SessionInfo,
    pub opened_instant: Instant, // Monotonic, for expiry
    pub sink: CompletionSink,
    pub on_error: Option<ErrorCallback>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn callback_sink_receives_success_flag() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let sink = CompletionSink::Callback(Box::new(move |ok| {
            *seen_clone.lock().unwrap() = Some(ok);
        }));
        sink.deliver(SessionOutcome { success: false, reason: ResolveReason::Cancelled });
        assert_eq!(*seen.lock().unwrap(), Some(false));
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        CompletionSink::Channel(tx).deliver(SessionOutcome { success: true, reason: ResolveReason::Completion });
    }
}
