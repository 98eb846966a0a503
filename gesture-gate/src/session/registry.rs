// gesture-gate/src/session/registry.rs
//
// Sessions keyed by resource id. Every session is resolved at most once; the
// completion sink and error callback always run after the lock is released.

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::GateConfig;
use crate::session::types::{
    CompletionSink, ErrorCallback, ResolveReason, SessionEntry, SessionInfo, SessionOutcome,
    SessionStatus,
};

const MIN_EXPIRY_SWEEP: Duration = Duration::from_millis(100);

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<String, SessionEntry>,
    open_order: Vec<String>, // Oldest first
}

impl RegistryState {
    fn take(&mut self, resource_id: &str) -> Option<SessionEntry> {
        let entry = self.sessions.remove(resource_id)?;
        self.open_order.retain(|id| id != resource_id);
        Some(entry)
    }
}

/// Shared handle to the open sessions. Cloning shares the same registry.
#[derive(Clone)]
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
    expiry: Option<Duration>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        SessionRegistry::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::with_expiry(None)
    }

    pub fn with_expiry(expiry: Option<Duration>) -> Self {
        SessionRegistry {
            state: Arc::new(Mutex::new(RegistryState::default())),
            expiry,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        SessionRegistry::with_expiry(config.session_expiry)
    }

    pub fn expiry(&self) -> Option<Duration> {
        self.expiry
    }

    // A panicking callback never runs under the lock, so the state is still consistent
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a session for `resource_id`, replacing any session already open for it.
    pub fn open<C, E>(
        &self,
        resource_id: impl Into<String>,
        display_name: impl Into<String>,
        on_complete: C,
        on_error: E,
    ) -> SessionInfo
    where
        C: FnOnce(bool) + Send + 'static,
        E: Fn(String) + Send + Sync + 'static,
    {
        let on_error: ErrorCallback = Arc::new(on_error);
        self.insert(
            resource_id.into(),
            display_name.into(),
            CompletionSink::Callback(Box::new(on_complete)),
            Some(on_error),
        )
    }

    /// Opens a session whose outcome arrives on the returned receiver.
    pub fn open_awaitable(
        &self,
        resource_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> oneshot::Receiver<SessionOutcome> {
        let (tx, rx) = oneshot::channel();
        self.insert(resource_id.into(), display_name.into(), CompletionSink::Channel(tx), None);
        rx
    }

    fn insert(
        &self,
        resource_id: String,
        display_name: String,
        sink: CompletionSink,
        on_error: Option<ErrorCallback>,
    ) -> SessionInfo {
        let info = SessionInfo {
            resource_id: resource_id.clone(),
            display_name,
            opened_at: Utc::now(),
            status: SessionStatus::Active,
        };
        let entry = SessionEntry {
            info: info.clone(),
            opened_instant: Instant::now(),
            sink,
            on_error,
        };

        let superseded = {
            let mut state = self.lock();
            let previous = state.take(&resource_id);
            state.sessions.insert(resource_id.clone(), entry);
            state.open_order.push(resource_id.clone());
            previous
        };

        if let Some(previous) = superseded {
            warn!(
                "Session for '{}' opened at {} superseded; its callbacks are dropped",
                resource_id, previous.info.opened_at
            );
        }
        info!("Session opened for '{}' ({})", info.resource_id, info.display_name);
        info
    }

    /// Resolves the session for `resource_id`. Returns `false` if there was none.
    pub fn resolve(&self, resource_id: &str, success: bool) -> bool {
        self.finish(resource_id, SessionOutcome { success, reason: ResolveReason::Completion })
            .is_some()
    }

    /// Resolves the most recently opened active session, if any.
    pub fn resolve_latest(&self, success: bool) -> Option<SessionInfo> {
        let outcome = SessionOutcome { success, reason: ResolveReason::Completion };
        let entry = {
            let mut state = self.lock();
            let latest = state.open_order.last().cloned()?;
            state.take(&latest)?
        };
        Some(Self::deliver(entry, outcome))
    }

    /// Resolves the session with `false`.
    pub fn cancel(&self, resource_id: &str) -> bool {
        self.finish(resource_id, SessionOutcome { success: false, reason: ResolveReason::Cancelled })
            .is_some()
    }

    fn finish(&self, resource_id: &str, outcome: SessionOutcome) -> Option<SessionInfo> {
        let entry = self.lock().take(resource_id);
        match entry {
            Some(entry) => Some(Self::deliver(entry, outcome)),
            None => {
                debug!("No active session for '{}'; {:?} ignored", resource_id, outcome);
                None
            }
        }
    }

    fn deliver(entry: SessionEntry, outcome: SessionOutcome) -> SessionInfo {
        let SessionEntry { mut info, sink, .. } = entry;
        info!(
            "Session for '{}' resolved: success={} ({:?})",
            info.resource_id, outcome.success, outcome.reason
        );
        sink.deliver(outcome);
        info.status = SessionStatus::Resolved;
        info
    }

    /// Reports an error to the session's caller. The session stays active.
    pub fn fail(&self, resource_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        let on_error = {
            let state = self.lock();
            match state.sessions.get(resource_id) {
                Some(entry) => entry.on_error.clone(),
                None => return false,
            }
        };
        warn!("Session for '{}' failed: {}", resource_id, message);
        if let Some(on_error) = on_error {
            on_error(message);
        }
        true
    }

    pub fn is_active(&self, resource_id: &str) -> bool {
        self.lock().sessions.contains_key(resource_id)
    }

    pub fn active_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn get(&self, resource_id: &str) -> Option<SessionInfo> {
        self.lock().sessions.get(resource_id).map(|entry| entry.info.clone())
    }

    /// Most recently opened active session.
    pub fn latest(&self) -> Option<SessionInfo> {
        let state = self.lock();
        let id = state.open_order.last()?;
        state.sessions.get(id).map(|entry| entry.info.clone())
    }

    /// Fails and resolves (with `false`) every session open for at least the
    /// configured expiry. Does nothing when expiry is off.
    pub fn expire_stale(&self, now: Instant) -> Vec<String> {
        let Some(expiry) = self.expiry else {
            return Vec::new();
        };

        let stale: Vec<SessionEntry> = {
            let mut state = self.lock();
            let ids: Vec<String> = state
                .open_order
                .iter()
                .filter(|id| {
                    state
                        .sessions
                        .get(*id)
                        .map_or(false, |entry| now.saturating_duration_since(entry.opened_instant) >= expiry)
                })
                .cloned()
                .collect();
            ids.iter().filter_map(|id| state.take(id)).collect()
        };

        let outcome = SessionOutcome { success: false, reason: ResolveReason::Expired };
        stale
            .into_iter()
            .map(|entry| {
                let message = format!("session expired after {:?}", expiry);
                if let Some(on_error) = entry.on_error.clone() {
                    on_error(message);
                } else {
                    warn!("Session for '{}': {}", entry.info.resource_id, message);
                }
                Self::deliver(entry, outcome).resource_id
            })
            .collect()
    }

    /// Sweeps expired sessions in the background. `None` when expiry is off.
    pub fn spawn_expiry_task(&self) -> Option<JoinHandle<()>> {
        let expiry = self.expiry?;
        let period = (expiry / 4).max(MIN_EXPIRY_SWEEP);
        let registry = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let expired = registry.expire_stale(Instant::now());
                if !expired.is_empty() {
                    info!("Expired sessions: {:?}", expired);
                }
            }
        }))
    }
}
