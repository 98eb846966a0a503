// Session module entry point

pub mod types;
pub mod registry;

// Re-export key types
pub use types::{ResolveReason, SessionInfo, SessionOutcome, SessionStatus};
pub use registry::SessionRegistry;
