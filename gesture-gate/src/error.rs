// Error taxonomy shared by the host-side components (registry, server, client)

use std::net::SocketAddr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GateError>;

#[derive(Debug, Error)]
pub enum GateError {
    /// The control server could not claim its listening address.
    /// Fatal to starting a challenge; the caller decides whether to retry.
    #[error("failed to bind control server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    // Completion message reached the server but was not accepted
    #[error("completion rejected by {addr} with status {status}: {body}")]
    SignalRejected {
        addr: SocketAddr,
        status: u16,
        body: String,
    },
}
