// Sends the completion message to a control server over plain HTTP

use async_trait::async_trait;
use log::{debug, info};
use std::net::SocketAddr;

use crate::challenge::runtime::CompletionSignal;
use crate::error::{GateError, Result};
use crate::protocol::CompletionPayload;

#[derive(Clone, Debug)]
pub struct HttpCompletionClient {
    addr: SocketAddr,
    url: String,
    http_client: reqwest::Client,
}

impl HttpCompletionClient {
    pub fn new(addr: SocketAddr) -> Self {
        HttpCompletionClient {
            addr,
            url: format!("http://{}/complete", addr),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionSignal for HttpCompletionClient {
    async fn signal_complete(&self, payload: &CompletionPayload) -> Result<()> {
        let response = self.http_client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        debug!("POST {} -> {}", self.url, status);

        if status != reqwest::StatusCode::OK {
            let body = response.text().await?;
            return Err(GateError::SignalRejected { addr: self.addr, status: status.as_u16(), body });
        }
        info!("Completion accepted by {}", self.addr);
        Ok(())
    }
}
