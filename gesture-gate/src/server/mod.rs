// Challenge control server: serves the challenge page and reference images and
// turns the completion message into a session resolution.

pub mod http;
pub mod page;
pub mod routes;
pub mod client;

use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::protocol::CompletionResponse;
use crate::session::registry::SessionRegistry;
use self::http::{read_request, write_response, RequestError, Response};
use self::routes::RouteContext;

pub use client::HttpCompletionClient;

pub struct ControlServer {
    listener: TcpListener,
    ctx: Arc<RouteContext>,
}

impl ControlServer {
    /// Validates `config` and claims `config.listen_addr`. Failure is
    /// returned, never retried.
    pub async fn bind(config: GateConfig, registry: SessionRegistry) -> Result<Self> {
        config.validate()?;
        let addr = config.listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| GateError::Bind { addr: addr.clone(), source })?;
        let ctx = Arc::new(RouteContext::new(config, registry)?);
        info!("Control server listening on {}", listener.local_addr()?);
        Ok(ControlServer { listener, ctx })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped. Each connection gets its
    /// own task, so a client that never finishes its request only ties up
    /// itself until `header_read_timeout`.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Accept failed: {}", e);
                    continue;
                }
            };
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(&ctx, stream).await {
                    warn!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }

    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr()?;
        let task = tokio::spawn(self.serve());
        Ok(ServerHandle { addr, task })
    }
}

async fn handle_connection(ctx: &RouteContext, mut stream: TcpStream) -> Result<()> {
    let config = &ctx.config;
    let response = match read_request(&mut stream, config.max_request_bytes, config.header_read_timeout).await {
        Ok(request) => routes::handle(ctx, &request).await,
        Err(RequestError::Closed) => return Ok(()),
        Err(e) => match e.status() {
            Some(status) => {
                warn!("Bad request: {}", e);
                Response::json(status, &CompletionResponse::failed(e.to_string()))?
            }
            None => return Err(e.into()),
        },
    };
    write_response(&mut stream, &response).await?;
    Ok(())
}

/// Running server task.
pub struct ServerHandle {
    pub addr: SocketAddr,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub async fn shutdown(self) {
        self.task.abort();
        // Cancelled is the expected outcome here
        let _ = self.task.await;
        info!("Control server on {} stopped", self.addr);
    }
}
