// Request routing for the control plane

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;

use crate::challenge::sequencer::Challenge;
use crate::config::GateConfig;
use crate::error::Result;
use crate::protocol::{CompletionResponse, HealthResponse};
use crate::server::http::{Request, Response};
use crate::server::page::{render_page, PagePlan};
use crate::session::registry::SessionRegistry;

/// Plain file name with an image extension; no separators, no leading dot.
const ASSET_NAME_PATTERN: &str = r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*\.(?i:jpe?g|png|gif|webp)$";

pub struct RouteContext {
    pub config: GateConfig,
    pub registry: SessionRegistry,
    asset_name: Regex,
}

impl RouteContext {
    pub fn new(config: GateConfig, registry: SessionRegistry) -> Result<Self> {
        let asset_name = Regex::new(ASSET_NAME_PATTERN)
            .map_err(|e| crate::error::GateError::Config(format!("asset name pattern: {}", e)))?;
        Ok(RouteContext { config, registry, asset_name })
    }

    pub fn is_valid_asset_name(&self, name: &str) -> bool {
        self.asset_name.is_match(name)
    }
}

pub fn mime_for(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Dispatches one request. Never fails: handler errors become 500s.
pub async fn handle(ctx: &RouteContext, req: &Request) -> Response {
    debug!("{} {}", req.method, req.target);
    let result = match (req.method.as_str(), req.path()) {
        ("OPTIONS", _) => Ok(Response::empty(200)),
        ("GET", "/") | ("GET", "/index.html") => challenge_page(ctx, req),
        ("GET", "/health") => Response::json(200, &HealthResponse::ok()),
        ("GET", path) if path.starts_with("/assets/") => serve_asset(ctx, &path["/assets/".len()..]).await,
        ("POST", "/complete") => complete(ctx, &req.body),
        (method, path) => Response::json(404, &CompletionResponse::failed(format!("No route for {} {}", method, path))),
    };

    result.unwrap_or_else(|e| {
        warn!("Handler for {} {} failed: {}", req.method, req.target, e);
        Response::empty(500)
    })
}

fn challenge_page(ctx: &RouteContext, req: &Request) -> Result<Response> {
    let session = match req.query_param("resource") {
        Some(resource) => ctx.registry.get(&resource),
        None => ctx.registry.latest(),
    };
    let resource = req
        .query_param("resource")
        .or_else(|| session.as_ref().map(|s| s.resource_id.clone()));

    let mut rng = SmallRng::from_entropy();
    let challenge = Challenge::random(&ctx.config, &mut rng);
    let plan = PagePlan {
        challenge_id: challenge.id().to_string(),
        resource,
        display_name: session.map(|s| s.display_name),
        confidence_threshold: ctx.config.confidence_threshold,
        transition_cooldown_ms: ctx.config.transition_cooldown.as_millis() as u64,
        stages: challenge.plan(),
    };
    Ok(Response::html(render_page(&plan)?))
}

async fn serve_asset(ctx: &RouteContext, name: &str) -> Result<Response> {
    let mime = match mime_for(name) {
        Some(mime) if ctx.is_valid_asset_name(name) => mime,
        _ => {
            warn!("Rejected asset name {:?}", name);
            return Response::json(404, &CompletionResponse::failed("Asset not found"));
        }
    };

    for dir in &ctx.config.asset_dirs {
        let candidate: PathBuf = dir.join(name);
        match tokio::fs::read(&candidate).await {
            Ok(bytes) => {
                debug!("Serving asset {} from {}", name, candidate.display());
                return Ok(Response::bytes(mime, bytes));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!("Could not read {}: {}", candidate.display(), e);
                continue;
            }
        }
    }

    Response::json(404, &CompletionResponse::failed("Asset not found"))
}

// Any well-formed JSON is accepted. A missing or non-bool `completed` counts
// as a completion; an explicit `false` leaves the session waiting.
fn complete(ctx: &RouteContext, body: &[u8]) -> Result<Response> {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Rejected completion payload: {}", e);
            return Response::json(400, &CompletionResponse::failed(format!("Invalid JSON: {}", e)));
        }
    };

    let resource = payload.get("resource").and_then(Value::as_str);
    if payload.get("completed").and_then(Value::as_bool) == Some(false) {
        info!("Completion message for {:?} reported an unfinished challenge", resource);
        return Response::json(200, &CompletionResponse::ok("Challenge not completed; session still active"));
    }

    let resolved = match resource {
        Some(id) => ctx.registry.resolve(id, true).then(|| id.to_string()),
        None => ctx.registry.resolve_latest(true).map(|info| info.resource_id),
    };

    let message = match resolved {
        Some(id) => {
            info!("Completion received for '{}'", id);
            format!("Session for '{}' resolved", id)
        }
        None => {
            info!("Completion received with no active session");
            "No active session".to_string()
        }
    };
    Response::json(200, &CompletionResponse::ok(message))
}
