use crate::caption::{CaptionRegistry, caption_ws_handler};
use crate::config::{CaptionScope, ServerConfig};
use crate::room::RoomRegistry;
use crate::signaling::signaling_ws_handler;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use huddle_core::utils::{CAPTIONS_PATH_PREFIX, SIGNALING_PATH};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state handed to every connection handler.
#[derive(Clone)]
pub struct RelayState {
    pub rooms: Arc<RoomRegistry>,
    pub captions: Arc<CaptionRegistry>,
}

impl RelayState {
    pub fn new(caption_scope: CaptionScope) -> Self {
        Self {
            rooms: Arc::new(RoomRegistry::new()),
            captions: Arc::new(CaptionRegistry::new(caption_scope)),
        }
    }
}

async fn health() -> &'static str {
    "huddle signaling relay\n"
}

pub fn router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route(SIGNALING_PATH, get(signaling_ws_handler))
        .route(
            &format!("{}{{room_id}}", CAPTIONS_PATH_PREFIX),
            get(caption_ws_handler),
        )
        .layer(cors)
        .with_state(state)
}

/// Bind according to `config` and serve until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;

    serve_on(listener, RelayState::new(config.caption_scope), shutdown).await
}

pub async fn serve_on<F>(listener: TcpListener, state: RelayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Signaling relay listening on http://{}", addr);
    info!("  ws://{}{}", addr, SIGNALING_PATH);
    info!("  ws://{}{}:roomId", addr, CAPTIONS_PATH_PREFIX);
    info!("Caption scope: {}", state.captions.scope());

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Relay server failed")?;

    info!("Relay server stopped");
    Ok(())
}
