use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use huddle::client::negotiation::{NegotiationObserver, RemoteStream, WebRtcSessionFactory};
use huddle::client::transport::{ChannelKind, ChannelState};
use huddle::client::{Call, CallObserver, ClientConfig, ClientError, DEFAULT_BACKEND_URL};
use huddle::model::CaptionMessage;
use huddle::server::{CaptionScope, ServerConfig, serve};
use huddle::{PeerId, RoomId};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Video call signaling relay and client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling and caption relay.
    Serve {
        /// Overrides HOST.
        #[arg(long)]
        host: Option<String>,

        /// Overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,

        /// `relay` (default) or `room`; overrides HUDDLE_CAPTION_SCOPE.
        #[arg(long)]
        caption_scope: Option<CaptionScope>,
    },

    /// Join a room as a receive-only participant and log what happens.
    Join {
        /// Room to join.
        room: String,

        #[arg(long, env = "HUDDLE_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
        url: String,

        /// Skip the public STUN servers.
        #[arg(long)]
        no_stun: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Commands::Serve {
            host,
            port,
            caption_scope,
        } => {
            let mut config = ServerConfig::from_env().context("Invalid relay environment")?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(scope) = caption_scope {
                config.caption_scope = scope;
            }

            println!("{}", "Starting huddle relay...".green().bold());
            println!("   Address:       {}", config.bind_addr().cyan());
            println!("   Caption scope: {}", config.caption_scope.to_string().cyan());

            serve(config, shutdown_signal()).await?;
        }

        Commands::Join { room, url, no_stun } => {
            let mut config = ClientConfig::with_backend(url);
            if no_stun {
                config.ice_servers.clear();
            }

            println!("{}", format!("Joining room '{}'...", room).green().bold());
            println!("   Relay: {}", config.backend_url.cyan());

            let factory = Arc::new(WebRtcSessionFactory::new(config.ice_servers.clone()));
            let call = Call::start(config, RoomId::from(room), factory, Arc::new(LogObserver))
                .await
                .context("Failed to start call")?;

            shutdown_signal().await;
            call.leave().await;
            println!("{}", "Left the room.".green().bold());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    info!("Shutting down");
}

struct LogObserver;

#[async_trait]
impl NegotiationObserver for LogObserver {
    async fn on_peer_joined(&self, peer_id: &PeerId) {
        info!(">>> Peer joined: {}", peer_id);
    }

    async fn on_remote_stream(&self, peer_id: &PeerId, stream: RemoteStream) {
        info!("Remote {:?} track {} from {}", stream.kind, stream.track_id, peer_id);
    }

    async fn on_peer_connected(&self, peer_id: &PeerId) {
        info!("Media connected with {}", peer_id);
    }

    async fn on_peer_removed(&self, peer_id: &PeerId) {
        info!("<<< Peer left: {}", peer_id);
    }
}

#[async_trait]
impl CallObserver for LogObserver {
    async fn on_status(&self, channel: ChannelKind, state: ChannelState) {
        info!("{} channel is {:?}", channel, state);
    }

    async fn on_error(&self, error: &ClientError) {
        if error.is_terminal() {
            eprintln!("{}", format!("{}. Restart to try again.", error).red().bold());
        } else {
            warn!("{}", error);
        }
    }

    async fn on_caption(&self, caption: &CaptionMessage) {
        match &caption.translation {
            Some(translation) => println!(
                "{} {} ({})",
                format!("[{}]", caption.speaker).yellow(),
                caption.text,
                translation.dimmed()
            ),
            None => println!("{} {}", format!("[{}]", caption.speaker).yellow(), caption.text),
        }
    }
}
