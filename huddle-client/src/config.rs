use crate::transport::ReconnectPolicy;
use huddle_core::IceServerConfig;
use huddle_core::utils::DEFAULT_STUN_ADDRS;

pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:8000";
pub const DEFAULT_CAPTION_HISTORY: usize = 100;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base address, `ws://` or `wss://`, without a path.
    pub backend_url: String,
    pub reconnect: ReconnectPolicy,
    pub ice_servers: Vec<IceServerConfig>,
    /// How many captions the call keeps around.
    pub caption_history: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            reconnect: ReconnectPolicy::default(),
            ice_servers: DEFAULT_STUN_ADDRS
                .iter()
                .map(|addr| IceServerConfig::stun(*addr))
                .collect(),
            caption_history: DEFAULT_CAPTION_HISTORY,
        }
    }
}

impl ClientConfig {
    pub fn with_backend(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Self::default()
        }
    }
}
