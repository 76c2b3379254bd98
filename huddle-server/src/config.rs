use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid caption scope '{0}' (expected 'room' or 'relay')")]
    InvalidCaptionScope(String),

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}

/// Which caption sockets receive a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionScope {
    /// Every caption socket on the relay, whatever room path it used.
    #[default]
    Relay,
    /// Only sockets opened under the sender's room path.
    Room,
}

impl FromStr for CaptionScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" => Ok(Self::Room),
            "relay" => Ok(Self::Relay),
            other => Err(ConfigError::InvalidCaptionScope(other.to_owned())),
        }
    }
}

impl fmt::Display for CaptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => f.write_str("room"),
            Self::Relay => f.write_str("relay"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub caption_scope: CaptionScope,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_PORT,
            caption_scope: CaptionScope::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `HOST`, `PORT` and `HUDDLE_CAPTION_SCOPE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(scope) = lookup("HUDDLE_CAPTION_SCOPE") {
            config.caption_scope = scope.parse()?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
