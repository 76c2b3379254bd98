use crate::transport::ChannelKind;
use huddle_core::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{channel} connection failed: {reason}")]
    Connection {
        channel: ChannelKind,
        reason: String,
    },

    /// Terminal: the channel gave up and will not reconnect on its own.
    #[error("lost connection to {channel} server after {attempts} attempts")]
    ReconnectExhausted { channel: ChannelKind, attempts: u32 },

    #[error("{0} channel is not connected")]
    NotConnected(ChannelKind),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReconnectExhausted { .. })
    }
}
