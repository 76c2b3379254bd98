use crate::model::SignalKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} message without peerId")]
    MissingPeer(SignalKind),

    #[error("{0} message without data")]
    MissingPayload(SignalKind),

    #[error("{kind} message with invalid data: {source}")]
    InvalidPayload {
        kind: SignalKind,
        #[source]
        source: serde_json::Error,
    },
}
