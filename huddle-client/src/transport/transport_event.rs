use crate::error::ClientError;
use crate::transport::{ChannelKind, ChannelState};
use huddle_core::{CaptionMessage, SignalingMessage};

/// Everything the transport reports to its owner, in arrival order.
#[derive(Debug)]
pub enum ClientEvent {
    Signal(SignalingMessage),
    Caption(CaptionMessage),
    Status(ChannelKind, ChannelState),
    Error(ClientError),
}
