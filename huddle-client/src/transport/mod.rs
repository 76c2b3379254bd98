mod channel;
mod reconnect;
mod signaling_sender;
mod transport_client;
mod transport_event;

pub use channel::{ChannelKind, ChannelState};
pub use reconnect::*;
pub use signaling_sender::*;
pub use transport_client::*;
pub use transport_event::*;
