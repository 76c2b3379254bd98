mod coordinator;
mod negotiation_error;
mod observer;
mod peer_record;
mod session;
mod signaling_output;
mod state;
mod webrtc_session;

pub use coordinator::*;
pub use negotiation_error::*;
pub use observer::*;
pub use session::*;
pub use signaling_output::*;
pub use state::*;
pub use webrtc_session::*;
