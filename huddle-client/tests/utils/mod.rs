pub mod mock_session;

pub use event_helpers::*;
pub use mock_observer::*;
pub use mock_session::*;
pub use mock_signaling::*;
pub use relay_harness::*;
