mod caption;
mod config;
mod room;
mod server;
mod signaling;

pub use caption::*;
pub use config::*;
pub use room::*;
pub use server::*;
pub use signaling::*;
