mod caption_registry;
mod caption_relay;
mod ws_handler;

pub use caption_registry::*;
pub use caption_relay::*;
pub use ws_handler::*;
