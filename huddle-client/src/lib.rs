mod call;
mod caption_buffer;
mod config;
mod error;
pub mod negotiation;
pub mod transport;

pub use call::*;
pub use caption_buffer::*;
pub use config::*;
pub use error::*;
