//! Data models: transcript entries, reply deltas, and wire formats.

mod delta;
mod message;
mod request;
mod response;

pub use delta::*;
pub use message::*;
pub use request::*;
pub use response::*;
