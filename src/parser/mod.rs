//! Streaming parser for MSTest console output.

mod buffer;
mod classify;
mod events;
mod localization;
mod record;
mod session;
mod stream;

pub use buffer::*;
pub use classify::*;
pub use events::*;
pub use localization::*;
pub use record::*;
pub use session::*;
pub use stream::*;
