//! Data models for heartbeat sessions.

mod embed;
mod session;

pub use embed::{Embed, EmbedField};
pub use session::{SessionMetadata, SessionRecord};
