//! In-memory session storage.

mod sessions;

pub use sessions::SessionStore;
