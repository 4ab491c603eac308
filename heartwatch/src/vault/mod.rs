//! Webhook resolution.
//!
//! A target reference is either a direct webhook URL, which passes through
//! untouched, or a vault reference whose sealed webhook URL lives in a secret
//! store and is decrypted on every resolution. Nothing is cached.

mod cipher;
mod id;
mod resolver;
mod store;

pub use cipher::{VaultCipher, DEFAULT_ENCRYPTION_KEY};
pub use id::VaultId;
pub use resolver::{is_direct_webhook, Resolver};
pub use store::{MemoryStore, SecretStore, SupabaseStore, UnconfiguredStore};
