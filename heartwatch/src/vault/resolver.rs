//! Target reference resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{SecretStore, VaultCipher, VaultId};
use crate::error::ResolveError;

/// Path segment every platform webhook URL carries.
const WEBHOOK_PATH: &str = "/api/webhooks/";

/// Whether `reference` is already a usable webhook URL.
pub fn is_direct_webhook(reference: &str) -> bool {
    reference.contains(WEBHOOK_PATH)
}

fn is_http_url(reference: &str) -> bool {
    reference.starts_with("https://") || reference.starts_with("http://")
}

/// Turns target references into webhook URLs.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn SecretStore>,
    cipher: VaultCipher,
}

impl Resolver {
    pub fn new(store: Arc<dyn SecretStore>, cipher: VaultCipher) -> Self {
        Self { store, cipher }
    }

    /// Resolve a target reference.
    ///
    /// Order: direct webhook URL, then vault id lookup and decrypt, then any
    /// other absolute http(s) URL as-is. Every vault resolution hits the store.
    pub async fn resolve(&self, reference: &str) -> Result<String, ResolveError> {
        if is_direct_webhook(reference) {
            return Ok(reference.to_string());
        }

        let Some(vault_id) = VaultId::extract(reference) else {
            if is_http_url(reference) {
                debug!("target reference has no vault id, using it as a URL");
                return Ok(reference.to_string());
            }
            return Err(ResolveError::Unrecognized);
        };

        let sealed = self
            .store
            .fetch_sealed(&vault_id)
            .await?
            .ok_or_else(|| ResolveError::NotFound(vault_id.to_string()))?;

        self.cipher.open(&sealed).map_err(|source| {
            warn!(vault_id = %vault_id, error = %source, "failed to decrypt sealed webhook");
            ResolveError::Decrypt {
                vault_id: vault_id.to_string(),
                source,
            }
        })
    }
}
