//! Secret store backends holding sealed webhook URLs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::VaultId;
use crate::error::SecretStoreError;

/// Point lookup of sealed webhooks by vault id.
///
/// `Ok(None)` means the id is simply not stored; errors are reserved for
/// transport and backend failures.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch_sealed(&self, id: &VaultId) -> Result<Option<String>, SecretStoreError>;
}

/// Supabase (PostgREST) backed store reading the `webhooks` table.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct WebhookRow {
    webhook_enc: String,
}

impl SupabaseStore {
    const TABLE: &'static str = "webhooks";

    pub fn new(client: Client, base_url: impl Into<String>, service_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key,
        }
    }
}

#[async_trait]
impl SecretStore for SupabaseStore {
    async fn fetch_sealed(&self, id: &VaultId) -> Result<Option<String>, SecretStoreError> {
        let url = format!(
            "{}/rest/v1/{}?select=webhook_enc&id=eq.{}",
            self.base_url,
            Self::TABLE,
            urlencoding::encode(id.as_str())
        );
        let key = self.service_key.expose_secret();

        let response = self
            .client
            .get(&url)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretStoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<WebhookRow> = response.json().await?;
        debug!(vault_id = %id, rows = rows.len(), "secret store lookup");
        Ok(rows.into_iter().next().map(|row| row.webhook_enc))
    }
}

/// Store used when no backend is configured; every lookup fails.
#[derive(Debug, Default)]
pub struct UnconfiguredStore;

#[async_trait]
impl SecretStore for UnconfiguredStore {
    async fn fetch_sealed(&self, _id: &VaultId) -> Result<Option<String>, SecretStoreError> {
        Err(SecretStoreError::NotConfigured)
    }
}

/// Fixed in-memory store. Counts lookups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sealed blob under `id`.
    #[must_use]
    pub fn with_entry(mut self, id: impl Into<String>, sealed: impl Into<String>) -> Self {
        self.entries.insert(id.into(), sealed.into());
        self
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn fetch_sealed(&self, id: &VaultId) -> Result<Option<String>, SecretStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.get(id.as_str()).cloned())
    }
}
