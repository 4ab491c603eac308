//! Resolve, rewrite, deliver.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::{mark_disconnected, DisconnectNotifier, NotificationTransport};
use crate::error::PatchError;
use crate::models::{Embed, SessionRecord};
use crate::vault::Resolver;

/// Rewrites a posted message to show the session as disconnected.
#[derive(Clone)]
pub struct Patcher {
    resolver: Resolver,
    transport: Arc<dyn NotificationTransport>,
}

impl Patcher {
    pub fn new(resolver: Resolver, transport: Arc<dyn NotificationTransport>) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    /// Mark the message `message_ref` behind `target_ref` as disconnected.
    ///
    /// Resolution failures abort before any network call to the platform.
    /// There is no retry.
    pub async fn patch(
        &self,
        target_ref: &str,
        message_ref: &str,
        embed: &Embed,
    ) -> Result<(), PatchError> {
        let webhook_url = self.resolver.resolve(target_ref).await?;

        let patched = mark_disconnected(embed);
        let payload = json!({ "embeds": [serde_json::to_value(&patched)?] });

        debug!(message_ref, fields = patched.fields.len(), "sending disconnect patch");
        self.transport
            .update_message(&webhook_url, message_ref, &payload)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DisconnectNotifier for Patcher {
    async fn notify_disconnected(&self, session: &SessionRecord) -> Result<(), PatchError> {
        self.patch(&session.target_ref, &session.message_ref, &session.embed)
            .await?;
        info!(session_id = %session.session_id, "marked session disconnected");
        Ok(())
    }
}
