//! Session model representing one client's heartbeat lifecycle.

use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Embed;

/// Passthrough details about the client, never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tracked session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Unique session identifier chosen by the client.
    pub session_id: String,
    /// Direct webhook URL or an indirect vault reference.
    pub target_ref: String,
    /// Message to patch on disconnect.
    pub message_ref: String,
    /// Channel the message lives in (if known).
    pub channel_ref: Option<String>,
    pub metadata: SessionMetadata,
    /// The embed as last posted by the client.
    pub embed: Embed,
    /// Last heartbeat, monotonic.
    pub last_seen: Instant,
    /// When the session was registered.
    pub registered_at: DateTime<Utc>,
    /// Assigned by the store on registration.
    pub(crate) epoch: u64,
}

impl SessionRecord {
    /// Create a new session seen at `now`.
    pub fn new(
        session_id: impl Into<String>,
        target_ref: impl Into<String>,
        message_ref: impl Into<String>,
        embed: Embed,
        now: Instant,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            target_ref: target_ref.into(),
            message_ref: message_ref.into(),
            channel_ref: None,
            metadata: SessionMetadata::default(),
            embed,
            last_seen: now,
            registered_at: Utc::now(),
            epoch: 0,
        }
    }

    /// Set the channel reference.
    #[must_use]
    pub fn with_channel(mut self, channel_ref: Option<String>) -> Self {
        self.channel_ref = channel_ref;
        self
    }

    /// Wall-clock time since registration.
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.registered_at
    }

    /// Set the passthrough metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: SessionMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
