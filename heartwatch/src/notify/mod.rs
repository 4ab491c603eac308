//! Disconnect notifications.
//!
//! The patcher rewrites a copy of the registered embed so its status field
//! reads disconnected, then pushes it through a [`NotificationTransport`].

mod embed;
mod patcher;
mod signing;
mod transport;

use async_trait::async_trait;

use crate::error::PatchError;
use crate::models::SessionRecord;

pub use embed::{mark_disconnected, DISCONNECTED_VALUE, STATUS_FIELD_NAME};
pub use patcher::Patcher;
pub use signing::{RequestSigner, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use transport::{NotificationTransport, SignedProxyTransport, WebhookTransport};

/// Something that tells the outside world a session went away.
#[async_trait]
pub trait DisconnectNotifier: Send + Sync {
    async fn notify_disconnected(&self, session: &SessionRecord) -> Result<(), PatchError>;
}
