//! Delivery of the patched message to the chat platform.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::signing::{RequestSigner, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::TransportError;

const USER_AGENT: &str = concat!("heartwatch/", env!("CARGO_PKG_VERSION"));

/// Updates an existing message addressed by webhook URL and message id.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn update_message(
        &self,
        webhook_url: &str,
        message_ref: &str,
        payload: &Value,
    ) -> Result<(), TransportError>;
}

/// Non-2xx responses become [`TransportError::Status`] with the body kept.
async fn check_status(response: Response) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

/// PATCHes the message directly on the webhook.
#[derive(Clone)]
pub struct WebhookTransport {
    client: Client,
}

impl WebhookTransport {
    /// `client` should carry a request timeout.
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    fn message_url(webhook_url: &str, message_ref: &str) -> String {
        format!(
            "{}/messages/{}",
            webhook_url.trim_end_matches('/'),
            urlencoding::encode(message_ref)
        )
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn update_message(
        &self,
        webhook_url: &str,
        message_ref: &str,
        payload: &Value,
    ) -> Result<(), TransportError> {
        let url = Self::message_url(webhook_url, message_ref);
        let response = self
            .client
            .patch(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .json(payload)
            .send()
            .await?;
        check_status(response).await
    }
}

/// Body forwarded to the patch proxy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    webhook_url: &'a str,
    message_id: &'a str,
    payload: &'a Value,
}

/// Hands the update to a trusted proxy, authenticated with a timestamped
/// HMAC over the serialized body.
pub struct SignedProxyTransport {
    client: Client,
    proxy_url: String,
    signer: RequestSigner,
}

impl SignedProxyTransport {
    pub fn new(client: Client, proxy_url: impl Into<String>, signer: RequestSigner) -> Self {
        Self {
            client,
            proxy_url: proxy_url.into(),
            signer,
        }
    }
}

#[async_trait]
impl NotificationTransport for SignedProxyTransport {
    async fn update_message(
        &self,
        webhook_url: &str,
        message_ref: &str,
        payload: &Value,
    ) -> Result<(), TransportError> {
        let body = serde_json::to_vec(&ProxyRequest {
            webhook_url,
            message_id: message_ref,
            payload,
        })
        .map_err(|e| TransportError::Request(e.to_string()))?;

        let timestamp = Utc::now().timestamp();
        let signature = self.signer.sign(timestamp, &body);
        debug!(proxy = %self.proxy_url, timestamp, "forwarding patch through proxy");

        let response = self
            .client
            .post(&self.proxy_url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::CONTENT_TYPE, "application/json")
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await?;
        check_status(response).await
    }
}
