//! Timestamped HMAC signatures for the patch proxy.

use ring::hmac;
use secrecy::{ExposeSecret, SecretString};

pub const TIMESTAMP_HEADER: &str = "x-heartwatch-timestamp";
pub const SIGNATURE_HEADER: &str = "x-heartwatch-signature";

/// Signs request bodies as `hex(HMAC-SHA256(secret, timestamp || body))`.
pub struct RequestSigner {
    key: hmac::Key,
}

impl RequestSigner {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.expose_secret().as_bytes()),
        }
    }

    /// Signature over `timestamp` followed by the serialized body.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        let mut ctx = hmac::Context::with_key(&self.key);
        ctx.update(timestamp.to_string().as_bytes());
        ctx.update(body);
        hex::encode(ctx.sign().as_ref())
    }

    /// Check a signature produced by [`RequestSigner::sign`] in constant time.
    pub fn verify(&self, timestamp: i64, body: &[u8], signature: &str) -> bool {
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        let mut message = timestamp.to_string().into_bytes();
        message.extend_from_slice(body);
        hmac::verify(&self.key, &message, &tag).is_ok()
    }
}
