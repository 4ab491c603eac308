//! AES-256-GCM sealing of webhook URLs.
//!
//! Stored layout, base64 encoded: `nonce(12) || tag(16) || ciphertext`.
//! The key is the SHA-256 digest of the configured secret.

use std::fmt;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::DecryptError;

/// Secret used when none is configured. Deployments must override it.
pub const DEFAULT_ENCRYPTION_KEY: &str = "CHANGE_THIS_TO_A_LONG_SECRET";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// Seals and opens webhook URLs.
#[derive(Clone)]
pub struct VaultCipher {
    key: [u8; 32],
}

impl VaultCipher {
    /// Derive the key from a configured secret.
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt `plaintext` into the stored blob format.
    pub fn seal(&self, plaintext: &str) -> Result<String, aes_gcm::Error> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = GenericArray::from_slice(&nonce_bytes);

        // aes-gcm appends the tag; the stored layout puts it up front.
        let sealed = cipher.encrypt(nonce, plaintext.as_bytes())?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(tag);
        blob.extend_from_slice(ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(blob))
    }

    /// Decrypt a stored blob.
    pub fn open(&self, encoded: &str) -> Result<String, DecryptError> {
        let blob = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| DecryptError::Encoding)?;
        if blob.len() < HEADER_LEN {
            return Err(DecryptError::TooShort(blob.len()));
        }

        let (nonce, rest) = blob.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(GenericArray::from_slice(nonce), sealed.as_slice())
            .map_err(|_| DecryptError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| DecryptError::Utf8)
    }
}

impl fmt::Debug for VaultCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultCipher").field("key", &"[REDACTED]").finish()
    }
}
