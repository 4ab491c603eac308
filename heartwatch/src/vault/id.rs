//! Vault id extraction.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VAULT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)wh_[0-9a-f]+").expect("vault id pattern is valid"));

/// Identifier of a sealed webhook in the secret store (`wh_<hex>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultId(String);

impl VaultId {
    /// Find the first vault id anywhere in `reference`.
    ///
    /// Matching is substring-based and case-insensitive, so both a bare id
    /// and a vault URL such as `https://vault.example/v/wh_1a2b` resolve.
    /// The matched text is kept as written.
    pub fn extract(reference: &str) -> Option<Self> {
        VAULT_ID
            .find(reference)
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
