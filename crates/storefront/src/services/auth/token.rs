//! Opaque bearer tokens.
//!
//! A token is 32 random bytes, base64url-encoded. Only its SHA-256 digest is
//! persisted, so a leaked `access_token` table can't be replayed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Generate a new random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(SecretString::from(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Wrap a token presented by a client.
    #[must_use]
    pub fn from_client(token: &str) -> Self {
        Self(SecretString::from(token.to_owned()))
    }

    /// The raw token, to hand to the client exactly once.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Hex SHA-256 digest used as the storage key.
    #[must_use]
    pub fn hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.expose_secret().as_bytes()))
    }
}
