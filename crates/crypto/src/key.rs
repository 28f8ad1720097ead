use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// Environment variable carrying the base64-encoded token key.
pub const TOKEN_KEY_ENV: &str = "TUTORHUB_TOKEN_KEY";

/// Opaque symmetric key material (32 bytes, AES-256).
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial([u8; 32]);

impl KeyMaterial {
    /// Generate random key material.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|_| CryptoError::InvalidKey)?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self(bytes))
    }

    /// Read the key from [`TOKEN_KEY_ENV`].
    pub fn from_env() -> anyhow::Result<Self> {
        let encoded = std::env::var(TOKEN_KEY_ENV).context(TOKEN_KEY_ENV)?;
        let key = Self::from_base64(&encoded).context(TOKEN_KEY_ENV)?;
        Ok(key)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// SHA-256 fingerprint of the key for audit/logging.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hex::encode(hasher.finalize())
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl core::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("KeyMaterial").field(&self.fingerprint()).finish()
    }
}
