use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use tracing::debug;

use crate::KeyMaterial;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key material")]
    InvalidKey,

    #[error("token is not valid base64")]
    Encoding,

    #[error("token is too short")]
    Truncated,

    #[error("token failed authentication")]
    Authentication,

    #[error("sealing failed")]
    Seal,

    #[error("random number generator failure")]
    Rng,

    #[error("sealed payload is not valid utf-8")]
    Utf8,

    #[error("sealed payload is not a valid timestamp")]
    Timestamp,
}

/// AES-256-GCM sealing with a random 96-bit nonce per token.
///
/// Token layout: `base64url(nonce || ciphertext || tag)`, no padding.
pub struct TokenSealer {
    key: LessSafeKey,
    fingerprint: String,
    rng: SystemRandom,
}

impl TokenSealer {
    pub fn new(key: &KeyMaterial) -> Result<Self, CryptoError> {
        let unbound =
            UnboundKey::new(&AES_256_GCM, key.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            fingerprint: key.fingerprint(),
            rng: SystemRandom::new(),
        })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::Rng)?;

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CryptoError::Seal)?;

        let mut token = Vec::with_capacity(NONCE_LEN + in_out.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&in_out);
        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    pub fn open(&self, token: &str) -> Result<Vec<u8>, CryptoError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| CryptoError::Encoding)?;
        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CryptoError::Truncated);
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CryptoError::Truncated)?;

        let mut in_out = sealed.to_vec();
        let plaintext_len = match self.key.open_in_place(nonce, Aad::empty(), &mut in_out) {
            Ok(plaintext) => plaintext.len(),
            Err(_) => {
                debug!(key = %self.fingerprint, "token rejected");
                return Err(CryptoError::Authentication);
            }
        };
        in_out.truncate(plaintext_len);
        Ok(in_out)
    }

    pub fn seal_str(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.seal(plaintext.as_bytes())
    }

    pub fn open_str(&self, token: &str) -> Result<String, CryptoError> {
        String::from_utf8(self.open(token)?).map_err(|_| CryptoError::Utf8)
    }

    /// Seal an instant (e.g. a link expiry) as RFC 3339.
    pub fn seal_timestamp(&self, at: DateTime<Utc>) -> Result<String, CryptoError> {
        self.seal_str(&at.to_rfc3339())
    }

    pub fn open_timestamp(&self, token: &str) -> Result<DateTime<Utc>, CryptoError> {
        let raw = self.open_str(token)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|_| CryptoError::Timestamp)
    }
}

impl core::fmt::Debug for TokenSealer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSealer")
            .field("algorithm", &"AES-256-GCM")
            .field("key", &self.fingerprint)
            .finish()
    }
}
