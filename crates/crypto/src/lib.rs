//! `tutorhub-crypto` — sealing of short tokens and timestamps.
//!
//! Used for values handed to users and read back later (verification links,
//! encrypted expiry dates). Every seal draws a fresh random nonce, so sealing
//! the same plaintext twice never produces the same token.

pub mod key;
pub mod sealer;

pub use key::{KeyMaterial, TOKEN_KEY_ENV};
pub use sealer::{CryptoError, TokenSealer};
