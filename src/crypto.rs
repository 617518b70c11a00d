//! Token encryption module using AES-256-GCM
//!
//! OAuth access and refresh tokens are stored as ciphertext only. The
//! encoded form is a delimited hex triple `nonce:tag:ciphertext` with a
//! fresh random 96-bit nonce per call and a 128-bit authentication tag.
//! Plaintext tokens exist in memory only for the duration of a publish or
//! refresh call.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SEGMENT_SEPARATOR: char = ':';

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
}

/// Secure wrapper for the encryption key with zeroization on drop
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
struct ZeroizingKey(Vec<u8>);

/// Symmetric cipher for token-at-rest encryption.
///
/// Construction fails loudly when the configured key is missing or
/// malformed; there is no plaintext fallback path.
#[derive(Debug, Clone)]
pub struct TokenCipher {
    key: ZeroizingKey,
}

impl TokenCipher {
    /// Create a cipher from a 32-byte key.
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            key: ZeroizingKey(bytes),
        })
    }

    /// Create a cipher from the hex-encoded key carried in configuration.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("key is not valid hex: {}", e)))?;
        Self::new(bytes)
    }

    /// Encrypt a plaintext token into the `nonce:tag:ciphertext` hex triple.
    ///
    /// A fresh random nonce is drawn per call, so encrypting the same
    /// plaintext twice yields different ciphertext strings.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher_key = Key::<Aes256Gcm>::from_slice(&self.key.0);
        let cipher = Aes256Gcm::new(cipher_key);

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // aes-gcm appends the tag to the ciphertext; split it back out for
        // the delimited encoding.
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        debug_assert!(sealed.len() >= TAG_LEN);
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}{sep}{}{sep}{}",
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(ciphertext),
            sep = SEGMENT_SEPARATOR,
        ))
    }

    /// Decrypt an encoded token, verifying the authentication tag.
    ///
    /// Tampered or malformed input (fewer than three delimited segments,
    /// non-hex bytes, wrong tag) is an error; this never returns a partial
    /// or garbage plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let mut parts = encoded.split(SEGMENT_SEPARATOR);
        let (Some(nonce_hex), Some(tag_hex), Some(ct_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::InvalidFormat);
        };

        let nonce_bytes = hex::decode(nonce_hex).map_err(|_| CryptoError::InvalidFormat)?;
        let tag = hex::decode(tag_hex).map_err(|_| CryptoError::InvalidFormat)?;
        let ciphertext = hex::decode(ct_hex).map_err(|_| CryptoError::InvalidFormat)?;

        if nonce_bytes.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(CryptoError::InvalidFormat);
        }

        let cipher_key = Key::<Aes256Gcm>::from_slice(&self.key.0);
        let cipher = Aes256Gcm::new(cipher_key);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // Reassemble ciphertext || tag for the AEAD open call.
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(&ciphertext);
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(nonce, sealed.as_ref())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid UTF-8: {}", e)))
    }
}
