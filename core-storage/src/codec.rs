//! # Crypto Codec
//!
//! Content hashing and AES-256-GCM sealing of whole blobs.
//!
//! ## Wire format
//!
//! ```text
//! +----------------+-------------------------------+
//! | IV (16 bytes)  | AES-256-GCM ciphertext || tag  |
//! +----------------+-------------------------------+
//! ```
//!
//! Every call to [`encrypt`] draws a fresh IV, so sealing the same plaintext
//! twice under one key never yields the same ciphertext. Keys travel as the
//! URL-safe unpadded base64 of their 32 raw bytes (the JWK `k` member), which
//! never contains `#` and can therefore sit in a locator fragment.

use crate::error::{Result, StorageError};
use aes_gcm::{
    aead::{consts::U16, Aead, AeadCore, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};

/// Length of the IV prefix on every ciphertext.
pub const IV_LEN: usize = 16;

/// Length of a raw AES-256 key.
pub const KEY_LEN: usize = 32;

const TAG_LEN: usize = 16;

type BlobCipher = AesGcm<Aes256, U16>;

/// Lowercase hex SHA-256 of a plaintext blob.
///
/// This is the catalog's identity for a song: two records with the same
/// hash describe the same audio.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Validate an existing hash string.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let valid = value.len() == 64
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(StorageError::InvalidHash(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.0)
    }
}

impl FromStr for ContentHash {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Hash a plaintext blob.
pub fn hash(data: &[u8]) -> ContentHash {
    ContentHash(hex::encode(Sha256::digest(data)))
}

/// Symmetric key for one blob's lineage.
///
/// `Debug` never prints key material.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    key_bytes: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let key = BlobCipher::generate_key(&mut OsRng);
        let mut key_bytes = [0u8; KEY_LEN];
        key_bytes.copy_from_slice(&key);
        Self { key_bytes }
    }

    /// Create from raw key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key_bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            StorageError::KeyImport(format!(
                "expected {} key bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self { key_bytes })
    }

    /// Import a key from its URL-safe base64 form.
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| StorageError::KeyImport(format!("invalid key encoding: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Export the key in the form carried by encrypted locators.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.key_bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    fn cipher(&self) -> Result<BlobCipher> {
        BlobCipher::new_from_slice(&self.key_bytes)
            .map_err(|e| StorageError::KeyImport(e.to_string()))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key_bytes", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for EncryptionKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_encoded(s)
    }
}

/// Seal `plaintext` under `key` with a fresh IV.
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> Result<Bytes> {
    let cipher = key.cipher()?;
    let iv = BlobCipher::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&iv, plaintext)
        .map_err(|e| StorageError::Encrypt(e.to_string()))?;

    let mut sealed = Vec::with_capacity(IV_LEN + ciphertext.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);
    Ok(Bytes::from(sealed))
}

/// Open a blob produced by [`encrypt`].
pub fn decrypt(sealed: &[u8], key: &EncryptionKey) -> Result<Bytes> {
    if sealed.len() < IV_LEN + TAG_LEN {
        return Err(StorageError::Decrypt(format!(
            "ciphertext too short: {} bytes",
            sealed.len()
        )));
    }

    let (iv, ciphertext) = sealed.split_at(IV_LEN);
    let cipher = key.cipher()?;
    let plaintext = cipher
        .decrypt(Nonce::<U16>::from_slice(iv), ciphertext)
        .map_err(|_| StorageError::Decrypt("authentication failed".to_string()))?;

    Ok(Bytes::from(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_hash_validation() {
        assert!(ContentHash::new("a".repeat(64)).is_ok());
        assert!(ContentHash::new("A".repeat(64)).is_err());
        assert!(ContentHash::new("abc").is_err());
        assert!(ContentHash::new("g".repeat(64)).is_err());
    }

    #[test]
    fn test_key_encoding_is_url_safe_and_unpadded() {
        let key = EncryptionKey::generate();
        let encoded = key.encode();

        assert_eq!(encoded.len(), 43);
        assert!(!encoded.contains('#'));
        assert!(!encoded.contains('='));
        assert_eq!(EncryptionKey::from_encoded(&encoded).unwrap(), key);
    }

    #[test]
    fn test_key_import_rejects_malformed_input() {
        assert!(matches!(
            EncryptionKey::from_encoded("not base64!"),
            Err(StorageError::KeyImport(_))
        ));
        // Valid base64, but only 16 bytes.
        assert!(matches!(
            EncryptionKey::from_encoded("AAAAAAAAAAAAAAAAAAAAAA"),
            Err(StorageError::KeyImport(_))
        ));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = EncryptionKey::from_bytes(&[7u8; KEY_LEN]).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&key.encode()));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = EncryptionKey::generate();
        let plaintext = b"ID3 tagged audio frames";

        let sealed = encrypt(plaintext, &key).unwrap();
        assert_eq!(sealed.len(), IV_LEN + plaintext.len() + TAG_LEN);
        assert_eq!(decrypt(&sealed, &key).unwrap().as_ref(), plaintext);
    }

    #[test]
    fn test_same_plaintext_seals_differently() {
        let key = EncryptionKey::generate();
        let first = encrypt(b"same bytes", &key).unwrap();
        let second = encrypt(b"same bytes", &key).unwrap();

        assert_ne!(first, second);
        assert_eq!(decrypt(&first, &key).unwrap(), decrypt(&second, &key).unwrap());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = EncryptionKey::generate();
        let sealed = encrypt(b"", &key).unwrap();
        assert!(decrypt(&sealed, &key).unwrap().is_empty());
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let sealed = encrypt(b"secret", &EncryptionKey::generate()).unwrap();
        let result = decrypt(&sealed, &EncryptionKey::generate());
        assert!(matches!(result, Err(StorageError::Decrypt(_))));
    }

    #[test]
    fn test_decrypt_tampered_or_truncated() {
        let key = EncryptionKey::generate();
        let mut sealed = encrypt(b"secret", &key).unwrap().to_vec();

        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(decrypt(&sealed, &key), Err(StorageError::Decrypt(_))));

        assert!(matches!(
            decrypt(&sealed[..IV_LEN - 1], &key),
            Err(StorageError::Decrypt(_))
        ));
    }
}
