//! # Locators
//!
//! A locator is the URL a song record stores to find its audio again:
//!
//! - `plain:<address>` - the blob at `address` is the plaintext
//! - `encrypted:<address>#<key>` - the blob is sealed; the key rides in the fragment
//! - `http://...` / `https://...` - fetched through the host's `HttpClient`
//!
//! `Display` produces the full locator, key included. Use
//! [`Locator::redacted`] for anything that ends up in a log.

use crate::codec::EncryptionKey;
use crate::error::{Result, StorageError};
use bridge_traits::object_store::ContentAddress;
use core_runtime::{config::BlobScheme, logging::redact_locator};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Parsed form of a locator URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    Plain {
        address: ContentAddress,
    },
    Encrypted {
        address: ContentAddress,
        key: EncryptionKey,
    },
    Http {
        url: String,
    },
}

impl Locator {
    /// Parse a locator URL.
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = url.split_once(':').ok_or_else(|| {
            StorageError::InvalidLocator(format!("missing scheme in '{}'", redact_locator(url)))
        })?;

        match scheme {
            "plain" => Ok(Locator::Plain {
                address: parse_address(rest)?,
            }),
            "encrypted" => {
                let (address, key) = rest.split_once('#').ok_or_else(|| {
                    StorageError::InvalidLocator("encrypted locator without a key".to_string())
                })?;
                if key.contains('#') {
                    return Err(StorageError::InvalidLocator(
                        "key fragment must not contain '#'".to_string(),
                    ));
                }
                Ok(Locator::Encrypted {
                    address: parse_address(address)?,
                    key: EncryptionKey::from_encoded(key)?,
                })
            }
            "http" | "https" => Ok(Locator::Http {
                url: url.to_string(),
            }),
            other => Err(StorageError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn plain(address: ContentAddress) -> Self {
        Locator::Plain { address }
    }

    pub fn encrypted(address: ContentAddress, key: EncryptionKey) -> Self {
        Locator::Encrypted { address, key }
    }

    /// The scheme name as it appears before the colon.
    pub fn scheme(&self) -> &str {
        match self {
            Locator::Plain { .. } => BlobScheme::Plain.as_str(),
            Locator::Encrypted { .. } => BlobScheme::Encrypted.as_str(),
            Locator::Http { url } => {
                if url.starts_with("https:") {
                    "https"
                } else {
                    "http"
                }
            }
        }
    }

    /// Object store address, for store-backed locators.
    pub fn address(&self) -> Option<&ContentAddress> {
        match self {
            Locator::Plain { address } | Locator::Encrypted { address, .. } => Some(address),
            Locator::Http { .. } => None,
        }
    }

    pub fn key(&self) -> Option<&EncryptionKey> {
        match self {
            Locator::Encrypted { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Locator::Encrypted { .. })
    }

    /// True for the schemes backed by the object store.
    pub fn is_stored(&self) -> bool {
        self.address().is_some()
    }

    /// Locator text with any key material removed.
    pub fn redacted(&self) -> String {
        redact_locator(&self.to_string())
    }
}

fn parse_address(raw: &str) -> Result<ContentAddress> {
    ContentAddress::new(raw).map_err(|e| StorageError::InvalidLocator(e.to_string()))
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Plain { address } => write!(f, "plain:{}", address),
            Locator::Encrypted { address, key } => {
                write!(f, "encrypted:{}#{}", address, key.encode())
            }
            Locator::Http { url } => f.write_str(url),
        }
    }
}

impl FromStr for Locator {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}
