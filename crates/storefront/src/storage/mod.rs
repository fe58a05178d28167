//! Local persistent storage port.
//!
//! The storefront keeps a handful of small JSON documents between runs: the
//! cart, the session tokens, and a snapshot of the signed-in user. All of it
//! goes through [`LocalStorage`], a string key/value interface shaped like
//! browser local storage, so the cart engine and session code never touch
//! the filesystem directly.
//!
//! # Adapters
//!
//! - [`FileStorage`] - one `<key>.json` file per key, written atomically
//! - [`MemoryStorage`] - in-process map for tests

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Serialized cart lines.
    pub const CART: &str = "cart";

    /// Access token returned by login.
    pub const TOKEN: &str = "token";

    /// Refresh token returned by login.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// Snapshot of the signed-in user.
    pub const USER: &str = "user";
}

/// Errors raised by storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored value could not be decoded.
    #[error("stored value for key {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be encoded.
    #[error("failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Keys are limited to ASCII letters, digits, `_` and `-`.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The adapter refuses writes.
    #[error("storage is read-only")]
    ReadOnly,
}

/// String key/value storage.
///
/// Writes are synchronous: once `set_item` returns `Ok`, the value survives a
/// restart.
pub trait LocalStorage {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be modified.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: LocalStorage + ?Sized> LocalStorage for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

impl<S: LocalStorage + ?Sized> LocalStorage for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// JSON helpers on top of [`LocalStorage`].
pub trait LocalStorageExt: LocalStorage {
    /// Read and decode a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the stored text is not valid JSON
    /// for `T`, or any read error from the adapter.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.get_item(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                    key: key.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Encode and store a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encode`] if `value` cannot be serialized, or
    /// any write error from the adapter.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_owned(),
            source,
        })?;
        self.set_item(key, &raw)
    }
}

impl<S: LocalStorage + ?Sized> LocalStorageExt for S {}

/// Keys double as file names, so only a conservative character set is allowed.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}
