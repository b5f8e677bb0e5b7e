use thiserror::Error;

use super::cookie::Cookie;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },
    #[error("Storage backend unavailable")]
    Unavailable,
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Raw cookie jar of the host page.
///
/// `get` returns the decoded value of the named cookie; `set` receives a
/// fully attributed cookie (an already-past `expires` means delete).
pub trait CookieStore: Send + Sync {
    /// Whether the host has cookies enabled.
    fn enabled(&self) -> bool {
        true
    }
    fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, cookie: &Cookie) -> Result<(), StorageError>;
}

/// Structured key/value store of the host page (local storage).
pub trait LocalStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
