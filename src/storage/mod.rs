//! Key-value persistence for the signed-in session.
//!
//! Provides the [`KeyValueStore`] trait and implementations:
//! - [`FileStore`] - JSON object on disk with 0600 permissions
//! - [`MemoryStore`] - In-memory (testing, ephemeral sessions)

mod file;
mod memory;

use async_trait::async_trait;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::Result;

/// Key holding the JSON-encoded [`crate::auth::User`]
pub const USER_KEY: &str = "auth_user";

/// Key holding the JSON-encoded [`crate::auth::TokenSet`]
pub const TOKENS_KEY: &str = "auth_tokens";

/// Key holding `"true"` while a session is stored
pub const SIGNED_IN_KEY: &str = "auth_signed_in";

/// Every key written by the auth client
pub const SESSION_KEYS: [&str; 3] = [USER_KEY, TOKENS_KEY, SIGNED_IN_KEY];

/// String key-value store backing the auth session.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Name of this storage backend.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
