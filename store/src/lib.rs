//! Narrow key-value persistence.
//!
//! The verification flow keeps very little client-side state — essentially
//! the cached device fingerprint — so the interface is deliberately small:
//! string keys, string values, no transactions. Backends implement
//! [`KvStore`]; everything else depends only on the trait.

pub mod error;
pub mod file;
pub mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// A tiny persistent string-to-string map.
pub trait KvStore: Send + Sync {
    /// Look up a value. `Ok(None)` means the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
