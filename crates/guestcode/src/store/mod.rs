//! The transactional contract the inventory requires from its storage engine.

mod memory;

pub use memory::MemoryCodeStore;

use async_trait::async_trait;

use crate::code::CodeRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or the transaction could not commit.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A concurrent transaction won the conflict; the caller's claim did not
    /// commit and no mutation is visible.
    #[error("transaction conflict")]
    Conflict,
}

/// A transactional, single-scope record store holding the code inventory.
///
/// All records live in one inventory scope. Implementations must provide
/// serializable isolation for `claim_newest_unused`: two concurrent claims of
/// the same record must resolve with one committing and the other observing
/// `Ok(None)` or `Err(StoreError::Conflict)`, never both returning the same
/// value. Partial mutations must never be visible.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Atomically take the newest unused record: inside a single transaction,
    /// select the unused record with the greatest `created`, re-check its
    /// `used` flag, mark it used, and return its value.
    ///
    /// `Ok(None)` means the inventory holds no claimable record.
    async fn claim_newest_unused(&self) -> Result<Option<String>, StoreError>;

    /// The most-recently-created record, used or not.
    async fn newest(&self) -> Result<Option<CodeRecord>, StoreError>;

    /// Whether any record, used or unused, holds this value.
    async fn contains(&self, value: &str) -> Result<bool, StoreError>;

    /// Append a new record to the inventory scope.
    async fn insert(&self, record: CodeRecord) -> Result<(), StoreError>;
}
