//! Atomic claiming of the newest unused code.

use std::sync::Arc;

use crate::store::{CodeStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    /// The claim transaction could not complete. Fail closed: this is
    /// distinct from an empty inventory and never results in a double issue.
    #[error("inventory temporarily unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claimed value; its record is now marked used.
    Granted(String),
    /// No unused code in the inventory. A normal outcome, not an error.
    Empty,
}

/// Serves codes under the at-most-once guarantee.
///
/// Ordering is newest-unused-first: the most recently replenished code is
/// issued before older leftovers (LIFO among unused codes). This is an
/// observable policy, not an accident of the store.
pub struct ClaimCoordinator {
    store: Arc<dyn CodeStore>,
}

impl ClaimCoordinator {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    pub async fn claim(&self) -> Result<ClaimOutcome, ClaimError> {
        match self.store.claim_newest_unused().await? {
            Some(value) => {
                tracing::info!(code = %value, "claimed code");
                Ok(ClaimOutcome::Granted(value))
            }
            None => {
                tracing::info!("no unused code available");
                Ok(ClaimOutcome::Empty)
            }
        }
    }
}
