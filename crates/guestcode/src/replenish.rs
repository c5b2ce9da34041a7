//! Periodic inventory health check.

use std::sync::Arc;

use crate::notifier::{Notifier, NotifierError};
use crate::store::{CodeStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ReplenishError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplenishOutcome {
    /// An unused code is on hand; nothing was dispatched.
    Healthy,
    /// The inventory is exhausted; one replenishment request went out.
    Requested,
}

/// Decides whether a new code must be requested.
///
/// Invoked on a schedule, with no caller input. Read-only against the store;
/// the only side effect is the outbound dispatch.
pub struct ReplenishmentTrigger {
    store: Arc<dyn CodeStore>,
    notifier: Arc<Notifier>,
}

impl ReplenishmentTrigger {
    pub fn new(store: Arc<dyn CodeStore>, notifier: Arc<Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Request a new code unless the newest record is still unused.
    ///
    /// Checking only the newest record is sufficient: the inventory holds at
    /// most one usable code at a time, so a full unused scan buys nothing.
    /// The healthy fast path is also what keeps redundant requests from
    /// piling up while a reply is pending and the slot already refilled.
    pub async fn check_and_replenish(&self) -> Result<ReplenishOutcome, ReplenishError> {
        if let Some(record) = self.store.newest().await?
            && !record.used
        {
            tracing::debug!(code = %record.value, "unused code on hand, no replenishment needed");
            return Ok(ReplenishOutcome::Healthy);
        }

        self.notifier.request_new_code().await?;
        Ok(ReplenishOutcome::Requested)
    }
}
