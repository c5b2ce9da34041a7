//! CodeService: transport-agnostic facade over the three coordination flows.
//!
//! Owns the Claim Coordinator, the Replenishment Trigger, and the Reply
//! Ingestor over a shared store and notifier. Transports delegate to this
//! service; nothing below it knows about HTTP.

use std::sync::Arc;
use std::time::Duration;

use crate::claim::{ClaimCoordinator, ClaimError, ClaimOutcome};
use crate::ingest::{IngestError, IngestOutcome, ReplyIngestor};
use crate::notifier::Notifier;
use crate::replenish::{ReplenishError, ReplenishOutcome, ReplenishmentTrigger};
use crate::store::CodeStore;

pub struct CodeService {
    claim: ClaimCoordinator,
    trigger: ReplenishmentTrigger,
    ingestor: ReplyIngestor,
}

impl CodeService {
    pub fn new(store: Arc<dyn CodeStore>, notifier: Arc<Notifier>) -> Self {
        Self {
            claim: ClaimCoordinator::new(Arc::clone(&store)),
            trigger: ReplenishmentTrigger::new(Arc::clone(&store), Arc::clone(&notifier)),
            ingestor: ReplyIngestor::new(store, notifier),
        }
    }

    pub async fn claim(&self) -> Result<ClaimOutcome, ClaimError> {
        self.claim.claim().await
    }

    pub async fn check_and_replenish(&self) -> Result<ReplenishOutcome, ReplenishError> {
        self.trigger.check_and_replenish().await
    }

    pub async fn ingest(&self, raw: &[u8]) -> Result<IngestOutcome, IngestError> {
        self.ingestor.ingest(raw).await
    }
}

/// Drive the inventory check on a fixed schedule, forever.
///
/// For deployments without an external scheduler hitting `/check`. Errors
/// are logged and the loop keeps ticking; the next tick is the retry.
pub async fn run_periodic_check(service: Arc<CodeService>, period: Duration) {
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;

        match service.check_and_replenish().await {
            Ok(ReplenishOutcome::Requested) => tracing::info!("replenishment requested"),
            Ok(ReplenishOutcome::Healthy) => tracing::debug!("inventory healthy"),
            Err(err) => tracing::warn!(error = %err, "periodic inventory check failed"),
        }
    }
}
