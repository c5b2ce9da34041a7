//! guestcode: single-slot inventory of one-time guest access codes.
//!
//! Callers claim codes over HTTP under an at-most-once guarantee; the
//! inventory is replenished by mailing an external provider and ingesting
//! the code from its asynchronous reply.

pub mod claim;
pub mod code;
pub mod config;
pub mod ingest;
pub mod notifier;
pub mod replenish;
pub mod service;
pub mod store;
pub mod transport;

pub use claim::{ClaimCoordinator, ClaimError, ClaimOutcome};
pub use code::{CodeRecord, extract_code};
pub use config::Config;
pub use ingest::{IngestError, IngestOutcome, ReplyIngestor};
pub use notifier::{
    HttpMailTransport, MailTransport, Notifier, NotifierError, OutboundMessage, SenderStrategy,
};
pub use replenish::{ReplenishError, ReplenishOutcome, ReplenishmentTrigger};
pub use service::{CodeService, run_periodic_check};
pub use store::{CodeStore, MemoryCodeStore, StoreError};
