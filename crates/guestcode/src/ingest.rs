//! Ingestion of provider replies.
//!
//! An inbound message either yields a genuinely new code, stored as a fresh
//! unused record, or triggers another replenishment request: no token found,
//! or a token the store has already seen. The duplicate check runs across
//! used and unused records alike, so a slow or retransmitted reply can never
//! resurrect an already-consumed code.

use std::sync::Arc;

use mailparse::ParsedMail;

use crate::code::{CodeRecord, extract_code};
use crate::notifier::{Notifier, NotifierError};
use crate::store::{CodeStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new unused record was stored with this value.
    Stored(String),
    /// The message carried no recognizable token; replenishment re-requested.
    NoCode,
    /// The token is already known (stale or duplicate reply); replenishment
    /// re-requested, nothing stored.
    Duplicate(String),
}

pub struct ReplyIngestor {
    store: Arc<dyn CodeStore>,
    notifier: Arc<Notifier>,
}

impl ReplyIngestor {
    pub fn new(store: Arc<dyn CodeStore>, notifier: Arc<Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Process one raw inbound message.
    pub async fn ingest(&self, raw: &[u8]) -> Result<IngestOutcome, IngestError> {
        let body = match mailparse::parse_mail(raw) {
            Ok(message) => body_text(&message),
            Err(e) => {
                // An undecodable message cannot contain a token; handled the
                // same as a reply without one.
                tracing::warn!(error = %e, "undecodable inbound message");
                String::new()
            }
        };

        let Some(value) = extract_code(&body) else {
            tracing::info!("no code in the reply, requesting again");
            self.notifier.request_new_code().await?;
            return Ok(IngestOutcome::NoCode);
        };

        if self.store.contains(value).await? {
            tracing::warn!(code = %value, "received an already-known code, requesting again");
            self.notifier.request_new_code().await?;
            return Ok(IngestOutcome::Duplicate(value.to_string()));
        }

        self.store.insert(CodeRecord::fresh(value)).await?;
        tracing::info!(code = %value, "stored new code");
        Ok(IngestOutcome::Stored(value.to_string()))
    }
}

/// Concatenated text of every `text/*` leaf part, depth first.
fn body_text(part: &ParsedMail<'_>) -> String {
    if part.subparts.is_empty() {
        if part.ctype.mimetype.starts_with("text/") {
            return part.get_body().unwrap_or_default();
        }
        return String::new();
    }

    part.subparts
        .iter()
        .map(body_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
