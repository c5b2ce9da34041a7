//! Outbound replenishment requests to the external code provider.
//!
//! The provider hands out a fresh code by replying to any message it
//! receives, so a request is just one mail with an empty subject and body.
//! Dispatch goes through the `MailTransport` seam; the shipped transport
//! POSTs the message as JSON to a configured mail-relay endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("mail relay request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail relay rejected the message with status {0}")]
    RelayStatus(u16),
}

/// One outbound mail, as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub sender: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Transport seam for actually dispatching mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifierError>;
}

/// Dispatches messages as JSON POSTs to a mail-relay endpoint.
pub struct HttpMailTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpMailTransport {
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        Self { endpoint, client }
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::RelayStatus(status.as_u16()));
        }

        tracing::debug!(status = %status, "replenishment request relayed");
        Ok(())
    }
}

/// How the sender address of a replenishment request is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderStrategy {
    /// A configured address, used verbatim on every request.
    Fixed(String),
    /// A fresh random local part against `domain` on every request. Some
    /// providers thread or deduplicate repeated mail from an identical
    /// sender and stop replying; rotating the local part defeats that.
    Rotating { domain: String },
}

impl SenderStrategy {
    fn address(&self) -> String {
        match self {
            Self::Fixed(address) => address.clone(),
            Self::Rotating { domain } => format!("{}@{}", random_local_part(), domain),
        }
    }
}

const LOCAL_PART_LEN: usize = 8;
const LOCAL_PART_ALPHABET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_local_part() -> String {
    let mut rng = rand::rng();
    (0..LOCAL_PART_LEN)
        .map(|_| LOCAL_PART_ALPHABET[rng.random_range(0..LOCAL_PART_ALPHABET.len())] as char)
        .collect()
}

/// Composes and dispatches replenishment requests.
///
/// No retry loop lives here: a failed dispatch is surfaced to the caller, and
/// the next periodic check or ingest attempt is the natural retry.
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    recipient: String,
    sender: SenderStrategy,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        recipient: String,
        sender: SenderStrategy,
    ) -> Self {
        Self {
            transport,
            recipient,
            sender,
        }
    }

    /// Send one replenishment request to the provider.
    pub async fn request_new_code(&self) -> Result<(), NotifierError> {
        let message = OutboundMessage {
            sender: self.sender.address(),
            to: self.recipient.clone(),
            subject: String::new(),
            body: String::new(),
        };

        self.transport.send(&message).await?;
        tracing::info!(to = %self.recipient, "requested a new code from the provider");
        Ok(())
    }
}
