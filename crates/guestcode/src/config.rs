//! Process configuration.
//!
//! Built once at startup and passed by reference into the components that
//! need it; nothing reads the environment at call time.

use std::time::Duration;

use anyhow::{Context, bail};

use crate::notifier::SenderStrategy;
use crate::transport::http::ServerConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Recipient of outbound replenishment requests.
    pub recipient: String,
    /// Mail-relay endpoint outbound messages are POSTed to.
    pub relay_url: String,
    /// Sender identity for outbound requests.
    pub sender: SenderStrategy,
    pub server: ServerConfig,
    /// When set, an in-process loop drives the inventory check on this
    /// period; otherwise an external scheduler is expected to hit `/check`.
    pub check_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // An empty variable counts as unset.
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let recipient = lookup("GUESTCODE_RECIPIENT").context("GUESTCODE_RECIPIENT is not set")?;
        let relay_url = lookup("GUESTCODE_RELAY_URL").context("GUESTCODE_RELAY_URL is not set")?;

        let sender = match lookup("GUESTCODE_SENDER") {
            Some(address) => SenderStrategy::Fixed(address),
            None => {
                let domain = lookup("GUESTCODE_SENDER_DOMAIN").context(
                    "GUESTCODE_SENDER_DOMAIN is not set (required when GUESTCODE_SENDER is absent)",
                )?;
                SenderStrategy::Rotating { domain }
            }
        };

        let mut server = ServerConfig::default();
        if let Some(host) = lookup("GUESTCODE_HOST") {
            server.host = host;
        }
        if let Some(port) = lookup("GUESTCODE_PORT") {
            server.port = port.parse().context("GUESTCODE_PORT is not a valid port")?;
        }

        let check_interval = match lookup("GUESTCODE_CHECK_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .context("GUESTCODE_CHECK_INTERVAL_SECS is not a valid number of seconds")?;
                if secs == 0 {
                    bail!("GUESTCODE_CHECK_INTERVAL_SECS must be greater than zero");
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            recipient,
            relay_url,
            sender,
            server,
            check_interval,
        })
    }
}
