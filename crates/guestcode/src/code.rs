//! Code records and code-token extraction.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Provider codes are a fixed `DCS` prefix followed by an alphanumeric run.
static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DCS[0-9A-Za-z]+").expect("code pattern is valid"));

/// A single guest access code in the inventory.
///
/// `used` transitions false→true exactly once and never reverts; `created`
/// is set at insertion and only ever used for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub value: String,
    pub used: bool,
    pub created: DateTime<Utc>,
}

impl CodeRecord {
    /// A fresh, unused record stamped with the current time.
    pub fn fresh(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            used: false,
            created: Utc::now(),
        }
    }
}

/// Scan `text` for a provider code token.
///
/// First match wins: provider replies contain at most one genuine code, and
/// taking the first occurrence is the intentional policy when the body quotes
/// earlier correspondence.
pub fn extract_code(text: &str) -> Option<&str> {
    CODE_PATTERN.find(text).map(|m| m.as_str())
}
