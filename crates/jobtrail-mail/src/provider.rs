//! Mailbox provider capability.
//!
//! The ingestion pipeline consumes a mailbox through this interface only;
//! authentication flows and wire formats belong to the implementation. A
//! deterministic fake stands in for the real backend in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::payload::MessagePart;

/// Supported mailbox vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provider {
    /// Gmail mailbox.
    #[default]
    Gmail,
    /// Outlook mailbox.
    Outlook,
}

impl Provider {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "outlook" => Self::Outlook,
            _ => Self::Gmail,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// One connected mailbox. `account_key` distinguishes multiple mailboxes
/// under the same vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailAccount {
    /// Mailbox vendor.
    pub provider: Provider,
    /// Key identifying this mailbox among the vendor's accounts.
    pub account_key: String,
    /// Long-lived refresh token handed to `resolve_access_token`.
    pub refresh_token: String,
}

/// A short-lived access token resolved from a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Bearer token value.
    pub access_token: String,
    /// Expiry instant.
    pub expiry: DateTime<Utc>,
}

/// One raw message as delivered by the mailbox backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider-native message id (dedupe key together with the account).
    pub id: String,
    /// From header.
    pub from: String,
    /// Subject header.
    pub subject: String,
    /// Raw Date header.
    pub date: String,
    /// Provider-generated preview snippet. Kept for display only; it is
    /// never part of the classifier input.
    pub snippet: String,
    /// Receive time in epoch milliseconds.
    pub received_at: i64,
    /// Body payload tree, when the provider supplied one.
    pub payload: Option<MessagePart>,
}

impl RawMessage {
    /// Builds the classifier input block: header lines followed by the
    /// normalized body. The snippet field stays out so the classifier
    /// never sees stale or duplicated preview text.
    #[must_use]
    pub fn classifier_input(&self, normalized_body: &str) -> String {
        format!(
            "From: {}\nSubject: {}\nDate: {}\nBody:\n{}",
            self.from, self.subject, self.date, normalized_body
        )
    }
}

/// Capability interface to a mailbox backend.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists candidate post-application messages for one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request or responds
    /// with a non-success status.
    async fn fetch_candidate_messages(&self, account: &MailAccount) -> Result<Vec<RawMessage>>;

    /// Exchanges a refresh token for a short-lived access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token endpoint rejects the refresh token.
    async fn resolve_access_token(&self, refresh_token: &str) -> Result<AccessToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_roundtrip() {
        for provider in [Provider::Gmail, Provider::Outlook] {
            assert_eq!(Provider::parse(provider.as_str()), provider);
        }
    }

    #[test]
    fn test_classifier_input_excludes_snippet() {
        let raw = RawMessage {
            id: "m-1".to_string(),
            from: "recruiting@example.com".to_string(),
            subject: "Application received".to_string(),
            date: "Mon, 2 Feb 2026 09:00:00 +0000".to_string(),
            snippet: "STALE PREVIEW".to_string(),
            received_at: 1_770_000_000_000,
            payload: None,
        };

        let input = raw.classifier_input("We received your application.");
        assert!(input.starts_with("From: recruiting@example.com\n"));
        assert!(input.contains("Subject: Application received\n"));
        assert!(input.contains("Body:\nWe received your application."));
        assert!(!input.contains("STALE PREVIEW"));
    }
}
