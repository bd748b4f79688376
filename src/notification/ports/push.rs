//! Push delivery port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Message sent to every device token of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Notification headline.
    pub title: String,
    /// Notification text.
    pub body: String,
    /// In-app route opened on tap.
    pub link: String,
}

/// A token the gateway could not deliver to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFailure {
    /// Rejected device token.
    pub token: String,
    /// Gateway-reported reason.
    pub reason: String,
}

/// Per-token outcome of a multicast send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MulticastReport {
    /// Number of tokens the message reached.
    pub success_count: usize,
    /// Tokens that failed.
    pub failures: Vec<TokenFailure>,
}

impl MulticastReport {
    /// Returns the number of failed tokens.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Sends push messages to device tokens.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Sends `message` to each of `tokens`.
    ///
    /// Individual token failures are reported in the [`MulticastReport`];
    /// an `Err` means the request as a whole failed.
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastReport, PushError>;
}

/// Errors returned by push gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum PushError {
    /// The gateway could not be reached or refused the request.
    #[error("push transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl PushError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
