//! Push gateway that records messages instead of sending them.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::notification::ports::{
    MulticastReport, PushError, PushGateway, PushMessage, TokenFailure,
};

/// A message delivered to one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    /// Receiving device token.
    pub token: String,
    /// Delivered message.
    pub message: PushMessage,
}

#[derive(Debug, Default)]
struct Recorder {
    sent: Vec<SentPush>,
    rejected_tokens: BTreeSet<String>,
}

/// Push gateway for tests and local runs.
///
/// Tokens registered with [`RecordingPushGateway::reject_token`] are
/// reported as failed; every other token is recorded as delivered.
#[derive(Debug, Clone, Default)]
pub struct RecordingPushGateway {
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingPushGateway {
    /// Creates a gateway that accepts every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes future sends to `token` fail.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Transport`] when the recorder lock is poisoned.
    pub fn reject_token(&self, token: impl Into<String>) -> Result<(), PushError> {
        self.lock()?.rejected_tokens.insert(token.into());
        Ok(())
    }

    /// Returns every delivered message in send order.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Transport`] when the recorder lock is poisoned.
    pub fn sent(&self) -> Result<Vec<SentPush>, PushError> {
        Ok(self.lock()?.sent.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Recorder>, PushError> {
        self.recorder
            .lock()
            .map_err(|err| PushError::transport(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> Result<MulticastReport, PushError> {
        let mut recorder = self.lock()?;
        let mut report = MulticastReport::default();
        for token in tokens {
            if recorder.rejected_tokens.contains(token) {
                report.failures.push(TokenFailure {
                    token: token.clone(),
                    reason: "registration token not registered".to_owned(),
                });
                continue;
            }
            recorder.sent.push(SentPush {
                token: token.clone(),
                message: message.clone(),
            });
            report.success_count += 1;
        }
        Ok(report)
    }
}
