//! Bounded retry with failure classification

use std::time::Duration as StdDuration;

use tokio::time::sleep;

use super::ports::{Transcriber, TranscriptionError};
use crate::domain::transcription::{AudioData, Instruction};

/// Default attempt budget per segment
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubled for every attempt after that
const BASE_DELAY: StdDuration = StdDuration::from_millis(1500);

/// Retry policy: bounded attempts with exponential backoff, no jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: StdDuration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: StdDuration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the given 1-based attempt: base * 2^(attempt-1)
    fn backoff(&self, attempt: u32) -> StdDuration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Terminal outcome of one segment's transcription attempt chain.
#[derive(Debug, Clone)]
pub enum TranscribeOutcome {
    Success(String),
    /// Retries exhausted on a retriable failure; try again later via the queue
    Transient(TranscriptionError),
    /// Certain to recur; never retried or queued
    Fatal(TranscriptionError),
}

/// Run one segment through the transcriber with the policy's attempt budget.
///
/// Fatal errors short-circuit on the first classification with no delay.
/// Exhausting the budget on transient failures reports `Transient`, which
/// signals "retry later", never "impossible". No shared state is touched, so
/// this is safe for both live segments and queued replays.
pub async fn transcribe_with_retry(
    transcriber: &dyn Transcriber,
    audio: &AudioData,
    instruction: &Instruction,
    policy: &RetryPolicy,
) -> TranscribeOutcome {
    let mut attempt = 1;
    loop {
        match transcriber.transcribe(audio, instruction).await {
            Ok(text) => return TranscribeOutcome::Success(text),
            Err(error) if error.is_fatal() => return TranscribeOutcome::Fatal(error),
            Err(error) => {
                if attempt >= policy.max_attempts {
                    return TranscribeOutcome::Transient(error);
                }
                let delay = policy.backoff(attempt);
                tracing::debug!(
                    %error,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient transcription failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
