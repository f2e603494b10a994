use std::sync::Arc;
use std::time::Duration;

use pagegen_core::config::LlmConfig;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::llm::{LlmClient, ServiceError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_delay_ms: 500, max_delay_ms: 8_000 }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Per-call limits applied on top of a raw [`LlmClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallLimits {
    pub timeout: Duration,
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for CallLimits {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(60), max_concurrency: 8, retry: RetryPolicy::default() }
    }
}

impl From<&LlmConfig> for CallLimits {
    fn from(config: &LlmConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_concurrency: config.max_concurrency.max(1),
            retry: RetryPolicy { max_retries: config.max_retries, ..RetryPolicy::default() },
        }
    }
}

/// The completion contract the pipeline depends on: single calls with
/// timeout and retry, and order-preserving concurrent batches.
#[derive(Clone)]
pub struct CompletionService {
    client: Arc<dyn LlmClient>,
    limits: CallLimits,
}

impl CompletionService {
    pub fn new(client: Arc<dyn LlmClient>, limits: CallLimits) -> Self {
        Self { client, limits }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.limits.timeout, self.client.complete(prompt))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ServiceError::timeout(self.limits.timeout)),
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(error) if error.is_retryable() && attempt < self.limits.retry.max_retries => {
                    warn!(
                        event_name = "llm.completion.retry",
                        attempt,
                        max_retries = self.limits.retry.max_retries,
                        error = %error,
                        "completion call failed; retrying"
                    );
                    let delay = self.limits.retry.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Completes every prompt concurrently. `result[i]` answers `prompts[i]`.
    ///
    /// The first failure aborts every call still in flight and fails the
    /// whole batch; no partial results are returned.
    pub async fn complete_batch(&self, prompts: Vec<String>) -> Result<Vec<String>, ServiceError> {
        let total = prompts.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let permits = Arc::new(Semaphore::new(self.limits.max_concurrency.max(1)));
        let mut calls = JoinSet::new();
        for (index, prompt) in prompts.into_iter().enumerate() {
            let service = self.clone();
            let permits = Arc::clone(&permits);
            calls.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| ServiceError::cancelled("batch permits were closed"))?;
                let text = service.complete(&prompt).await?;
                Ok::<_, ServiceError>((index, text))
            });
        }

        let mut slots: Vec<Option<String>> = vec![None; total];
        while let Some(joined) = calls.join_next().await {
            let outcome = joined.unwrap_or_else(|error| {
                Err(ServiceError::cancelled(format!("completion task did not finish: {error}")))
            });
            match outcome {
                Ok((index, text)) => {
                    debug!(index, total, "batch completion received");
                    slots[index] = Some(text);
                }
                Err(error) => {
                    calls.abort_all();
                    return Err(error);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| ServiceError::cancelled(format!("no completion for prompt {index}")))
            })
            .collect()
    }
}
