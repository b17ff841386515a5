//! Retry-aware mutation with operator-initiated, exponentially backed-off retry.
//!
//! A failed write is never retried automatically. The failure is recorded
//! together with the variables it ran with, and `manual_retry` re-issues the
//! same write after a backoff delay when the failure is retryable and the
//! attempt budget is not exhausted.
//!
//! State machine:
//!
//! ```text
//! Idle --mutate--> Pending --ok--> Idle
//!                     |
//!                     +--err--> FailedRetryable | FailedTerminal
//! FailedRetryable --manual_retry--> Retrying --ok--> Idle
//!                                      |
//!                                      +--err--> FailedRetryable | FailedTerminal
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::error::ClientError;

/// Exposes the HTTP status of a failure, if any, for retry classification.
pub trait RetryClassify {
    fn http_status(&self) -> Option<u16>;
}

impl RetryClassify for ClientError {
    fn http_status(&self) -> Option<u16> {
        self.status()
    }
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of manual retries.
    pub max_retries: u32,
    /// Base delay before a retry is re-issued.
    pub retry_delay: Duration,
    /// Double the delay on every attempt (`retry_delay * 2^attempts`).
    pub exponential_backoff: bool,
    /// Statuses that make a failure terminal.
    pub non_retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            exponential_backoff: true,
            non_retryable_statuses: vec![400, 401, 403, 404, 422],
        }
    }
}

impl RetryConfig {
    /// Delay before the retry that follows `attempts` previous retries.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        if !self.exponential_backoff {
            return self.retry_delay;
        }
        let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
        self.retry_delay.saturating_mul(factor)
    }

    /// Failures without a status (transport errors) are retryable.
    pub fn is_retryable_status(&self, status: Option<u16>) -> bool {
        match status {
            Some(s) => !self.non_retryable_statuses.contains(&s),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPhase {
    Idle,
    Pending,
    FailedRetryable,
    FailedTerminal,
    Retrying,
}

/// Retry bookkeeping for one mutation instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState<E> {
    pub attempts: u32,
    pub last_error: Option<E>,
    pub is_retrying: bool,
    pub phase: RetryPhase,
}

impl<E> Default for RetryState<E> {
    fn default() -> Self {
        Self {
            attempts: 0,
            last_error: None,
            is_retrying: false,
            phase: RetryPhase::Idle,
        }
    }
}

/// Why `manual_retry` declined to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RetryRefusal {
    #[error("no failed mutation to retry")]
    NothingToRetry,

    #[error("status {0} is not retryable")]
    NonRetryable(u16),

    #[error("retry budget exhausted after {0} attempts")]
    Exhausted(u32),
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("retry refused: {0}")]
    Refused(RetryRefusal),

    #[error("retry attempt failed: {0}")]
    Failed(E),
}

/// Wraps one asynchronous write.
///
/// `mutate` and `manual_retry` take `&mut self`, so two attempts on the same
/// instance can never overlap. Observers subscribe to state changes through
/// [`RetryMutation::subscribe`].
pub struct RetryMutation<V, T, E, F> {
    mutation: F,
    config: RetryConfig,
    last_variables: Option<V>,
    state: watch::Sender<RetryState<E>>,
    _output: PhantomData<fn() -> T>,
}

impl<V, T, E, F, Fut> RetryMutation<V, T, E, F>
where
    V: Clone,
    E: Clone + RetryClassify + std::fmt::Display,
    F: Fn(V) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    pub fn new(mutation: F) -> Self {
        Self::with_config(mutation, RetryConfig::default())
    }

    pub fn with_config(mutation: F, config: RetryConfig) -> Self {
        let (state, _) = watch::channel(RetryState::default());
        Self {
            mutation,
            config,
            last_variables: None,
            state,
            _output: PhantomData,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Snapshot of the current retry state.
    pub fn retry_state(&self) -> RetryState<E> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RetryState<E>> {
        self.state.subscribe()
    }

    /// Whether a subsequent `manual_retry` would run.
    pub fn can_retry(&self) -> bool {
        self.check_retry().is_ok()
    }

    /// Run the mutation once. Failures are recorded, never retried here.
    pub async fn mutate(&mut self, variables: V) -> Result<T, E> {
        self.state.send_modify(|s| s.phase = RetryPhase::Pending);
        let result = (self.mutation)(variables.clone()).await;
        match &result {
            Ok(_) => self.reset_retry_state(),
            Err(err) => {
                tracing::warn!("mutation failed: {err}");
                self.last_variables = Some(variables);
                self.record_failure(err.clone());
            }
        }
        result
    }

    /// Re-issue the last failed mutation with its original variables.
    pub async fn manual_retry(&mut self) -> Result<T, RetryError<E>> {
        let (variables, attempts) = self.check_retry().map_err(RetryError::Refused)?;

        let delay = self.config.delay_for(attempts);
        self.state.send_modify(|s| {
            s.attempts = attempts + 1;
            s.is_retrying = true;
            s.phase = RetryPhase::Retrying;
        });
        tracing::info!(
            attempt = attempts + 1,
            max_retries = self.config.max_retries,
            delay_ms = delay.as_millis() as u64,
            "retrying mutation"
        );

        let outcome = {
            let guard = RetryingGuard::new(&self.state, self.config.max_retries);
            tokio::time::sleep(delay).await;
            let outcome = (self.mutation)(variables).await;
            guard.disarm();
            outcome
        };

        match outcome {
            Ok(value) => {
                tracing::info!(attempt = attempts + 1, "retry succeeded");
                self.reset_retry_state();
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(attempt = attempts + 1, "retry failed: {err}");
                self.record_failure(err.clone());
                Err(RetryError::Failed(err))
            }
        }
    }

    /// Forget the recorded failure and attempt count.
    pub fn reset_retry_state(&mut self) {
        self.last_variables = None;
        self.state.send_replace(RetryState::default());
    }

    fn check_retry(&self) -> Result<(V, u32), RetryRefusal> {
        let state = self.state.borrow();
        let (Some(variables), Some(err)) = (&self.last_variables, &state.last_error) else {
            return Err(RetryRefusal::NothingToRetry);
        };
        let status = err.http_status();
        if !self.config.is_retryable_status(status) {
            return Err(RetryRefusal::NonRetryable(status.unwrap_or_default()));
        }
        if state.attempts >= self.config.max_retries {
            return Err(RetryRefusal::Exhausted(state.attempts));
        }
        Ok((variables.clone(), state.attempts))
    }

    fn record_failure(&mut self, err: E) {
        let retryable = self.config.is_retryable_status(err.http_status());
        let max_retries = self.config.max_retries;
        self.state.send_modify(|s| {
            s.is_retrying = false;
            s.phase = if retryable && s.attempts < max_retries {
                RetryPhase::FailedRetryable
            } else {
                RetryPhase::FailedTerminal
            };
            s.last_error = Some(err);
        });
    }
}

/// Settles a `Retrying` state whose attempt was dropped before the mutation
/// returned. The spent attempt stays counted and the previous error stays
/// recorded.
struct RetryingGuard<'a, E> {
    state: &'a watch::Sender<RetryState<E>>,
    max_retries: u32,
    armed: bool,
}

impl<'a, E> RetryingGuard<'a, E> {
    fn new(state: &'a watch::Sender<RetryState<E>>, max_retries: u32) -> Self {
        Self {
            state,
            max_retries,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<E> Drop for RetryingGuard<'_, E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let max_retries = self.max_retries;
        self.state.send_modify(|s| {
            s.is_retrying = false;
            s.phase = if s.attempts < max_retries {
                RetryPhase::FailedRetryable
            } else {
                RetryPhase::FailedTerminal
            };
        });
        tracing::warn!(attempt = self.state.borrow().attempts, "retry abandoned before completion");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Mutation that fails with the queued statuses, then succeeds.
    fn scripted(
        calls: Arc<AtomicU32>,
        failures: Vec<u16>,
    ) -> impl Fn(String) -> std::pin::Pin<Box<dyn Future<Output = Result<String, ClientError>>>>
    {
        move |name: String| {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let outcome = match failures.get(n) {
                Some(status) => Err(ClientError::http(*status, None)),
                None => Ok(format!("saved {name}")),
            };
            Box::pin(async move { outcome })
        }
    }

    #[test]
    fn exponential_delay_doubles_per_attempt() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for(2), Duration::from_millis(4000));

        let flat = RetryConfig {
            exponential_backoff: false,
            ..RetryConfig::default()
        };
        assert_eq!(flat.delay_for(5), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_status_is_not_reissued() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut m = RetryMutation::new(scripted(calls.clone(), vec![404]));

        assert!(m.mutate("risk".to_string()).await.is_err());
        assert_eq!(m.retry_state().phase, RetryPhase::FailedTerminal);

        let err = m.manual_retry().await.unwrap_err();
        assert!(matches!(err, RetryError::Refused(RetryRefusal::NonRetryable(404))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(m.retry_state().attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_retry_resets_state() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut m = RetryMutation::new(scripted(calls.clone(), vec![500]));

        assert!(m.mutate("vendor".to_string()).await.is_err());
        let state = m.retry_state();
        assert_eq!(state.phase, RetryPhase::FailedRetryable);
        assert_eq!(state.last_error.as_ref().and_then(|e| e.status()), Some(500));

        let value = m.manual_retry().await.unwrap();
        assert_eq!(value, "saved vendor");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let state = m.retry_state();
        assert_eq!(state.attempts, 0);
        assert!(state.last_error.is_none());
        assert!(!state.is_retrying);
        assert_eq!(state.phase, RetryPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_retry_keeps_attempt_count_until_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        };
        let mut m = RetryMutation::with_config(scripted(calls.clone(), vec![503, 503, 502]), config);

        assert!(m.mutate("plan".to_string()).await.is_err());

        assert!(matches!(m.manual_retry().await, Err(RetryError::Failed(_))));
        let state = m.retry_state();
        assert_eq!(state.attempts, 1);
        assert!(!state.is_retrying);
        assert_eq!(state.phase, RetryPhase::FailedRetryable);

        assert!(matches!(m.manual_retry().await, Err(RetryError::Failed(_))));
        assert_eq!(m.retry_state().attempts, 2);
        assert_eq!(m.retry_state().phase, RetryPhase::FailedTerminal);

        let refused = m.manual_retry().await.unwrap_err();
        assert!(matches!(refused, RetryError::Refused(RetryRefusal::Exhausted(2))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_backoff_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut m = RetryMutation::new(scripted(calls.clone(), vec![500, 500]));
        assert!(m.mutate("audit".to_string()).await.is_err());

        let start = tokio::time::Instant::now();
        let _ = m.manual_retry().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));

        let start = tokio::time::Instant::now();
        let _ = m.manual_retry().await;
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_retry_releases_retrying_state() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut m = RetryMutation::new(scripted(calls.clone(), vec![500]));
        assert!(m.mutate("control".to_string()).await.is_err());

        let abandoned = tokio::time::timeout(Duration::from_millis(10), m.manual_retry()).await;
        assert!(abandoned.is_err());

        let state = m.retry_state();
        assert_eq!(state.attempts, 1);
        assert!(!state.is_retrying);
        assert_eq!(state.phase, RetryPhase::FailedRetryable);
        assert_eq!(state.last_error.as_ref().and_then(|e| e.status()), Some(500));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The control is usable again and reissues the original variables.
        assert!(m.can_retry());
        assert_eq!(m.manual_retry().await.unwrap(), "saved control");
        assert_eq!(m.retry_state().attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoning_the_last_attempt_is_terminal() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            max_retries: 1,
            ..RetryConfig::default()
        };
        let mut m = RetryMutation::with_config(scripted(calls, vec![503]), config);
        assert!(m.mutate("vendor".to_string()).await.is_err());

        let _ = tokio::time::timeout(Duration::from_millis(10), m.manual_retry()).await;
        let state = m.retry_state();
        assert!(!state.is_retrying);
        assert_eq!(state.phase, RetryPhase::FailedTerminal);
        assert!(!m.can_retry());
    }

    #[tokio::test]
    async fn retry_without_failure_is_refused() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut m = RetryMutation::new(scripted(calls, vec![]));
        assert!(!m.can_retry());
        assert!(matches!(
            m.manual_retry().await,
            Err(RetryError::Refused(RetryRefusal::NothingToRetry))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_observe_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut m = RetryMutation::new(scripted(calls, vec![500]));
        let rx = m.subscribe();
        let _ = m.mutate("framework".to_string()).await;
        assert_eq!(rx.borrow().phase, RetryPhase::FailedRetryable);
    }
}
