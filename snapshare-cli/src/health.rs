//! Server warm-up.
//!
//! Hosted backends may be asleep when the first request arrives. Before an
//! operation that must not time out, the client pings `/health` a few times
//! with generous timeouts and remembers a success for a short while.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::api::{ApiClient, ApiError};

/// Why a single health probe failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    Failed(String),
}

impl From<ApiError> for ProbeFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(e) if e.is_timeout() => ProbeFailure::Timeout,
            other => ProbeFailure::Failed(other.to_string()),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Server did not respond after {attempts} attempts: {last}")]
pub struct WarmUpError {
    pub attempts: u32,
    pub last: String,
}

#[derive(Debug, Clone)]
pub struct WarmUpPolicy {
    pub max_attempts: u32,
    pub first_timeout: Duration,
    pub retry_timeout: Duration,
    /// Pause after an attempt that timed out
    pub timeout_backoff: Duration,
    /// Pause after any other failure
    pub failure_backoff: Duration,
    pub cache_ttl: Duration,
}

impl Default for WarmUpPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            first_timeout: Duration::from_secs(120),
            retry_timeout: Duration::from_secs(60),
            timeout_backoff: Duration::from_secs(1),
            failure_backoff: Duration::from_secs(3),
            cache_ttl: Duration::from_secs(120),
        }
    }
}

impl WarmUpPolicy {
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            self.first_timeout
        } else {
            self.retry_timeout
        }
    }

    fn backoff_after(&self, failure: &ProbeFailure) -> Duration {
        match failure {
            ProbeFailure::Timeout => self.timeout_backoff,
            ProbeFailure::Failed(_) => self.failure_backoff,
        }
    }
}

pub struct HealthChecker {
    policy: WarmUpPolicy,
    last_success: Option<Instant>,
}

impl HealthChecker {
    pub fn new(policy: WarmUpPolicy) -> Self {
        Self {
            policy,
            last_success: None,
        }
    }

    /// A success recorded within the cache window
    pub fn is_warm(&self) -> bool {
        self.last_success
            .map(|at| at.elapsed() < self.policy.cache_ttl)
            .unwrap_or(false)
    }

    /// Warm up against a running server
    pub async fn ensure_server_ready(&mut self, client: &ApiClient) -> Result<(), WarmUpError> {
        self.ensure_ready(|timeout| async move {
            let status = client.health_check(timeout).await?;
            log::debug!("Health check answered with {}", status);
            Ok::<(), ProbeFailure>(())
        })
        .await
    }

    /// Run `probe` with the policy's timeouts until it succeeds or the
    /// attempts run out. Returns immediately while a recent success is cached.
    pub async fn ensure_ready<F, Fut>(&mut self, mut probe: F) -> Result<(), WarmUpError>
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = Result<(), ProbeFailure>>,
    {
        if self.is_warm() {
            log::debug!("Server was reachable recently, skipping warm-up");
            return Ok(());
        }

        let mut last = String::from("no attempt made");
        for attempt in 1..=self.policy.max_attempts {
            let timeout = self.policy.timeout_for(attempt);
            if attempt > 1 {
                log::info!(
                    "Waking up server (attempt {}/{})...",
                    attempt,
                    self.policy.max_attempts
                );
            }

            match probe(timeout).await {
                Ok(()) => {
                    self.last_success = Some(Instant::now());
                    return Ok(());
                }
                Err(failure) => {
                    log::warn!("Health check attempt {} failed: {:?}", attempt, failure);
                    last = match &failure {
                        ProbeFailure::Timeout => format!("timed out after {:?}", timeout),
                        ProbeFailure::Failed(msg) => msg.clone(),
                    };
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.backoff_after(&failure)).await;
                    }
                }
            }
        }

        Err(WarmUpError {
            attempts: self.policy.max_attempts,
            last,
        })
    }
}
