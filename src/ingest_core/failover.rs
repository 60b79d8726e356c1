//! Endpoint failover executor
//!
//! Runs one upstream action against an ordered endpoint pool:
//! - rate-limited calls are retried on the same endpoint with exponential
//!   backoff, up to `max_attempts` calls per endpoint
//! - any other error abandons the endpoint immediately and moves to the next
//! - when every endpoint is abandoned the call fails with
//!   `IngestError::AllEndpointsExhausted`
//!
//! Each endpoint carries a request budget (semaphore) shared by every
//! concurrent caller; a permit is held only for the duration of one call.

use crate::ingest_core::error_handler::{ExponentialBackoff, IngestError};
use crate::ingest_core::rpc_client::LedgerRpc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Calls per endpoint before moving on (rate-limit class only)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Concurrent in-flight calls allowed per endpoint
    pub max_in_flight: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            max_in_flight: 4,
        }
    }
}

struct EndpointSlot<C> {
    label: String,
    client: C,
    budget: Arc<Semaphore>,
}

pub struct FailoverExecutor<C> {
    endpoints: Vec<EndpointSlot<C>>,
    policy: RetryPolicy,
}

/// Executor over the ledger RPC pool used by the pipeline
pub type LedgerExecutor = FailoverExecutor<Arc<dyn LedgerRpc>>;

impl<C: Clone> FailoverExecutor<C> {
    /// Build from `(label, client)` pairs in priority order.
    /// An empty pool is a configuration error.
    pub fn new(
        endpoints: impl IntoIterator<Item = (String, C)>,
        policy: RetryPolicy,
    ) -> Result<Self, IngestError> {
        let permits = policy.max_in_flight.max(1);
        let endpoints: Vec<EndpointSlot<C>> = endpoints
            .into_iter()
            .map(|(label, client)| EndpointSlot {
                label,
                client,
                budget: Arc::new(Semaphore::new(permits)),
            })
            .collect();

        if endpoints.is_empty() {
            return Err(IngestError::Config(
                "endpoint pool must contain at least one endpoint".to_string(),
            ));
        }

        Ok(Self { endpoints, policy })
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn endpoint_labels(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.label.as_str()).collect()
    }

    /// Execute `action` with failover. `operation` names the call in logs and
    /// in the exhaustion error. Business-level validation of the result is the
    /// caller's concern.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut action: F) -> Result<T, IngestError>
    where
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Result<T, IngestError>>,
    {
        let mut last_error = String::from("no attempt made");

        for slot in &self.endpoints {
            let mut backoff = ExponentialBackoff::new(
                self.policy.base_delay,
                self.policy.max_delay,
                self.policy.max_attempts.saturating_sub(1),
            );

            loop {
                let result = {
                    let _permit = slot
                        .budget
                        .acquire()
                        .await
                        .map_err(|_| IngestError::Config(format!("request budget for {} closed", slot.label)))?;
                    action(slot.client.clone()).await
                };

                match result {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_rate_limited() => {
                        last_error = err.to_string();
                        log::warn!(
                            "⚠️  Rate limit hit on {} during {} (attempt {} of {})",
                            slot.label,
                            operation,
                            backoff.attempts() + 1,
                            self.policy.max_attempts
                        );
                        if backoff.sleep().await.is_err() {
                            log::warn!("   └─ Giving up on {} for {}", slot.label, operation);
                            break;
                        }
                    }
                    Err(err) => {
                        log::warn!("⚠️  {} failed on {}: {}", operation, slot.label, err);
                        last_error = err.to_string();
                        break;
                    }
                }
            }
        }

        log::error!(
            "❌ All {} endpoints exhausted for {}",
            self.endpoints.len(),
            operation
        );

        Err(IngestError::AllEndpointsExhausted {
            operation: operation.to_string(),
            endpoints: self.endpoints.len(),
            last_error,
        })
    }
}

impl FailoverExecutor<Arc<dyn LedgerRpc>> {
    /// Label each client with its own endpoint URL
    pub fn from_clients(
        clients: Vec<Arc<dyn LedgerRpc>>,
        policy: RetryPolicy,
    ) -> Result<Self, IngestError> {
        Self::new(
            clients
                .into_iter()
                .map(|client| (client.endpoint().to_string(), client)),
            policy,
        )
    }
}
