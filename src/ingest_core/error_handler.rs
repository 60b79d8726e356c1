use std::time::Duration;
use tokio::time::sleep;

/// Error taxonomy shared by every stage of the ingestion pipeline.
///
/// Only `RateLimited` is retried on the same endpoint; everything else from
/// upstream is endpoint-fatal and triggers failover.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Malformed address or token identifier
    Validation(String),
    /// Upstream asked us to slow down (HTTP 429 / JSON-RPC 429)
    RateLimited { endpoint: String, message: String },
    /// Any other upstream failure (transport, HTTP status, RPC error, decoding)
    TransientUpstream { endpoint: String, message: String },
    /// Every endpoint in the pool failed for one call
    AllEndpointsExhausted {
        operation: String,
        endpoints: usize,
        last_error: String,
    },
    /// A write to the persistence sink failed
    PersistenceWrite(String),
    /// A read from the persistence sink failed
    Storage(String),
    Config(String),
}

impl IngestError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, IngestError::RateLimited { .. })
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        IngestError::Validation(msg.into())
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Validation(msg) => write!(f, "Validation error: {}", msg),
            IngestError::RateLimited { endpoint, message } => {
                write!(f, "Rate limited by {}: {}", endpoint, message)
            }
            IngestError::TransientUpstream { endpoint, message } => {
                write!(f, "Upstream error from {}: {}", endpoint, message)
            }
            IngestError::AllEndpointsExhausted {
                operation,
                endpoints,
                last_error,
            } => write!(
                f,
                "All {} endpoints exhausted for {} (last error: {})",
                endpoints, operation, last_error
            ),
            IngestError::PersistenceWrite(msg) => write!(f, "Persistence write error: {}", msg),
            IngestError::Storage(msg) => write!(f, "Storage error: {}", msg),
            IngestError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<rusqlite::Error> for IngestError {
    fn from(err: rusqlite::Error) -> Self {
        IngestError::Storage(err.to_string())
    }
}

#[derive(Debug)]
pub struct MaxRetriesExceeded;

impl std::fmt::Display for MaxRetriesExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Maximum retry attempts exceeded")
    }
}

impl std::error::Error for MaxRetriesExceeded {}

/// Delay schedule `base * 2^attempt`, capped at `max_delay`.
#[derive(Debug)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
    current_attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration, retries: u32) -> Self {
        Self {
            base_delay: base,
            max_delay: max,
            max_retries: retries,
            current_attempt: 0,
        }
    }

    pub fn next_delay(&self) -> Duration {
        let factor = 2_u32.saturating_pow(self.current_attempt);
        std::cmp::min(self.base_delay.saturating_mul(factor), self.max_delay)
    }

    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }

    pub async fn sleep(&mut self) -> Result<(), MaxRetriesExceeded> {
        if self.current_attempt >= self.max_retries {
            return Err(MaxRetriesExceeded);
        }

        let delay = self.next_delay();

        log::warn!(
            "⏳ Retry attempt {} of {} in {}ms",
            self.current_attempt + 1,
            self.max_retries,
            delay.as_millis()
        );

        sleep(delay).await;
        self.current_attempt += 1;
        Ok(())
    }
}
