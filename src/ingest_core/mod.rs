pub mod address;
pub mod balance_extractor;
pub mod config;
pub mod error_handler;
pub mod failover;
pub mod rpc_client;
pub mod trade_detector;
pub mod venue;

pub use config::{ConfigError, IngestConfig};
pub use error_handler::IngestError;
pub use failover::{FailoverExecutor, LedgerExecutor, RetryPolicy};
pub use rpc_client::{Commitment, JsonRpcClient, LedgerRpc};
pub use trade_detector::TransferClassifier;
pub use venue::{Venue, VenueRegistry};
