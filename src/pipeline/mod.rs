//! # Holder ingestion pipeline
//!
//! ```text
//! HolderDiscovery ──► ranked holders ──► WalletScanner (per wallet)
//!        │                                     │
//!        └──────────► TransferSink ◄───────────┘
//!                     (holders, transfers, watermarks)
//! ```
//!
//! ## Module Organization
//!
//! - `types` - Holder, SignatureRef, TransferRecord and friends
//! - `db` - `TransferSink` trait and its SQLite implementation
//! - `holders` - top-N holder discovery
//! - `scanner` - windowed, watermark-bounded signature scanning
//! - `engine` - one discovery + scan cycle over a bounded worker pool
//! - `scheduler` - periodic cycle trigger
//! - `shutdown` - cancellation signal shared by all in-flight scans
//! - `report` - wallet summaries over stored transfers

pub mod db;
pub mod engine;
pub mod holders;
pub mod report;
pub mod scanner;
pub mod scheduler;
pub mod shutdown;
pub mod types;

pub use db::{SqliteTransferSink, TransferSink};
pub use engine::{CycleReport, EngineSettings, IngestionEngine};
pub use holders::HolderDiscovery;
pub use report::{mint_symbol, summarize, TransferSummary};
pub use scanner::{ScanOptions, ScanOutcome, ScanStatus, WalletScanner};
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use types::{Holder, HolderSet, SignatureRef, TradeDirection, TransferRecord};
