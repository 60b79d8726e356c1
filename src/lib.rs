//! holderflow: top-holder discovery and transfer ingestion for one token mint
//!
//! - `ingest_core` - upstream RPC, failover, address checks, classification
//! - `pipeline` - discovery, window scanning, persistence, cycle engine

pub mod ingest_core;
pub mod pipeline;
