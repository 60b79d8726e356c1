//! Address validation for mints, holders and scanned wallets
//!
//! Addresses are base58-encoded 32-byte keys. A "direct wallet" is a key on
//! the ed25519 curve; program-derived addresses are off-curve and cannot sign,
//! so they are excluded from transaction scanning.

use crate::ingest_core::error_handler::IngestError;
use solana_pubkey::Pubkey;
use std::str::FromStr;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const MIN_ADDRESS_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 44;

/// Parse and validate a base58 address.
///
/// Fails with `IngestError::Validation` on wrong length, characters outside
/// the base58 alphabet, or a payload that does not decode to 32 bytes.
pub fn parse_address(value: &str) -> Result<Pubkey, IngestError> {
    if value.len() < MIN_ADDRESS_LEN || value.len() > MAX_ADDRESS_LEN {
        return Err(IngestError::validation(format!(
            "address must be {}-{} characters, got {}: {}",
            MIN_ADDRESS_LEN,
            MAX_ADDRESS_LEN,
            value.len(),
            value
        )));
    }

    if let Some(bad) = value.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(IngestError::validation(format!(
            "address contains non-base58 character '{}': {}",
            bad, value
        )));
    }

    Pubkey::from_str(value)
        .map_err(|e| IngestError::validation(format!("invalid address {}: {}", value, e)))
}

pub fn is_valid_address(value: &str) -> bool {
    parse_address(value).is_ok()
}

/// Whether the address is a directly held (on-curve) wallet rather than a
/// program-derived address.
pub fn is_direct_wallet(address: &Pubkey) -> bool {
    address.is_on_curve()
}
