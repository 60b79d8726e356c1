//! Venue attribution from invoked program ids
//!
//! Attribution is best-effort: the registry matches exact program ids, and the
//! optional substring fallback matches marker fragments. Prefix/substring
//! matching can misattribute unrelated program ids, so it is opt-in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    Jupiter,
    Raydium,
    Orca,
    Meteora,
    PumpSwap,
    PumpFun,
    Unknown,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Jupiter => "Jupiter",
            Venue::Raydium => "Raydium",
            Venue::Orca => "Orca",
            Venue::Meteora => "Meteora",
            Venue::PumpSwap => "PumpSwap",
            Venue::PumpFun => "PumpFun",
            Venue::Unknown => "Unknown",
        }
    }

    /// Unrecognised names map to `Unknown`
    pub fn from_name(name: &str) -> Self {
        match name {
            "Jupiter" => Venue::Jupiter,
            "Raydium" => Venue::Raydium,
            "Orca" => Venue::Orca,
            "Meteora" => Venue::Meteora,
            "PumpSwap" => Venue::PumpSwap,
            "PumpFun" => Venue::PumpFun,
            _ => Venue::Unknown,
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const KNOWN_PROGRAMS: &[(&str, Venue)] = &[
    ("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4", Venue::Jupiter),
    ("JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB", Venue::Jupiter),
    ("DCA265Vj8a9CEuX1eb1LWRnDT7uK6q1xMipnNyatn23M", Venue::Jupiter),
    ("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8", Venue::Raydium),
    ("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK", Venue::Raydium),
    ("CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C", Venue::Raydium),
    ("LanMV9sAd7wArD4vJFi2qDdfnVhFxYSUg6eADduJ3uj", Venue::Raydium),
    ("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc", Venue::Orca),
    ("9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP", Venue::Orca),
    ("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo", Venue::Meteora),
    ("Eo7WjKq67rjJQSZxS6z3YkapzY3eMj6Xy8X5EQVn5UaB", Venue::Meteora),
    ("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA", Venue::PumpSwap),
    ("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P", Venue::PumpFun),
];

/// Marker fragments checked in order; `true` means case-insensitive
const SUBSTRING_MARKERS: &[(&str, bool, Venue)] = &[
    ("Jup", false, Venue::Jupiter),
    ("Rayd", false, Venue::Raydium),
    ("orca", true, Venue::Orca),
];

/// Registry of known program ids mapped to trading venues
#[derive(Debug, Clone)]
pub struct VenueRegistry {
    programs: HashMap<String, Venue>,
    substring_fallback: bool,
}

impl VenueRegistry {
    pub fn new(substring_fallback: bool) -> Self {
        let programs = KNOWN_PROGRAMS
            .iter()
            .map(|(id, venue)| (id.to_string(), *venue))
            .collect();

        Self {
            programs,
            substring_fallback,
        }
    }

    /// First registered program id in invocation order wins; then, if enabled,
    /// the first marker found in any program id. Defaults to `Unknown`.
    pub fn attribute(&self, program_ids: &[String]) -> Venue {
        if let Some(venue) = program_ids
            .iter()
            .find_map(|id| self.programs.get(id.as_str()).copied())
        {
            return venue;
        }

        if self.substring_fallback {
            for (marker, case_insensitive, venue) in SUBSTRING_MARKERS {
                let hit = program_ids.iter().any(|id| {
                    if *case_insensitive {
                        id.to_lowercase().contains(&marker.to_lowercase())
                    } else {
                        id.contains(marker)
                    }
                });
                if hit {
                    return *venue;
                }
            }
        }

        Venue::Unknown
    }
}

impl Default for VenueRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}
