//! Bitcoin address handling
//!
//! - Validation of a user-supplied target address
//! - Extraction of the unique counterpart addresses in a transaction set

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

use crate::Transaction;

// Base58, mainnet/testnet P2PKH and P2SH
static BASE58_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[13mn2][a-km-zA-HJ-NP-Z1-9]{25,34}$").unwrap());

// Bech32 (bc1/tb1), either case
static BECH32_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:(?:bc1|tb1)[ac-hj-np-z02-9]{8,87})$").unwrap());

/// Errors for user-supplied addresses
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Empty bitcoin address")]
    Empty,

    #[error("Not a bitcoin address: {0}")]
    Invalid(String),
}

/// Check that `address` looks like a Bitcoin address and return it trimmed.
///
/// Bech32 addresses may be all upper or all lower case and come back
/// lowercased, the form block explorers report them in.
pub fn validate_address(address: &str) -> Result<String, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    if BASE58_REGEX.is_match(address) {
        return Ok(address.to_string());
    }
    if BECH32_REGEX.is_match(address) && !is_mixed_case(address) {
        return Ok(address.to_ascii_lowercase());
    }
    Err(AddressError::Invalid(address.to_string()))
}

fn is_mixed_case(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_lowercase()) && s.chars().any(|c| c.is_ascii_uppercase())
}

/// Collect every unique address touched by `transactions`, in first-seen order.
///
/// Per transaction the first input's sender comes first, then every address of
/// every output.
pub fn extract_unique_addresses(transactions: &[Transaction]) -> Vec<String> {
    let mut addresses = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for tx in transactions {
        for address in tx.sender().into_iter().chain(tx.recipients()) {
            if seen.insert(address) {
                addresses.push(address.to_string());
            }
        }
    }

    addresses
}
