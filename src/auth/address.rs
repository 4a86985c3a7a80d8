//! EVM address validation and normalization
//!
//! Addresses are `0x` + 40 hex characters. A mixed-case hex body must carry
//! a valid EIP-55 checksum; uniformly lower- or upper-case bodies are
//! accepted without one. Stored addresses are always lowercase.

use sha3::{Digest, Keccak256};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must be 42 characters, got {0}")]
    WrongLength(usize),

    #[error("address contains non-hex characters")]
    InvalidHex,

    #[error("address checksum is invalid")]
    BadChecksum,
}

/// Check whether a string is a syntactically valid EVM address.
pub fn is_valid_address(address: &str) -> bool {
    normalize_address(address).is_ok()
}

/// Validate an address and return its lowercase form.
pub fn normalize_address(address: &str) -> Result<String, AddressError> {
    let address = address.trim();
    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(AddressError::MissingPrefix);
    }
    if address.len() != 42 {
        return Err(AddressError::WrongLength(address.len()));
    }

    let body = &address[2..];
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex);
    }

    let all_lower = !body.chars().any(|c| c.is_ascii_uppercase());
    let all_upper = !body.chars().any(|c| c.is_ascii_lowercase());
    if !all_lower && !all_upper && !checksum_matches(body) {
        return Err(AddressError::BadChecksum);
    }

    Ok(format!("0x{}", body.to_lowercase()))
}

/// EIP-55: hash the lowercase hex body with Keccak-256; each alphabetic
/// character is uppercase iff the corresponding hash nibble is >= 8.
fn checksum_matches(body: &str) -> bool {
    let lower = body.to_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    body.chars().enumerate().all(|(i, c)| {
        if !c.is_ascii_alphabetic() {
            return true;
        }
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if nibble >= 8 {
            c.is_ascii_uppercase()
        } else {
            c.is_ascii_lowercase()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // EIP-55 reference vectors
    const CHECKSUMMED: &[&str] = &[
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_lowercase_address_is_valid() {
        assert!(is_valid_address(
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        ));
    }

    #[test]
    fn test_uppercase_address_is_valid() {
        assert!(is_valid_address(
            "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"
        ));
    }

    #[test]
    fn test_checksummed_addresses_are_valid() {
        for addr in CHECKSUMMED {
            assert!(is_valid_address(addr), "{addr} should validate");
        }
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Flip the case of one character in a checksummed address
        assert!(!is_valid_address(
            "0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        ));
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        assert_eq!(
            normalize_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!(normalize_address("0x1234"), Err(AddressError::WrongLength(6)));
        assert_eq!(
            normalize_address("0xzzzeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::InvalidHex)
        );
    }

    #[test]
    fn test_normalize_lowercases() {
        let normalized = normalize_address(CHECKSUMMED[0]).unwrap();
        assert_eq!(normalized, "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
    }
}
