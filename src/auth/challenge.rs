//! Sign-in challenge construction
//!
//! The challenge text is an external contract: wallet clients must sign it
//! byte-for-byte. It depends only on the address and the account's current
//! nonce, so issuing the challenge and verifying the signature can happen
//! arbitrarily far apart without drift (barring a nonce rotation in between).

/// Render the canonical sign-in message for an address and nonce.
pub fn build_challenge(address: &str, nonce: i64) -> String {
    format!(
        "Welcome to Driftmarket!\n\
         \n\
         Click to sign in and accept the Driftmarket Terms of Service.\n\
         \n\
         This request will not trigger a blockchain transaction or cost any gas fees.\n\
         \n\
         Your authentication status will reset after 24 hours.\n\
         \n\
         Wallet address: {address}\n\
         \n\
         Nonce: {nonce}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    #[test]
    fn test_challenge_is_deterministic() {
        assert_eq!(build_challenge(ADDRESS, 42), build_challenge(ADDRESS, 42));
    }

    #[test]
    fn test_challenge_embeds_address_and_nonce() {
        let message = build_challenge(ADDRESS, 42);
        assert!(message.contains(&format!("Wallet address: {ADDRESS}")));
        assert!(message.contains("Nonce: 42"));
    }

    #[test]
    fn test_challenge_changes_with_nonce() {
        assert_ne!(build_challenge(ADDRESS, 42), build_challenge(ADDRESS, 43));
    }

    #[test]
    fn test_challenge_exact_text() {
        let message = build_challenge("0xabc", 7);
        let expected = "Welcome to Driftmarket!\n\n\
             Click to sign in and accept the Driftmarket Terms of Service.\n\n\
             This request will not trigger a blockchain transaction or cost any gas fees.\n\n\
             Your authentication status will reset after 24 hours.\n\n\
             Wallet address: 0xabc\n\n\
             Nonce: 7";
        assert_eq!(message, expected);
    }
}
