//! EIP-191 personal-signature verification
//!
//! Recovers the signer address from a `personal_sign` signature over a
//! plain-text message and compares it, case-insensitively, to the claimed
//! address.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Errors that can occur during signature verification
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureFormat(String),

    #[error("signature must be 65 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("signer recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("recovered signer {recovered} does not match {expected}")]
    SignerMismatch { expected: String, recovered: String },
}

/// Compute a Keccak-256 hash.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a message the way `personal_sign` does:
/// `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`.
pub fn eip191_hash(message: &str) -> [u8; 32] {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

/// Recover the lowercase `0x`-prefixed signer address from a 65-byte
/// `(r, s, v)` signature over a prehashed message.
pub fn recover_address(message_hash: &[u8; 32], signature: &[u8; 65]) -> Result<String, CryptoError> {
    // v is encoded as 0/1 by some clients and 27/28 by others
    let v = signature[64];
    let v = if v >= 27 { v - 27 } else { v };
    if v > 1 {
        return Err(CryptoError::InvalidRecoveryId(signature[64]));
    }
    let recovery_id =
        RecoveryId::try_from(v).map_err(|_| CryptoError::InvalidRecoveryId(signature[64]))?;

    let sig = Signature::try_from(&signature[..64])
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    let verifying_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    // Address = last 20 bytes of keccak256(uncompressed pubkey minus the 0x04 tag)
    let public_key = verifying_key.to_encoded_point(false);
    let hash = keccak256(&public_key.as_bytes()[1..]);

    Ok(format!("0x{}", hex::encode(&hash[12..])))
}

/// Verify a `personal_sign` signature over `message` against the claimed
/// address. The signature is hex-encoded, with or without a `0x` prefix.
pub fn verify_personal_signature(
    address: &str,
    message: &str,
    signature: &str,
) -> Result<(), CryptoError> {
    let sig_hex = signature.strip_prefix("0x").unwrap_or(signature);
    let sig_bytes =
        hex::decode(sig_hex).map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    if sig_bytes.len() != 65 {
        return Err(CryptoError::InvalidSignatureLength(sig_bytes.len()));
    }
    let mut sig_array = [0u8; 65];
    sig_array.copy_from_slice(&sig_bytes);

    let message_hash = eip191_hash(message);
    let recovered = recover_address(&message_hash, &sig_array)?;

    // Chain addresses are case-insensitive under hex encoding; claimed
    // addresses may carry EIP-55 mixed-case formatting
    if recovered.to_lowercase() != address.to_lowercase() {
        return Err(CryptoError::SignerMismatch {
            expected: address.to_string(),
            recovered,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    /// Sign a message with a fixed key, returning the address and hex signature.
    fn sign_message(key_byte: u8, message: &str) -> (String, String) {
        let signing_key = SigningKey::from_slice(&[key_byte; 32]).unwrap();
        let hash = eip191_hash(message);
        let (sig, recovery_id) = signing_key.sign_prehash_recoverable(&hash).unwrap();

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = recovery_id.to_byte();

        let verifying_key = VerifyingKey::from(&signing_key);
        let public_key = verifying_key.to_encoded_point(false);
        let addr_hash = keccak256(&public_key.as_bytes()[1..]);
        let address = format!("0x{}", hex::encode(&addr_hash[12..]));

        (address, hex::encode(bytes))
    }

    #[test]
    fn test_keccak256_known_vector() {
        let hash = keccak256(b"hello world");
        assert_eq!(
            hex::encode(hash),
            "47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad"
        );
    }

    #[test]
    fn test_eip191_prefix_includes_length() {
        let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", 5, "hello");
        assert_eq!(eip191_hash("hello"), keccak256(prefixed.as_bytes()));
    }

    #[test]
    fn test_sign_and_recover_round_trip() {
        let (address, signature) = sign_message(0x42, "I am signing this");
        assert!(verify_personal_signature(&address, "I am signing this", &signature).is_ok());
    }

    #[test]
    fn test_verification_is_case_insensitive() {
        let (address, signature) = sign_message(0x42, "case test");
        let upper = address.to_uppercase().replace("0X", "0x");
        assert!(verify_personal_signature(&upper, "case test", &signature).is_ok());
    }

    #[test]
    fn test_accepts_0x_prefixed_signature() {
        let (address, signature) = sign_message(0x42, "prefixed");
        let prefixed = format!("0x{signature}");
        assert!(verify_personal_signature(&address, "prefixed", &prefixed).is_ok());
    }

    #[test]
    fn test_accepts_legacy_v_encoding() {
        let (address, signature) = sign_message(0x42, "legacy v");
        let mut bytes = hex::decode(&signature).unwrap();
        bytes[64] += 27;
        assert!(verify_personal_signature(&address, "legacy v", &hex::encode(bytes)).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let (address, signature) = sign_message(0x42, "the real message");
        let err = verify_personal_signature(&address, "a different message", &signature);
        assert!(err.is_err());
    }

    #[test]
    fn test_wrong_signer_fails() {
        let (_, signature) = sign_message(0x42, "message");
        let (other_address, _) = sign_message(0x43, "message");
        let err = verify_personal_signature(&other_address, "message", &signature).unwrap_err();
        assert!(matches!(err, CryptoError::SignerMismatch { .. }));
    }

    #[test]
    fn test_rejects_bad_signature_lengths() {
        let (address, _) = sign_message(0x42, "m");
        let err = verify_personal_signature(&address, "m", "0x1234").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignatureLength(2)));

        let err = verify_personal_signature(&address, "m", "not hex at all").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSignatureFormat(_)));
    }

    #[test]
    fn test_rejects_invalid_recovery_id() {
        let (address, signature) = sign_message(0x42, "m");
        let mut bytes = hex::decode(&signature).unwrap();
        bytes[64] = 9;
        let err = verify_personal_signature(&address, "m", &hex::encode(bytes)).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidRecoveryId(9)));
    }
}
