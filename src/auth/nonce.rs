//! Sign-in nonce generation
//!
//! Randomness is injected through a trait so tests can supply deterministic
//! nonces.

use rand::Rng;

/// Upper bound (exclusive) for generated nonces.
pub const NONCE_RANGE: i64 = 1_000_000_000;

/// Source of sign-in nonces.
pub trait NonceSource: Send + Sync {
    /// Produce a fresh nonce in `[0, NONCE_RANGE)`.
    fn next_nonce(&self) -> i64;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default, Clone)]
pub struct ThreadRngNonceSource;

impl NonceSource for ThreadRngNonceSource {
    fn next_nonce(&self) -> i64 {
        rand::thread_rng().gen_range(0..NONCE_RANGE)
    }
}

/// Pick a replacement nonce guaranteed to differ from the current one.
pub fn rotated_nonce(source: &dyn NonceSource, current: i64) -> i64 {
    let next = source.next_nonce();
    if next == current {
        (next + 1) % NONCE_RANGE
    } else {
        next
    }
}

#[cfg(test)]
pub mod testing {
    use super::NonceSource;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Deterministic source counting up from a seed.
    pub struct SequentialNonceSource(AtomicI64);

    impl SequentialNonceSource {
        pub fn new(start: i64) -> Self {
            Self(AtomicI64::new(start))
        }
    }

    impl NonceSource for SequentialNonceSource {
        fn next_nonce(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    /// Source that always returns the same value.
    pub struct FixedNonceSource(pub i64);

    impl NonceSource for FixedNonceSource {
        fn next_nonce(&self) -> i64 {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FixedNonceSource, SequentialNonceSource};
    use super::*;

    #[test]
    fn test_thread_rng_nonce_in_range() {
        let source = ThreadRngNonceSource;
        for _ in 0..100 {
            let nonce = source.next_nonce();
            assert!((0..NONCE_RANGE).contains(&nonce));
        }
    }

    #[test]
    fn test_rotation_never_repeats_current() {
        let fixed = FixedNonceSource(42);
        assert_eq!(rotated_nonce(&fixed, 42), 43);
        assert_eq!(rotated_nonce(&fixed, 7), 42);
    }

    #[test]
    fn test_rotation_wraps_at_range() {
        let fixed = FixedNonceSource(NONCE_RANGE - 1);
        assert_eq!(rotated_nonce(&fixed, NONCE_RANGE - 1), 0);
    }

    #[test]
    fn test_sequential_source() {
        let seq = SequentialNonceSource::new(10);
        assert_eq!(seq.next_nonce(), 10);
        assert_eq!(seq.next_nonce(), 11);
    }
}
