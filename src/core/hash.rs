//! State Hashing for Verification
//!
//! Provides deterministic hashing of user state for:
//! - Integrity checks on snapshots handed to the sync collaborator
//! - Replay validation (same seed + same taps = same hash)

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Integers fed to a [`StateHasher`], encoded little-endian.
pub trait HashWord: Copy {
    /// Append the little-endian encoding to `hasher`.
    fn feed(self, hasher: &mut Sha256);
}

macro_rules! impl_hash_word {
    ($($t:ty),*) => {
        $(impl HashWord for $t {
            #[inline]
            fn feed(self, hasher: &mut Sha256) {
                hasher.update(self.to_le_bytes());
            }
        })*
    };
}

impl_hash_word!(u8, u32, u64, u128, i32);

/// Deterministic hasher for user state.
///
/// Field order is part of the format.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Hasher seeded with a domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Hasher for user state.
    pub fn for_user_state() -> Self {
        Self::new(b"TAP_ECONOMY_STATE_V1")
    }

    /// Append one integer field.
    #[inline]
    pub fn word<W: HashWord>(&mut self, value: W) {
        value.feed(&mut self.hasher);
    }

    /// Append an optional field behind a presence byte, so `None` and
    /// `Some(0)` differ.
    #[inline]
    pub fn opt_word<W: HashWord>(&mut self, value: Option<W>) {
        match value {
            Some(v) => {
                self.word(1u8);
                self.word(v);
            }
            None => self.word(0u8),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash of a user's state: domain, owner id, then whatever `add_state`
/// appends.
pub fn compute_state_hash<F>(user_id: &[u8; 16], add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_user_state();

    // Owner first
    hasher.hasher.update(user_id);

    add_state(&mut hasher);

    hasher.finalize()
}

/// Short hex prefix of a hash for log lines.
pub fn short_hex(hash: &StateHash) -> String {
    hex::encode(&hash[..6])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_user_state();
            hasher.word(100u32);
            hasher.word(12345u64);
            hasher.word(u128::MAX);
            hasher.opt_word(Some(5u64));
            hasher.opt_word(Some(-3i32));
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.word(1u32);
            h.word(2u32);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.word(2u32);
            h.word(1u32);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_option_tagging() {
        let none = {
            let mut h = StateHasher::new(b"test");
            h.opt_word(None::<u64>);
            h.finalize()
        };
        let zero = {
            let mut h = StateHasher::new(b"test");
            h.opt_word(Some(0u64));
            h.finalize()
        };
        assert_ne!(none, zero);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = hash_with_domain(b"DOMAIN_A", &data);
        let hash2 = hash_with_domain(b"DOMAIN_B", &data);

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_compute_state_hash() {
        let user = [7u8; 16];
        let hash = compute_state_hash(&user, |hasher| hasher.word(500u128));
        let hash2 = compute_state_hash(&user, |hasher| hasher.word(500u128));
        assert_eq!(hash, hash2);

        let other_user = compute_state_hash(&[8u8; 16], |hasher| hasher.word(500u128));
        assert_ne!(hash, other_user);

        assert_eq!(short_hex(&hash).len(), 12);
    }
}
