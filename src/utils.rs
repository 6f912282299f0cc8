//! Utility functions for sizing and addressing the tables

/// Capacity used by `new()` on both tables.
pub const DEFAULT_CAPACITY: usize = 11;

/// Maximum load factor used by `new()` on both tables.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 1.0;

/// Returns true if `n` is prime.
///
/// Deterministic trial division: 2 and 3 are handled directly, multiples of 2 and 3 are
/// rejected, and the remaining candidates `6k - 1` and `6k + 1` are tried up to `sqrt(n)`.
#[must_use]
pub fn is_prime(n: usize) -> bool {
    if n <= 3 {
        return n > 1;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let mut divisor: usize = 5;
    while let Some(square) = divisor.checked_mul(divisor) {
        if square > n {
            break;
        }
        if n.checked_rem(divisor) == Some(0) ||
            n.checked_rem(divisor.saturating_add(2)) == Some(0)
        {
            return false;
        }
        divisor = divisor.saturating_add(6);
    }

    true
}

/// Returns the smallest prime that is greater than or equal to `n`, or 2 if `n <= 1`.
///
/// Inputs above the largest prime representable in `usize` return `usize::MAX`, which no
/// allocation can satisfy anyway.
#[must_use]
pub fn next_prime(n: usize) -> usize {
    (n.max(2)..=usize::MAX).find(|&candidate| is_prime(candidate)).unwrap_or(usize::MAX)
}

/// The capacity a table grows to from `current`: the next prime at or above twice as many.
pub(crate) fn grown_capacity(current: usize) -> usize {
    next_prime(current.saturating_mul(2))
}

/// Reduces a hash to an index in `0..slots`.
pub(crate) fn slot_index(hash: u64, slots: usize) -> usize {
    let modulus = u64::try_from(slots).unwrap_or(u64::MAX);
    hash.checked_rem(modulus).and_then(|index| usize::try_from(index).ok()).unwrap_or(0)
}

/// `len / capacity` as a float, zero for a table without slots.
#[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
pub(crate) fn ratio(len: usize, capacity: usize) -> f64 {
    if capacity == 0 { 0.0 } else { len as f64 / capacity as f64 }
}

/// Hashers with predictable slot placement for tests
#[cfg(test)]
pub(crate) mod test_hashers {
    use std::hash::{BuildHasher, Hasher};

    /// Hashes every key to zero
    pub(crate) struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    /// Hashes an integer key to itself
    pub(crate) struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for byte in bytes {
                self.0 = (self.0 << 8) | u64::from(*byte);
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    /// Every key collides
    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) struct Colliding;

    impl BuildHasher for Colliding {
        type Hasher = ZeroHasher;

        fn build_hasher(&self) -> ZeroHasher {
            ZeroHasher
        }
    }

    /// `u64` keys hash to themselves
    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) struct Identity;

    impl BuildHasher for Identity {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }
}
