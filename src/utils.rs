//! Hashing helpers for the binding dedup table.
//!
//! Binding keys are hashed by folding their components with a pairing
//! function. Arithmetic wraps, so large contractor identities (pointer values)
//! never overflow.

/// [Szudzik pairing function][szudzik-pairing], wrapping on overflow.
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// [Pairing function][pairing] for two `u64` values.
///
/// [pairing]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    pairing_szudzik(a, b)
}

/// Fold a sequence of values into one, starting from `seed`.
pub fn pairing_fold(seed: u64, values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(seed, pairing2)
}

pub trait MyHash {
    /// Hash used to pick a bucket. Equal values must hash equally.
    fn hash(&self) -> u64;
}
