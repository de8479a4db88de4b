use std::collections::HashSet;
use std::hash::Hash;

#[inline(always)]
pub fn square_f64(n: f64) -> f64 {
    n * n
}


const SEED_XOR: u128 = 0b10101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010101010;

/// Expands an integer seed into the 16 seed bytes expected by `XorShiftRng`.
/// Stable across platforms.
pub fn stable_seed_bytes(seed: u64) -> [u8; 16] {
    let mut val = 17u128;
    for byte in seed.to_le_bytes().iter() {
        val = 31u128.wrapping_mul(val).wrapping_add(*byte as u128);
        val ^= SEED_XOR;
    }
    val.to_le_bytes()
}

pub fn first_duplicate<'a, T, I>(iter: T) -> Option<&'a I> where T: Iterator<Item=&'a I>, I: Eq + Hash + 'a {
    let mut set = HashSet::<&'a I>::new();
    for item in iter {
        if !set.insert(item) {
            return Some(item);
        }
    }
    None
}
