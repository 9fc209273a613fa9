//! Randomized value helpers
//!
//! Used for verification secret codes and for test fixtures.

use rand::Rng;

use crate::currency;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Random integer in `min..=max`
pub fn random_int(min: i64, max: i64) -> i64 {
    rand::thread_rng().gen_range(min..=max)
}

/// Random lowercase string of length `n`
pub fn random_string(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Random account owner name
pub fn random_owner() -> String {
    random_string(6)
}

/// Random money amount in minor units
pub fn random_money() -> i64 {
    random_int(0, 1000)
}

/// Random supported currency code
pub fn random_currency() -> String {
    let idx = rand::thread_rng().gen_range(0..currency::ALL.len());
    currency::ALL[idx].to_string()
}

/// Random email address
pub fn random_email() -> String {
    format!("{}@email.com", random_string(6))
}
