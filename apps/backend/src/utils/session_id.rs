//! Session id generation.
//!
//! Ids are 16 characters drawn uniformly from a fixed alphanumeric alphabet.
//! Uniqueness among live sessions is the registry's job: it regenerates
//! until an id is free.

use rand::Rng;

/// Fixed id alphabet. The repeated `z` is historical and kept so ids stay
/// compatible with links already handed out.
pub const ID_ALPHABET: &[u8] = b"abzdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const ID_LEN: usize = 16;

/// Generate a session id from the thread-local RNG.
pub fn generate_session_id() -> String {
    generate_session_id_with(&mut rand::rng())
}

/// Generate a session id from the given RNG.
pub fn generate_session_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut s = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        s.push(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char);
    }
    s
}

/// Whether `raw` could have come from [`generate_session_id`].
pub fn is_valid_session_id(raw: &str) -> bool {
    raw.len() == ID_LEN && raw.bytes().all(|b| ID_ALPHABET.contains(&b))
}
