//! Id generation.
//!
//! Memory ids are short opaque strings (§3: "8-character lowercase
//! alphanumeric id"), distinct from the `uuid`-based ids used for
//! sessions and lessons where the source system's original format does
//! not matter to the spec.

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// An 8-character lowercase alphanumeric memory id (§4.5).
///
/// Draws randomness from a v4 UUID's bytes rather than pulling in a
/// dedicated `rand` dependency, since `uuid` is already part of the
/// dependency stack.
pub fn new_memory_id() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    bytes.iter().take(8).map(|b| ALPHABET[(*b as usize) % ALPHABET.len()] as char).collect()
}

/// A UUID-v4 id for entities the spec does not constrain the shape of
/// (sessions, lessons, goals, typed edges).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
