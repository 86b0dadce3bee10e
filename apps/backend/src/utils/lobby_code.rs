//! Lobby code generation.
//!
//! Codes are short, shareable, upper-case strings from Crockford's Base32
//! alphabet, so they never contain the easily confused I, L, O or U. The
//! first character is always a letter.

use rand::Rng;

use crate::domain::rules::GENERATED_LOBBY_CODE_LEN;

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const LETTERS: &[u8] = b"ABCDEFGHJKMNPQRSTVWXYZ";

/// Generate a random lobby code of [`GENERATED_LOBBY_CODE_LEN`] characters.
pub fn generate_lobby_code() -> String {
    let mut rng = rand::rng();
    let lead = LETTERS[rng.random_range(0..LETTERS.len())] as char;
    std::iter::once(lead)
        .chain(
            (1..GENERATED_LOBBY_CODE_LEN)
                .map(|_| CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char),
        )
        .collect()
}
