//! Pairing code generation
//!
//! Codes are short numeric strings a participant types to join a session.

use rand::Rng;

/// Number of digits in a pairing code
pub const CODE_LENGTH: usize = 6;

/// Generates a uniformly random 6-digit pairing code using the thread rng
pub fn generate_code() -> String {
    generate_code_with(&mut rand::rng())
}

/// Generates a pairing code from the supplied random source
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(100_000..=999_999).to_string()
}

/// Checks that `code` has the shape of a pairing code: exactly six ASCII digits
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
