// src/common/id_generator.rs
//! Identifier and secret generation
//!
//! Record IDs use Crockford Base32 with an entity prefix (e.g. `U_K7NP3X`).
//! Session IDs and OAuth state values are long random strings that are never
//! shown to users, so they skip the prefix and use a wider alphabet.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of the anti-forgery `state` value sent to the authorization server
pub const STATE_TOKEN_LENGTH: usize = 32;

/// Length of the opaque session identifier stored in the session cookie
pub const SESSION_ID_LENGTH: usize = 48;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Local user record (U_)
    User,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
        }
    }
}

fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

fn generate_alphanumeric_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate a prefixed ID, e.g. `U_8MWQT2`
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

/// Generate a User ID (U_XXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a fresh OAuth `state` value
pub fn generate_state_token() -> String {
    generate_alphanumeric_string(STATE_TOKEN_LENGTH)
}

/// Generate a fresh session identifier
pub fn generate_session_id() -> String {
    generate_alphanumeric_string(SESSION_ID_LENGTH)
}
