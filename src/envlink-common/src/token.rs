//! Secure random token generation.

use rand::Rng;

/// Number of random bytes behind every state token and exchange code.
pub const TOKEN_BYTES: usize = 24;

/// Generate `byte_len` cryptographically secure random bytes, hex-encoded.
///
/// Used for CLI session state on the client and exchange codes on the
/// server; both must be unguessable for the handoff to be safe.
pub fn secure_hex_token(byte_len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..byte_len).map(|_| rng.random()).collect();
    hex::encode(bytes)
}
