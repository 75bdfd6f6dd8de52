//! Session token minting.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Raw entropy per session token
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Mint an opaque, cookie-safe session token from the thread-local CSPRNG
pub fn new_session_token() -> String {
    encode_random(SESSION_TOKEN_BYTES)
}

fn encode_random(len: usize) -> String {
    let mut raw = vec![0u8; len];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}
