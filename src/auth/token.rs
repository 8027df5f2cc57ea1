//! Opaque bearer tokens
//!
//! Tokens carry no data; they are looked up in `auth_tokens` on every
//! authenticated request.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Random bytes per token; 30 bytes encode to 40 URL-safe characters
const TOKEN_BYTES: usize = 30;

/// Generate a fresh token key
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_keys_are_40_url_safe_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn token_keys_are_unique() {
        assert_ne!(generate_token_key(), generate_token_key());
    }
}
