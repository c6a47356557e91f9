//! Forged anti-forgery tokens.
//!
//! Tokens are hex strings drawn from the OS CSPRNG: shaped like a real
//! session token but never equal to one. A failing entropy source is an
//! [`EntropyError`], which callers must treat as fatal for the whole run.

use std::num::NonZeroU32;

use rand_core::{OsRng, RngCore};

/// Byte length of forged anti-forgery tokens (40 hex characters).
pub const FORGED_TOKEN_BYTES: usize = 20;

/// The OS random source could not produce bytes.
#[derive(Debug, Clone, thiserror::Error)]
#[error("OS entropy source failed: {reason}")]
pub struct EntropyError {
    pub reason: String,
}

/// Hex-encode `len` bytes read from the OS random source.
pub fn secure_random_hex(len: usize) -> Result<String, EntropyError> {
    secure_random_hex_from(&mut OsRng, len)
}

/// Hex-encode `len` bytes read from `rng`.
pub fn secure_random_hex_from<R: RngCore + ?Sized>(
    rng: &mut R,
    len: usize,
) -> Result<String, EntropyError> {
    let mut buf = vec![0u8; len];
    rng.try_fill_bytes(&mut buf).map_err(|e| EntropyError {
        reason: e.to_string(),
    })?;
    Ok(buf.iter().map(|b| format!("{b:02x}")).collect())
}

/// A fresh forged anti-forgery token.
pub fn forged_csrf_token() -> Result<String, EntropyError> {
    forged_csrf_token_from(&mut OsRng)
}

/// A forged anti-forgery token drawn from `rng`.
pub fn forged_csrf_token_from<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, EntropyError> {
    secure_random_hex_from(rng, FORGED_TOKEN_BYTES)
}

/// Random source whose fallible draws always fail, as a starved OS source would.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
        Err(rand_core::Error::from(FAILING_RNG_CODE))
    }
}

const FAILING_RNG_CODE: NonZeroU32 = match NonZeroU32::new(rand_core::Error::CUSTOM_START) {
    Some(code) => code,
    None => panic!("custom error codes are non-zero"),
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn forged_token_is_forty_hex_chars() {
        let token = forged_csrf_token().unwrap();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn consecutive_tokens_differ() {
        let a = forged_csrf_token().unwrap();
        let b = forged_csrf_token().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn failing_source_is_an_entropy_error() {
        let err = forged_csrf_token_from(&mut FailingRng).unwrap_err();
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn seeded_source_is_deterministic_hex() {
        struct Counter(u8);
        impl RngCore for Counter {
            fn next_u32(&mut self) -> u32 {
                0
            }
            fn next_u64(&mut self) -> u64 {
                0
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                for b in dest {
                    *b = self.0;
                    self.0 = self.0.wrapping_add(1);
                }
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
                self.fill_bytes(dest);
                Ok(())
            }
        }
        assert_eq!(secure_random_hex_from(&mut Counter(0x0e), 3).unwrap(), "0e0f10");
    }

    #[test]
    fn zero_length_is_empty() {
        assert_eq!(secure_random_hex(0).unwrap(), "");
    }

    proptest! {
        #[test]
        fn hex_length_is_twice_byte_length(len in 0usize..128) {
            let token = secure_random_hex(len).unwrap();
            prop_assert_eq!(token.len(), len * 2);
            prop_assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
        }
    }
}
