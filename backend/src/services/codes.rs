//! Short alphabetic access codes.

use uuid::Uuid;

/// Length of the code printed on a form.
pub const FORM_CODE_LEN: usize = 6;
/// Length of a per-recipient invitation code.
pub const INVITATION_CODE_LEN: usize = 8;
pub const MAX_CODE_LEN: usize = 32;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Largest multiple of 26 below 256; bytes at or above it are rejected.
const REJECT_FROM: u8 = 234;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("Code length must be between 1 and {max}, got {requested}")]
    InvalidLength { requested: usize, max: usize },
}

/// Random code of `len` uppercase ASCII letters.
pub fn generate_alpha_code(len: usize) -> Result<String, CodeError> {
    if len == 0 || len > MAX_CODE_LEN {
        return Err(CodeError::InvalidLength {
            requested: len,
            max: MAX_CODE_LEN,
        });
    }

    let mut code = String::with_capacity(len);
    while code.len() < len {
        for byte in random_bytes() {
            if byte < REJECT_FROM {
                code.push(char::from(ALPHABET[usize::from(byte % 26)]));
                if code.len() == len {
                    break;
                }
            }
        }
    }
    Ok(code)
}

/// Random bytes from a v4 UUID, skipping the version and variant bytes.
fn random_bytes() -> impl Iterator<Item = u8> {
    Uuid::new_v4()
        .into_bytes()
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != 6 && *i != 8)
        .map(|(_, b)| b)
}

/// Uppercases and keeps only `A-Z`, so `" ab-c d "` becomes `"ABCD"`.
pub fn normalize_code(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_have_requested_shape() {
        for len in [1, FORM_CODE_LEN, INVITATION_CODE_LEN, MAX_CODE_LEN] {
            let code = generate_alpha_code(len).unwrap();
            assert_eq!(code.len(), len);
            assert!(code.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_invalid_lengths_rejected() {
        assert!(generate_alpha_code(0).is_err());
        assert!(generate_alpha_code(MAX_CODE_LEN + 1).is_err());
    }

    #[test]
    fn test_codes_vary() {
        let codes: HashSet<String> = (0..50)
            .map(|_| generate_alpha_code(INVITATION_CODE_LEN).unwrap())
            .collect();
        assert!(codes.len() > 45);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" ab-c d "), "ABCD");
        assert_eq!(normalize_code("QW3RTY"), "QWRTY");
        assert_eq!(normalize_code("123"), "");
    }
}
