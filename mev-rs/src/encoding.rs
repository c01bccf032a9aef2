//! Strict `0x`-prefixed hex handling for configuration values and request paths.

use thiserror::Error;

const HEX_PREFIX: &str = "0x";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("empty hex string")]
    Empty,
    #[error("hex string without 0x prefix")]
    MissingPrefix,
    #[error("{0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected at least {expected} bytes but decoded {provided}")]
    TooShort { expected: usize, provided: usize },
    #[error("expected exactly {expected} bytes but decoded {provided}")]
    InvalidLength { expected: usize, provided: usize },
}

/// Decodes a `0x`-prefixed hex string.
pub fn decode_prefixed_hex(input: &str) -> Result<Vec<u8>, DecodeError> {
    if input.is_empty() {
        return Err(DecodeError::Empty)
    }
    let digits = input.strip_prefix(HEX_PREFIX).ok_or(DecodeError::MissingPrefix)?;
    hex::decode(digits).map_err(From::from)
}

/// Decodes a `0x`-prefixed hex string into exactly `N` bytes.
pub fn decode_prefixed_hex_exact<const N: usize>(input: &str) -> Result<[u8; N], DecodeError> {
    let bytes = decode_prefixed_hex(input)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| DecodeError::InvalidLength { expected: N, provided: bytes.len() })
}

/// Decodes a `0x`-prefixed hex string and keeps the first `N` bytes.
///
/// Inputs shorter than `N` bytes are rejected; any bytes past `N` are dropped.
pub fn decode_prefixed_hex_truncated<const N: usize>(input: &str) -> Result<[u8; N], DecodeError> {
    let bytes = decode_prefixed_hex(input)?;
    if bytes.len() < N {
        return Err(DecodeError::TooShort { expected: N, provided: bytes.len() })
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    Ok(out)
}

/// Matches `0x[a-fA-F0-9]+`.
pub fn is_prefixed_hex(input: &str) -> bool {
    match input.strip_prefix(HEX_PREFIX) {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Matches `[0-9]+`.
pub fn is_decimal(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_requires_prefix() {
        assert_eq!(decode_prefixed_hex(""), Err(DecodeError::Empty));
        assert_eq!(decode_prefixed_hex("02000000"), Err(DecodeError::MissingPrefix));
        assert_eq!(decode_prefixed_hex("0x02000000").unwrap(), vec![2, 0, 0, 0]);
        assert_eq!(decode_prefixed_hex("0x").unwrap(), Vec::<u8>::new());
        assert!(matches!(decode_prefixed_hex("0x123"), Err(DecodeError::Hex(_))));
        assert!(matches!(decode_prefixed_hex("0xzz"), Err(DecodeError::Hex(_))));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_prefixed_hex_truncated::<4>("0x01020304").unwrap(), [1, 2, 3, 4]);
        assert_eq!(decode_prefixed_hex_truncated::<4>("0x0102030405").unwrap(), [1, 2, 3, 4]);
        assert_eq!(
            decode_prefixed_hex_truncated::<4>("0x010203"),
            Err(DecodeError::TooShort { expected: 4, provided: 3 })
        );
    }

    #[test]
    fn test_decode_exact() {
        let root = format!("0x{}", "ab".repeat(32));
        assert_eq!(decode_prefixed_hex_exact::<32>(&root).unwrap(), [0xab; 32]);
        assert_eq!(
            decode_prefixed_hex_exact::<32>("0xabcd"),
            Err(DecodeError::InvalidLength { expected: 32, provided: 2 })
        );
    }

    #[test]
    fn test_patterns() {
        assert!(is_decimal("123"));
        assert!(!is_decimal("12a"));
        assert!(!is_decimal(""));
        assert!(is_prefixed_hex("0xabcDEF09"));
        assert!(!is_prefixed_hex("0x"));
        assert!(!is_prefixed_hex("abcdef"));
        assert!(!is_prefixed_hex("0xabcg"));
    }
}
