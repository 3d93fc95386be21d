//! Seed parsing
//!
//! Callers may hand over seeds as text (for example from a URL or a save
//! record). Decimal integers map to themselves; any other text is hashed with
//! FNV-1a so that the same string always yields the same layout.

use crate::error::GenerateError;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a textual seed to a 64-bit value (FNV-1a)
pub fn hash_seed(text: &str) -> u64 {
    text.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Parse a textual seed
///
/// Accepts unsigned or signed decimal integers (negative values are
/// reinterpreted as their two's complement bits) and hashes anything else.
/// Empty or whitespace-only input is rejected.
pub fn parse_seed(text: &str) -> Result<u64, GenerateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerateError::InvalidSeed("seed text is empty".to_string()));
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value as u64);
    }
    Ok(hash_seed(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_seed() {
        assert_eq!(parse_seed("12345").unwrap(), 12345);
        assert_eq!(parse_seed("  42 ").unwrap(), 42);
        assert_eq!(parse_seed("-1").unwrap(), u64::MAX);
    }

    #[test]
    fn test_text_seed_is_hashed() {
        assert_eq!(parse_seed("alpha").unwrap(), hash_seed("alpha"));
        assert_ne!(hash_seed("alpha"), hash_seed("beta"));
    }

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(hash_seed(""), FNV_OFFSET_BASIS);
        assert_eq!(hash_seed("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_empty_seed_rejected() {
        assert!(matches!(parse_seed("   "), Err(GenerateError::InvalidSeed(_))));
    }
}
