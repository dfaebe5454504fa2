// src/utils/serialization.rs
//! Field-element codecs used on the contract boundary.
//!
//! Provides conversions for:
//! - Cairo short strings (ASCII packed big-endian into one felt)
//! - 256-bit integers split into two 128-bit limbs `(low, high)`
//! - Canonical decimal rendering of calldata for the gateway wire format

use crate::error::DidError;
use num_bigint::BigUint;
use starknet_crypto::FieldElement;

/// Maximum number of ASCII characters a single felt can carry.
pub const SHORT_STRING_MAX_LEN: usize = 31;

/// Encodes an ASCII string of at most 31 characters as a Cairo short string.
///
/// # Errors
/// Returns `InvalidFieldElement` if the string is non-ASCII or too long.
pub fn short_string_to_felt(value: &str) -> Result<FieldElement, DidError> {
    if !value.is_ascii() {
        return Err(DidError::InvalidFieldElement(format!(
            "short string `{}` is not ASCII",
            value
        )));
    }
    if value.len() > SHORT_STRING_MAX_LEN {
        return Err(DidError::InvalidFieldElement(format!(
            "short string `{}` exceeds {} characters",
            value, SHORT_STRING_MAX_LEN
        )));
    }

    let mut buffer = [0u8; 32];
    buffer[32 - value.len()..].copy_from_slice(value.as_bytes());
    FieldElement::from_bytes_be(&buffer)
        .map_err(|e| DidError::InvalidFieldElement(e.to_string()))
}

/// Decodes a Cairo short string.
///
/// Returns `None` when the felt is not a packed ASCII string: the top byte is set,
/// a zero byte follows a non-zero one, or a byte is outside the ASCII range.
/// Zero decodes to the empty string.
pub fn felt_to_short_string(felt: &FieldElement) -> Option<String> {
    let bytes = felt.to_bytes_be();
    if bytes[0] != 0 {
        return None;
    }

    let mut decoded = String::with_capacity(SHORT_STRING_MAX_LEN);
    for byte in bytes.into_iter().skip_while(|b| *b == 0) {
        if byte == 0 || !byte.is_ascii() {
            return None;
        }
        decoded.push(byte as char);
    }
    Some(decoded)
}

/// Converts a felt into an arbitrary precision unsigned integer.
pub fn felt_to_biguint(felt: &FieldElement) -> BigUint {
    BigUint::from_bytes_be(&felt.to_bytes_be())
}

/// Reassembles a 256-bit integer from its two 128-bit limbs: `high * 2^128 + low`.
pub fn u256_from_limbs(low: &FieldElement, high: &FieldElement) -> BigUint {
    (felt_to_biguint(high) << 128u32) + felt_to_biguint(low)
}

/// Splits a 256-bit integer into `(low, high)` 128-bit limbs.
///
/// # Errors
/// Returns `InvalidPublicKey` if the value does not fit in 256 bits.
pub fn u256_to_limbs(value: &BigUint) -> Result<(FieldElement, FieldElement), DidError> {
    if value.bits() > 256 {
        return Err(DidError::InvalidPublicKey(format!(
            "{:x} does not fit in 256 bits",
            value
        )));
    }

    let mask = (BigUint::from(1u8) << 128u32) - 1u8;
    let low = value & &mask;
    let high = value >> 128u32;
    Ok((biguint_to_felt(&low)?, biguint_to_felt(&high)?))
}

fn biguint_to_felt(value: &BigUint) -> Result<FieldElement, DidError> {
    FieldElement::from_byte_slice_be(&value.to_bytes_be())
        .map_err(|e| DidError::InvalidFieldElement(e.to_string()))
}

/// Parses a felt from `0x`-prefixed hex or a decimal string.
pub fn parse_felt(value: &str) -> Result<FieldElement, DidError> {
    value
        .parse::<FieldElement>()
        .map_err(|e| DidError::InvalidFieldElement(format!("`{}`: {}", value, e)))
}

/// Renders calldata as canonical decimal strings, the representation the
/// gateway expects inside `calldata` and `signature` arrays.
pub fn normalize_calldata(calldata: &[FieldElement]) -> Vec<String> {
    calldata.iter().map(|felt| felt.to_string()).collect()
}

/// Converts a felt holding a length or index into `u64`.
pub fn felt_to_u64(felt: &FieldElement) -> Option<u64> {
    u64::try_from(*felt).ok()
}
