// src/utils/crypto.rs
//! Hashing primitives that must match the on-chain account contract bit for bit.
//!
//! The account contract verifies signatures over a Pedersen hash chain of the
//! call fields. Field order and the trailing nonce are fixed by the contract;
//! the tests pin golden vectors for both.

use ethers_core::utils::keccak256;
use starknet_crypto::{pedersen_hash, FieldElement};

/// Keccak-256 of `data` truncated to 250 bits, as used for entry point selectors.
pub fn starknet_keccak(data: &[u8]) -> FieldElement {
    let mut hash = keccak256(data);
    // Clear the top six bits so the value is a valid felt
    hash[0] &= 0b0000_0011;

    let mut felt = FieldElement::ZERO;
    for byte in hash {
        felt = felt * FieldElement::from(256u16) + FieldElement::from(byte);
    }
    felt
}

/// Derives the entry point selector for a contract function name.
pub fn selector_from_name(name: &str) -> FieldElement {
    starknet_keccak(name.as_bytes())
}

/// Pedersen hash chain over `data`, terminated by the element count:
/// `h(h(...h(h(0, d0), d1)...), len)`.
pub fn compute_hash_on_elements(data: &[FieldElement]) -> FieldElement {
    let accumulated = data
        .iter()
        .fold(FieldElement::ZERO, |acc, item| pedersen_hash(&acc, item));
    pedersen_hash(&accumulated, &FieldElement::from(data.len()))
}

/// Computes the message hash an account contract verifies in `execute`.
///
/// # Arguments
/// * `account` - Address of the account contract signing the call
/// * `target` - Contract the account will call into
/// * `selector` - Entry point selector on `target`
/// * `calldata` - Arguments for the inner call, in order
/// * `nonce` - The account's current nonce
///
/// # Returns
/// `H([account, target, selector, H(calldata), nonce])` where `H` is
/// [`compute_hash_on_elements`].
pub fn compute_message_hash(
    account: &FieldElement,
    target: &FieldElement,
    selector: &FieldElement,
    calldata: &[FieldElement],
    nonce: &FieldElement,
) -> FieldElement {
    let calldata_hash = compute_hash_on_elements(calldata);
    compute_hash_on_elements(&[*account, *target, *selector, calldata_hash, *nonce])
}
