// src/contracts/account.rs
//! Account contract interface.
//!
//! The account contract owns the nonce and verifies every `execute` call
//! against a signature over the message hash. This module only knows its
//! surface: `get_nonce()` and the `execute` calldata layout.

use crate::blockchain::transport::ContractTransport;
use crate::error::DidError;
use crate::models::transaction::{Call, ContractAddress};
use crate::utils::crypto::selector_from_name;
use starknet_crypto::FieldElement;
use std::sync::Arc;

pub const GET_NONCE: &str = "get_nonce";
pub const EXECUTE: &str = "execute";

/// Read access to one account contract.
#[derive(Clone)]
pub struct AccountContract {
    address: ContractAddress,
    transport: Arc<dyn ContractTransport>,
}

impl AccountContract {
    pub fn new(transport: Arc<dyn ContractTransport>, address: ContractAddress) -> Self {
        AccountContract { address, transport }
    }

    pub fn address(&self) -> ContractAddress {
        self.address
    }

    /// Reads the account's current nonce.
    ///
    /// Always a fresh network round trip; callers must not cache the value
    /// across transactions.
    ///
    /// # Errors
    /// - `Transport` if the call fails
    /// - `MalformedResponse` if the contract returns no value
    pub async fn get_nonce(&self) -> Result<FieldElement, DidError> {
        let call = Call::new(self.address, selector_from_name(GET_NONCE), Vec::new());
        let result = self.transport.call_contract(&call).await?;
        result
            .first()
            .copied()
            .ok_or_else(|| DidError::malformed(GET_NONCE, "empty result"))
    }
}

/// Builds the `execute` calldata wrapping `call`:
/// `[target, selector, argc, ...args, nonce]`.
pub fn execute_calldata(call: &Call, nonce: &FieldElement) -> Vec<FieldElement> {
    let mut calldata = Vec::with_capacity(call.calldata.len() + 4);
    calldata.push(call.contract_address.felt());
    calldata.push(call.entry_point_selector);
    calldata.push(FieldElement::from(call.calldata.len()));
    calldata.extend_from_slice(&call.calldata);
    calldata.push(*nonce);
    calldata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_calldata_layout() {
        let call = Call::new(
            ContractAddress(FieldElement::from(0xabcu64)),
            FieldElement::from(0x55u64),
            vec![FieldElement::from(1u64), FieldElement::from(2u64), FieldElement::from(3u64)],
        );
        let calldata = execute_calldata(&call, &FieldElement::from(9u64));
        assert_eq!(
            calldata,
            vec![
                FieldElement::from(0xabcu64),
                FieldElement::from(0x55u64),
                FieldElement::from(3u64),
                FieldElement::from(1u64),
                FieldElement::from(2u64),
                FieldElement::from(3u64),
                FieldElement::from(9u64),
            ]
        );
    }

    #[test]
    fn execute_calldata_without_arguments() {
        let call = Call::new(ContractAddress(FieldElement::ONE), FieldElement::TWO, Vec::new());
        assert_eq!(
            execute_calldata(&call, &FieldElement::ZERO),
            vec![FieldElement::ONE, FieldElement::TWO, FieldElement::ZERO, FieldElement::ZERO]
        );
    }
}
