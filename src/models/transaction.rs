// src/models/transaction.rs
//! Contract call and transaction data model.
//!
//! Everything here is an immutable value built fresh per invocation. The
//! transaction types mirror the sequencer gateway's `INVOKE_FUNCTION` and
//! `DEPLOY` payloads; wire encoding lives in the gateway client.

use crate::error::DidError;
use crate::utils::serialization::parse_felt;
use serde::{Deserialize, Serialize};
use starknet_crypto::FieldElement;
use std::fmt;
use std::str::FromStr;

/// Address of a contract or account on-chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractAddress(pub FieldElement);

impl ContractAddress {
    pub fn felt(&self) -> FieldElement {
        self.0
    }
}

impl From<FieldElement> for ContractAddress {
    fn from(felt: FieldElement) -> Self {
        ContractAddress(felt)
    }
}

impl FromStr for ContractAddress {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_felt(s).map(ContractAddress)
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A logical state-changing (or read) request against one contract entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub contract_address: ContractAddress,
    pub entry_point_selector: FieldElement,
    pub calldata: Vec<FieldElement>,
}

impl Call {
    pub fn new(
        contract_address: ContractAddress,
        entry_point_selector: FieldElement,
        calldata: Vec<FieldElement>,
    ) -> Self {
        Call {
            contract_address,
            entry_point_selector,
            calldata,
        }
    }
}

/// A signed `INVOKE_FUNCTION` transaction ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeTransaction {
    pub contract_address: ContractAddress,
    pub entry_point_selector: FieldElement,
    pub calldata: Vec<FieldElement>,
    pub signature: Vec<FieldElement>,
}

/// A raw contract deployment. Deployments are not nonce-gated and carry no
/// account signature.
#[derive(Clone, Debug, PartialEq)]
pub struct DeployTransaction {
    /// Compiled contract artifact (`program` + `entry_points_by_type` + `abi`)
    pub contract_definition: serde_json::Value,
    pub constructor_calldata: Vec<FieldElement>,
    pub contract_address_salt: FieldElement,
}

/// Logical transaction handed to the transaction signer.
#[derive(Clone, Debug, PartialEq)]
pub enum Transaction {
    /// A call the account must authorize; the signer wraps it in `execute`.
    Invoke(Call),
    Deploy(DeployTransaction),
}

/// Transaction in the exact shape the transport submits.
///
/// An invoke can only get here already wrapped and signed.
#[derive(Clone, Debug, PartialEq)]
pub enum RawTransaction {
    Invoke(InvokeTransaction),
    Deploy(DeployTransaction),
}

/// Gateway acknowledgement of a submitted transaction, returned unmodified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub code: String,
    pub transaction_hash: FieldElement,
    /// Present for deployments: the address of the new contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<FieldElement>,
}

/// Finality status as reported by the feeder gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotReceived,
    Received,
    Pending,
    AcceptedOnL2,
    AcceptedOnL1,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Whether the transaction will not change status anymore.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TransactionStatus::AcceptedOnL2
                | TransactionStatus::AcceptedOnL1
                | TransactionStatus::Rejected
        )
    }
}

/// Why the sequencer rejected a transaction, as the feeder gateway reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFailureReason {
    pub code: String,
    #[serde(default)]
    pub error_message: String,
}

/// Feeder gateway answer to a status query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusReport {
    pub tx_status: TransactionStatus,
    /// Present once the transaction is `REJECTED`
    #[serde(default)]
    pub tx_failure_reason: Option<TransactionFailureReason>,
}
