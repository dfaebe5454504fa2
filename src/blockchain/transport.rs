// src/blockchain/transport.rs
//! Contract read/invoke transport abstraction.
//!
//! The signing and resolution paths only ever need two primitives from the
//! chain: a read-only contract call and a transaction submission.

use crate::error::DidError;
use crate::models::transaction::{Call, RawTransaction, TransactionReceipt};
use async_trait::async_trait;
use starknet_crypto::FieldElement;

/// Generic contract-call transport.
///
/// Implementations must surface network failures as [`DidError::Transport`] and
/// remote rejections of submitted transactions as
/// [`DidError::SubmissionRejected`], never retrying on their own.
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Executes a read-only call and returns the raw result felts.
    async fn call_contract(&self, call: &Call) -> Result<Vec<FieldElement>, DidError>;

    /// Submits a transaction and returns the gateway receipt unmodified.
    async fn add_transaction(&self, transaction: &RawTransaction)
        -> Result<TransactionReceipt, DidError>;
}
