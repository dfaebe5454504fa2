// src/lib.rs
//! Account control and resolution for a registry-backed DID method on StarkNet.
//!
//! - [`wallet::transaction_signer`] wraps calls in the account's signed
//!   `execute` envelope and submits them
//! - [`services::resolver`] builds DID Documents from the key registry
//! - [`services::identifier_provider`] deploys accounts and registers keys

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod wallet;

pub use error::DidError;
pub use models::did::{DidDocument, DidResolutionResult, KeyType};
pub use models::transaction::{Call, ContractAddress, Transaction, TransactionReceipt};
pub use services::resolver::DidResolver;
pub use wallet::transaction_signer::TransactionSigner;
