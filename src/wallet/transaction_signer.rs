// src/wallet/transaction_signer.rs
//! Account-abstraction transaction signing.
//!
//! A call is authorized by wrapping it in the account's `execute` entry point
//! together with the current nonce and a signature over the message hash. The
//! wrapping moves through explicit stages:
//!
//! ```text
//! UnsignedInvoke --with_nonce--> HashedInvoke --sign--> SignedInvoke --into_transaction--> InvokeTransaction
//! ```
//!
//! Stage fields are private, so an `execute` envelope can only be obtained from
//! a signature computed over that exact call and nonce.
//!
//! Submissions for one account must be serialized by the caller. Two concurrent
//! `submit` calls read the same nonce and only one of them can be accepted.

use crate::blockchain::transport::ContractTransport;
use crate::contracts::account::{execute_calldata, AccountContract, EXECUTE};
use crate::error::DidError;
use crate::models::transaction::{
    Call, ContractAddress, InvokeTransaction, RawTransaction, Transaction, TransactionReceipt,
};
use crate::utils::crypto::{compute_message_hash, selector_from_name};
use crate::wallet::signer::{MessageSigner, Signature};
use log::{debug, info};
use starknet_crypto::FieldElement;
use std::sync::Arc;

/// A call waiting for the account's nonce.
#[derive(Clone, Debug)]
pub struct UnsignedInvoke {
    account: ContractAddress,
    call: Call,
}

impl UnsignedInvoke {
    pub fn new(account: ContractAddress, call: Call) -> Self {
        UnsignedInvoke { account, call }
    }

    /// Binds the nonce and computes the message hash.
    pub fn with_nonce(self, nonce: FieldElement) -> HashedInvoke {
        let message_hash = compute_message_hash(
            &self.account.felt(),
            &self.call.contract_address.felt(),
            &self.call.entry_point_selector,
            &self.call.calldata,
            &nonce,
        );
        HashedInvoke {
            account: self.account,
            call: self.call,
            nonce,
            message_hash,
        }
    }
}

/// A call bound to a nonce, with its message hash.
#[derive(Clone, Debug)]
pub struct HashedInvoke {
    account: ContractAddress,
    call: Call,
    nonce: FieldElement,
    message_hash: FieldElement,
}

impl HashedInvoke {
    pub fn message_hash(&self) -> FieldElement {
        self.message_hash
    }

    pub fn nonce(&self) -> FieldElement {
        self.nonce
    }

    /// Obtains a signature over the message hash.
    ///
    /// Awaited without a timeout; the signer may take as long as it needs.
    pub async fn sign<S>(self, signer: &S) -> Result<SignedInvoke, DidError>
    where
        S: MessageSigner + ?Sized,
    {
        let signature = signer.sign_hash(&self.message_hash).await?;
        Ok(SignedInvoke {
            hashed: self,
            signature,
        })
    }
}

/// A call with a signature bound to one nonce.
#[derive(Clone, Debug)]
pub struct SignedInvoke {
    hashed: HashedInvoke,
    signature: Signature,
}

impl SignedInvoke {
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Wraps the call into the account's `execute` transaction.
    pub fn into_transaction(self) -> InvokeTransaction {
        let HashedInvoke {
            account,
            call,
            nonce,
            ..
        } = self.hashed;
        InvokeTransaction {
            contract_address: account,
            entry_point_selector: selector_from_name(EXECUTE),
            calldata: execute_calldata(&call, &nonce),
            signature: self.signature.to_vec(),
        }
    }
}

/// Authorizes and submits transactions on behalf of one account contract.
///
/// Holds no mutable state: the nonce is read from the account before every
/// transaction and never cached.
#[derive(Clone)]
pub struct TransactionSigner {
    account: AccountContract,
    transport: Arc<dyn ContractTransport>,
    signer: Arc<dyn MessageSigner>,
}

impl TransactionSigner {
    /// Creates a signer for the account at `account_address`.
    ///
    /// # Arguments
    /// * `transport` - Chain transport used for the nonce read and submission
    /// * `account_address` - Account contract the transactions originate from
    /// * `signer` - Capability signing message hashes for that account
    pub fn new(
        transport: Arc<dyn ContractTransport>,
        account_address: ContractAddress,
        signer: Arc<dyn MessageSigner>,
    ) -> Self {
        TransactionSigner {
            account: AccountContract::new(transport.clone(), account_address),
            transport,
            signer,
        }
    }

    pub fn account_address(&self) -> ContractAddress {
        self.account.address()
    }

    /// Submits a transaction.
    ///
    /// Deployments are forwarded as is, without nonce or signature. An invoke
    /// goes through: nonce read, message hash, signature, `execute` envelope,
    /// submission. Exactly one nonce-consuming transaction is submitted when this
    /// returns `Ok`.
    ///
    /// # Returns
    /// The gateway receipt, unmodified.
    ///
    /// # Errors
    /// - `Transport` if the nonce read or the submission cannot reach the chain
    /// - `Signing` if the signing capability fails
    /// - `SubmissionRejected` if the gateway or account rejects the transaction
    ///
    /// Nothing is retried; a retry must call `submit` again so the nonce is
    /// read afresh.
    pub async fn submit(&self, transaction: Transaction) -> Result<TransactionReceipt, DidError> {
        match transaction {
            Transaction::Deploy(deploy) => {
                debug!("forwarding deployment without account signature");
                self.transport
                    .add_transaction(&RawTransaction::Deploy(deploy))
                    .await
            }
            Transaction::Invoke(call) => self.invoke(call).await,
        }
    }

    /// Authorizes `call` through the account's `execute` entry point and submits it.
    pub async fn invoke(&self, call: Call) -> Result<TransactionReceipt, DidError> {
        let nonce = self.account.get_nonce().await?;
        debug!("account {} nonce {}", self.account.address(), nonce);

        let hashed = UnsignedInvoke::new(self.account.address(), call).with_nonce(nonce);
        debug!("message hash {:#x}", hashed.message_hash());

        let signed = hashed.sign(self.signer.as_ref()).await?;
        let envelope = signed.into_transaction();

        let receipt = self
            .transport
            .add_transaction(&RawTransaction::Invoke(envelope))
            .await?;
        info!(
            "account {} submitted transaction {:#x} ({})",
            self.account.address(),
            receipt.transaction_hash,
            receipt.code
        );
        Ok(receipt)
    }
}
