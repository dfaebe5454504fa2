// src/blockchain/gateway_client.rs
//! StarkNet sequencer gateway client implementation.
//!
//! Provides the HTTP transport behind [`ContractTransport`]:
//! - Read-only contract calls through the feeder gateway
//! - Transaction submission (`INVOKE_FUNCTION` and `DEPLOY`) through the gateway
//! - Transaction status polling, invoked separately by callers that need finality

use crate::blockchain::transport::ContractTransport;
use crate::error::DidError;
use crate::models::transaction::{
    Call, DeployTransaction, InvokeTransaction, RawTransaction, TransactionReceipt,
    TransactionStatus, TransactionStatusReport,
};
use crate::utils::serialization::normalize_calldata;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use starknet_crypto::FieldElement;
use std::time::Duration;

/// Gateway response code for an accepted submission.
pub const TRANSACTION_RECEIVED: &str = "TRANSACTION_RECEIVED";

#[derive(Serialize)]
struct CallContractRequest {
    contract_address: String,
    entry_point_selector: String,
    calldata: Vec<String>,
    signature: Vec<String>,
}

#[derive(Deserialize)]
struct CallContractResponse {
    result: Vec<FieldElement>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum AddTransactionRequest {
    #[serde(rename = "INVOKE_FUNCTION")]
    InvokeFunction {
        contract_address: String,
        entry_point_selector: String,
        calldata: Vec<String>,
        signature: Vec<String>,
    },
    #[serde(rename = "DEPLOY")]
    Deploy {
        contract_address_salt: String,
        constructor_calldata: Vec<String>,
        contract_definition: serde_json::Value,
    },
}

impl From<&InvokeTransaction> for AddTransactionRequest {
    fn from(tx: &InvokeTransaction) -> Self {
        AddTransactionRequest::InvokeFunction {
            contract_address: tx.contract_address.to_string(),
            entry_point_selector: format!("{:#x}", tx.entry_point_selector),
            calldata: normalize_calldata(&tx.calldata),
            signature: normalize_calldata(&tx.signature),
        }
    }
}

impl From<&DeployTransaction> for AddTransactionRequest {
    fn from(tx: &DeployTransaction) -> Self {
        AddTransactionRequest::Deploy {
            contract_address_salt: format!("{:#x}", tx.contract_address_salt),
            constructor_calldata: normalize_calldata(&tx.constructor_calldata),
            contract_definition: tx.contract_definition.clone(),
        }
    }
}

/// Error body the gateway returns with non-2xx statuses.
#[derive(Deserialize)]
struct GatewayErrorBody {
    code: String,
    message: String,
}


/// HTTP client for the StarkNet sequencer gateway.
///
/// The client is cheap to clone: clones share the underlying connection pool.
/// It imposes no timeouts of its own; pass a configured `reqwest::Client` to
/// [`GatewayClient::with_http_client`] to set one.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    /// Base URL without trailing slash, e.g. `https://alpha4.starknet.io`
    base_url: String,
}

impl GatewayClient {
    /// Creates a new gateway client.
    ///
    /// # Arguments
    /// * `base_url` - Gateway root; `/gateway` and `/feeder_gateway` are appended
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client around an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Self {
        GatewayClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queries the finality status of a submitted transaction.
    ///
    /// # Arguments
    /// * `transaction_hash` - Hash from a [`TransactionReceipt`]
    ///
    /// # Returns
    /// The status, with the gateway's failure reason for a rejected transaction.
    ///
    /// # Errors
    /// Returns `Transport` if the request fails or the gateway answers with an
    /// error status.
    pub async fn transaction_status(
        &self,
        transaction_hash: &FieldElement,
    ) -> Result<TransactionStatusReport, DidError> {
        let url = format!(
            "{}/feeder_gateway/get_transaction_status?transactionHash={:#x}",
            self.base_url, transaction_hash
        );
        let operation = "get_transaction_status";

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DidError::transport(operation, *transaction_hash, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DidError::transport(
                operation,
                *transaction_hash,
                format!("gateway returned {}: {}", status, body),
            ));
        }

        let report: TransactionStatusReport = response
            .json()
            .await
            .map_err(|e| DidError::malformed(operation, e.to_string()))?;

        if let Some(reason) = &report.tx_failure_reason {
            warn!(
                "transaction {:#x} rejected ({}): {}",
                transaction_hash, reason.code, reason.error_message
            );
        }
        Ok(report)
    }

    /// Polls [`Self::transaction_status`] until the transaction is final.
    ///
    /// This is the separately invoked "await finality" operation; the
    /// transaction signer never calls it. There is no overall deadline, wrap
    /// the future in `tokio::time::timeout` to bound it.
    ///
    /// # Returns
    /// The final status (`AcceptedOnL2`, `AcceptedOnL1`).
    ///
    /// # Errors
    /// - `SubmissionRejected` if the transaction ends up `REJECTED`, carrying
    ///   the gateway's failure code and message
    /// - `Transport` if a status request fails
    pub async fn wait_for_transaction(
        &self,
        transaction_hash: &FieldElement,
        poll_interval: Duration,
    ) -> Result<TransactionStatus, DidError> {
        loop {
            let report = self.transaction_status(transaction_hash).await?;
            debug!("transaction {:#x} status {:?}", transaction_hash, report.tx_status);
            match report.tx_status {
                TransactionStatus::Rejected => {
                    // Without a reason, the status itself is all the gateway said
                    return Err(match report.tx_failure_reason {
                        Some(reason) => DidError::SubmissionRejected {
                            code: reason.code,
                            message: reason.error_message,
                        },
                        None => DidError::SubmissionRejected {
                            code: "REJECTED".to_string(),
                            message: format!("transaction {:#x} was rejected", transaction_hash),
                        },
                    });
                }
                status if status.is_final() => return Ok(status),
                _ => tokio::time::sleep(poll_interval).await,
            }
        }
    }
}

#[async_trait]
impl ContractTransport for GatewayClient {
    async fn call_contract(&self, call: &Call) -> Result<Vec<FieldElement>, DidError> {
        let url = format!(
            "{}/feeder_gateway/call_contract?blockNumber=pending",
            self.base_url
        );
        let operation = format!("call_contract {:#x}", call.entry_point_selector);
        let body = CallContractRequest {
            contract_address: call.contract_address.to_string(),
            entry_point_selector: format!("{:#x}", call.entry_point_selector),
            calldata: normalize_calldata(&call.calldata),
            signature: Vec::new(),
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DidError::transport(operation.as_str(), call.contract_address, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DidError::transport(
                operation.as_str(),
                call.contract_address,
                format!("gateway returned {}: {}", status, body),
            ));
        }

        let parsed: CallContractResponse = response
            .json()
            .await
            .map_err(|e| DidError::malformed(operation.as_str(), e.to_string()))?;
        Ok(parsed.result)
    }

    async fn add_transaction(
        &self,
        transaction: &RawTransaction,
    ) -> Result<TransactionReceipt, DidError> {
        let url = format!("{}/gateway/add_transaction", self.base_url);
        let (request, target) = match transaction {
            RawTransaction::Invoke(tx) => (AddTransactionRequest::from(tx), tx.contract_address.felt()),
            RawTransaction::Deploy(tx) => (AddTransactionRequest::from(tx), tx.contract_address_salt),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DidError::transport("add_transaction", target, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DidError::transport("add_transaction", target, e))?;

        if !status.is_success() {
            // The gateway explains rejections as `{code, message}`; anything
            // else is a transport-level failure.
            return Err(match serde_json::from_str::<GatewayErrorBody>(&text) {
                Ok(error) => DidError::SubmissionRejected {
                    code: error.code,
                    message: error.message,
                },
                Err(_) => DidError::transport(
                    "add_transaction",
                    target,
                    format!("gateway returned {}: {}", status, text),
                ),
            });
        }

        let receipt: TransactionReceipt = serde_json::from_str(&text)
            .map_err(|e| DidError::malformed("add_transaction", e.to_string()))?;
        if receipt.code != TRANSACTION_RECEIVED {
            return Err(DidError::SubmissionRejected {
                code: receipt.code,
                message: text,
            });
        }

        debug!(
            "gateway accepted transaction {:#x}",
            receipt.transaction_hash
        );
        Ok(receipt)
    }
}
