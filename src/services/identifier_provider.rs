// src/services/identifier_provider.rs
//! Identifier lifecycle for the registry-backed DID method.
//!
//! Creating an identifier deploys a fresh account contract controlled by a new
//! Stark key; the DID is the account's address. Keys are added to the DID by
//! having the account call the registry's `add_key` through a signed
//! `execute` transaction.
//!
//! Deletion, services, and key removal are not part of this method's
//! implemented surface and fail immediately.

use crate::blockchain::transport::ContractTransport;
use crate::contracts::key_registry::RegistryReader;
use crate::error::DidError;
use crate::models::did::{KeyType, ParsedDid};
use crate::models::transaction::{
    ContractAddress, DeployTransaction, RawTransaction, Transaction, TransactionReceipt,
};
use crate::utils::serialization::parse_felt;
use crate::wallet::key_management::{KeyManager, ManagedKeyInfo, ManagedKeyType};
use crate::wallet::transaction_signer::TransactionSigner;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use starknet_crypto::FieldElement;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Service endpoint entry of an identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// A DID under local control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub did: String,
    /// Key id, in the key manager, of the key controlling the account
    pub controller_key_id: String,
    pub keys: Vec<ManagedKeyInfo>,
    pub services: Vec<Service>,
}

/// Creates identifiers and manages their registry keys.
pub struct IdentifierProvider {
    transport: Arc<dyn ContractTransport>,
    key_manager: Arc<KeyManager>,
    registry: RegistryReader,
    method: String,
    account_contract_path: PathBuf,
}

impl IdentifierProvider {
    /// Creates a provider.
    ///
    /// # Arguments
    /// * `transport` - Chain transport for deployments and invokes
    /// * `key_manager` - Holds the controller keys of created identifiers
    /// * `registry` - Key registry the identifiers' keys are written to
    /// * `method` - DID method name, e.g. `scorpius`
    /// * `account_contract_path` - Compiled account contract artifact (JSON)
    pub fn new(
        transport: Arc<dyn ContractTransport>,
        key_manager: Arc<KeyManager>,
        registry: RegistryReader,
        method: &str,
        account_contract_path: impl Into<PathBuf>,
    ) -> Self {
        IdentifierProvider {
            transport,
            key_manager,
            registry,
            method: method.to_string(),
            account_contract_path: account_contract_path.into(),
        }
    }

    /// Creates a Stark key and deploys an account contract it controls.
    ///
    /// The account constructor receives `[signer_public_key, guardian = 0]` and
    /// the public key doubles as the deployment salt.
    ///
    /// # Arguments
    /// * `alias` - Key id for the controller key; defaults to its public key hex
    ///
    /// # Returns
    /// The new identifier, `did:<method>:<account address>`. The deployment
    /// may still be pending on-chain.
    pub async fn create_identifier(&self, alias: Option<String>) -> Result<Identifier, DidError> {
        let key = self
            .key_manager
            .create_key(ManagedKeyType::StarkNetKey, alias)
            .await?;
        let public_key = parse_felt(&key.public_key_hex)?;
        let contract_definition = load_contract_definition(&self.account_contract_path).await?;

        debug!("deploying account contract for key {}", key.kid);
        let deploy = DeployTransaction {
            contract_definition,
            constructor_calldata: vec![public_key, FieldElement::ZERO],
            contract_address_salt: public_key,
        };
        // Deployments are not nonce-gated and carry no account signature
        let receipt = self
            .transport
            .add_transaction(&RawTransaction::Deploy(deploy))
            .await?;

        let address = receipt
            .address
            .map(ContractAddress)
            .ok_or_else(|| DidError::malformed("add_transaction", "deployment receipt has no address"))?;
        let did = ParsedDid::format(&self.method, &address);
        info!(
            "created {} controlled by {} (transaction {:#x})",
            did, key.kid, receipt.transaction_hash
        );

        Ok(Identifier {
            did,
            controller_key_id: key.kid.clone(),
            keys: vec![key],
            services: Vec::new(),
        })
    }

    /// Registers a key for `identifier` in the registry.
    ///
    /// The identifier's account signs an `add_key(type_tag, low, high)` call.
    pub async fn add_key(
        &self,
        identifier: &Identifier,
        key_type: KeyType,
        public_key: &BigUint,
    ) -> Result<TransactionReceipt, DidError> {
        let signer = self.transaction_signer(identifier).await?;
        let call = self.registry.add_key_call(key_type, public_key)?;
        signer.submit(Transaction::Invoke(call)).await
    }

    /// A transaction signer for the identifier's account and controller key.
    pub async fn transaction_signer(
        &self,
        identifier: &Identifier,
    ) -> Result<TransactionSigner, DidError> {
        let parsed = ParsedDid::parse(&identifier.did)?;
        if parsed.method != self.method {
            return Err(DidError::UnsupportedMethod(parsed.method));
        }
        let signer = self.key_manager.signer(&identifier.controller_key_id).await?;
        Ok(TransactionSigner::new(
            self.transport.clone(),
            parsed.address,
            Arc::new(signer),
        ))
    }

    pub async fn delete_identifier(&self, _identifier: &Identifier) -> Result<bool, DidError> {
        Err(DidError::NotImplemented("identifier deletion"))
    }

    pub async fn add_service(
        &self,
        _identifier: &Identifier,
        _service: &Service,
    ) -> Result<TransactionReceipt, DidError> {
        Err(DidError::NotImplemented("adding services"))
    }

    pub async fn remove_key(
        &self,
        _identifier: &Identifier,
        _kid: &str,
    ) -> Result<TransactionReceipt, DidError> {
        Err(DidError::NotImplemented("key removal"))
    }

    pub async fn remove_service(
        &self,
        _identifier: &Identifier,
        _service_id: &str,
    ) -> Result<TransactionReceipt, DidError> {
        Err(DidError::NotImplemented("removing services"))
    }
}

/// Loads a compiled contract artifact for deployment.
///
/// The gateway expects `program` gzip-compressed and base64-encoded; an
/// artifact whose `program` is still a JSON object is compressed here.
pub async fn load_contract_definition(path: &Path) -> Result<Value, DidError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let mut definition: Value = serde_json::from_str(&raw)?;
    if let Some(program) = definition.get_mut("program") {
        if !program.is_string() {
            *program = Value::String(compress_program(program)?);
        }
    }
    Ok(definition)
}

fn compress_program(program: &Value) -> Result<String, DidError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&serde_json::to_vec(program)?)?;
    Ok(base64::encode(encoder.finish()?))
}
