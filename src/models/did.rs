// src/models/did.rs
//! Decentralized Identifier (DID) data model implementation.
//!
//! Defines the W3C-shaped [DID Core](https://www.w3.org/TR/did-core/) document
//! produced by resolution, the verification-method key types the registry
//! can hold, and the `did:<method>:<address>` identifier syntax.

use crate::error::DidError;
use crate::models::transaction::ContractAddress;
use serde::{Deserialize, Serialize};

/// JSON-LD context emitted on every resolved document.
pub const DID_CONTEXT: &str = "https://w3id.org/did/v1";

/// Content type declared in resolution metadata.
pub const DID_LD_JSON: &str = "application/did+ld+json";

/// Verification-method types a registry key can resolve to.
///
/// The registry stores a short symbolic tag per key; the mapping from tag to
/// type is fixed. An unmapped tag is an error, never a default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    EcdsaSecp256k1VerificationKey2019,
    Ed25519VerificationKey2018,
    X25519KeyAgreementKey2019,
}

impl KeyType {
    /// Maps a registry type tag to its verification-method type.
    ///
    /// # Errors
    /// `UnknownKeyType` for any tag outside the fixed table.
    pub fn from_tag(tag: &str) -> Result<Self, DidError> {
        match tag {
            "Secp256k1" => Ok(KeyType::EcdsaSecp256k1VerificationKey2019),
            "Ed25519" => Ok(KeyType::Ed25519VerificationKey2018),
            "X25519" => Ok(KeyType::X25519KeyAgreementKey2019),
            other => Err(DidError::UnknownKeyType(other.to_string())),
        }
    }

    /// The registry tag stored on-chain for this type.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyType::EcdsaSecp256k1VerificationKey2019 => "Secp256k1",
            KeyType::Ed25519VerificationKey2018 => "Ed25519",
            KeyType::X25519KeyAgreementKey2019 => "X25519",
        }
    }

    /// Ed25519 keys convert to X25519, so both take part in key agreement.
    pub fn is_key_agreement_capable(&self) -> bool {
        matches!(
            self,
            KeyType::Ed25519VerificationKey2018 | KeyType::X25519KeyAgreementKey2019
        )
    }

    /// Every type except the pure key-agreement one can authenticate and assert.
    pub fn is_signing_capable(&self) -> bool {
        !matches!(self, KeyType::X25519KeyAgreementKey2019)
    }
}

/// One key entry in a DID Document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// `<did>#<registry index>`
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub controller: String,
    /// Public key as lowercase hex without prefix
    pub public_key_hex: String,
}

/// A DID Document representing the keys currently registered for a subject.
///
/// The document is a pure projection of registry contents at resolution time:
/// it is rebuilt on every resolution and never edited in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
    pub key_agreement: Vec<String>,
}

impl DidDocument {
    /// Creates a document with no keys.
    pub fn empty(did: &str) -> Self {
        DidDocument {
            context: DID_CONTEXT.to_string(),
            id: did.to_string(),
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            key_agreement: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionMetadata {
    pub content_type: String,
}

/// Always empty for this method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocumentMetadata {}

/// Resolution output in the shape DID resolvers exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionResult {
    pub did_resolution_metadata: DidResolutionMetadata,
    pub did_document: DidDocument,
    pub did_document_metadata: DidDocumentMetadata,
}

impl DidResolutionResult {
    pub fn new(did_document: DidDocument) -> Self {
        DidResolutionResult {
            did_resolution_metadata: DidResolutionMetadata {
                content_type: DID_LD_JSON.to_string(),
            },
            did_document,
            did_document_metadata: DidDocumentMetadata::default(),
        }
    }
}

/// A parsed `did:<method>:<address>` identifier.
///
/// The method-specific identifier is the on-chain subject address, verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedDid {
    pub did: String,
    pub method: String,
    pub address: ContractAddress,
}

impl ParsedDid {
    /// Parses a DID string.
    ///
    /// # Errors
    /// `InvalidDid` if the string is not `did:<method>:<id>` or the id is not a
    /// valid field element.
    pub fn parse(did: &str) -> Result<Self, DidError> {
        let mut parts = did.splitn(3, ':');
        let (scheme, method, id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(method), Some(id)) => (scheme, method, id),
            _ => return Err(DidError::InvalidDid(did.to_string())),
        };
        if scheme != "did" || method.is_empty() || id.is_empty() {
            return Err(DidError::InvalidDid(did.to_string()));
        }

        let address = id
            .parse::<ContractAddress>()
            .map_err(|_| DidError::InvalidDid(did.to_string()))?;

        Ok(ParsedDid {
            did: did.to_string(),
            method: method.to_string(),
            address,
        })
    }

    /// Formats the DID for a freshly created subject address.
    pub fn format(method: &str, address: &ContractAddress) -> String {
        format!("did:{}:{}", method, address)
    }
}
