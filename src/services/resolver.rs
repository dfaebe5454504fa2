// src/services/resolver.rs
//! DID resolution service.
//!
//! Turns the registry's key slots for a subject into a DID Document. The
//! document is rebuilt from scratch on every call; nothing is cached.

use crate::contracts::key_registry::{KeyRecord, RegistryReader};
use crate::error::DidError;
use crate::models::did::{
    DidDocument, DidResolutionResult, KeyType, ParsedDid, VerificationMethod,
};
use crate::models::transaction::ContractAddress;
use log::{debug, info};

/// DID method name served by default.
pub const DEFAULT_DID_METHOD: &str = "scorpius";

/// Resolves `did:<method>:<address>` identifiers against a key registry.
#[derive(Clone)]
pub struct DidResolver {
    registry: RegistryReader,
    method: String,
}

impl DidResolver {
    /// Creates a resolver for DIDs of `method`.
    pub fn new(registry: RegistryReader, method: &str) -> Self {
        DidResolver {
            registry,
            method: method.to_string(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolves a DID string into a resolution result.
    ///
    /// # Errors
    /// - `InvalidDid` if the DID is malformed
    /// - `UnsupportedMethod` if it belongs to another method
    /// - any error from [`Self::resolve_document`]
    pub async fn resolve(&self, did: &str) -> Result<DidResolutionResult, DidError> {
        let parsed = ParsedDid::parse(did)?;
        if parsed.method != self.method {
            return Err(DidError::UnsupportedMethod(parsed.method));
        }

        let document = self.resolve_document(&parsed.did, parsed.address).await?;
        info!(
            "resolved {} with {} verification methods",
            did,
            document.verification_method.len()
        );
        Ok(DidResolutionResult::new(document))
    }

    /// Builds the DID Document for `subject` from the registry.
    ///
    /// A subject with no registered keys yields a valid, empty document.
    ///
    /// # Errors
    /// - `UnknownKeyType` if any slot carries an unmapped type tag; no partial
    ///   document is returned
    /// - `Transport` / `MalformedResponse` from the registry reads
    pub async fn resolve_document(
        &self,
        did: &str,
        subject: ContractAddress,
    ) -> Result<DidDocument, DidError> {
        let records = self.registry.list_keys(subject).await?;
        debug!("{} registry records for {}", records.len(), did);
        assemble_document(did, &records)
    }
}

/// Maps registry records to a DID Document.
///
/// Each record becomes `<did>#<index>`. Signing-capable keys go to
/// `authentication` and `assertionMethod`; agreement-capable keys go to
/// `keyAgreement`. Ed25519 keys land in both.
pub fn assemble_document(did: &str, records: &[KeyRecord]) -> Result<DidDocument, DidError> {
    let mut document = DidDocument::empty(did);

    for record in records {
        let key_type = KeyType::from_tag(&record.key_type_tag)?;
        let id = format!("{}#{}", did, record.index);

        if key_type.is_signing_capable() {
            document.authentication.push(id.clone());
            document.assertion_method.push(id.clone());
        }
        if key_type.is_key_agreement_capable() {
            document.key_agreement.push(id.clone());
        }

        document.verification_method.push(VerificationMethod {
            id,
            key_type,
            controller: did.to_string(),
            public_key_hex: format!("{:x}", record.public_key),
        });
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    const DID: &str = "did:scorpius:0x1234";

    fn record(index: u64, tag: &str, key: u64) -> KeyRecord {
        KeyRecord {
            index,
            key_type_tag: tag.to_string(),
            public_key: BigUint::from(key),
        }
    }

    #[test]
    fn partitions_keys_by_purpose() {
        let records = [
            record(0, "Secp256k1", 0xaa),
            record(1, "Ed25519", 0xbb),
            record(2, "X25519", 0xcc),
        ];
        let document = assemble_document(DID, &records).unwrap();

        let ids: Vec<_> = document.verification_method.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![format!("{DID}#0"), format!("{DID}#1"), format!("{DID}#2")]);
        assert_eq!(document.authentication, vec![format!("{DID}#0"), format!("{DID}#1")]);
        assert_eq!(document.assertion_method, document.authentication);
        assert_eq!(document.key_agreement, vec![format!("{DID}#1"), format!("{DID}#2")]);
        assert_eq!(document.verification_method[2].public_key_hex, "cc");
        assert!(document.verification_method.iter().all(|m| m.controller == DID));
    }

    #[test]
    fn ids_follow_registry_index_across_gaps() {
        // Slot 1 was removed on-chain and is absent from the records
        let records = [record(0, "Ed25519", 1), record(2, "Ed25519", 3)];
        let document = assemble_document(DID, &records).unwrap();
        assert_eq!(document.verification_method[1].id, format!("{DID}#2"));
    }

    #[test]
    fn unknown_type_aborts_assembly() {
        let records = [record(0, "Ed25519", 1), record(1, "Bls12381G2", 2)];
        assert!(matches!(
            assemble_document(DID, &records),
            Err(DidError::UnknownKeyType(tag)) if tag == "Bls12381G2"
        ));
    }

    #[test]
    fn no_records_yield_empty_document() {
        let document = assemble_document(DID, &[]).unwrap();
        assert_eq!(document, DidDocument::empty(DID));
    }
}
