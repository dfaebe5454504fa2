// src/wallet/key_management.rs
//! Cryptographic key management for DID controllers.
//!
//! Provides generation, import, and usage of Stark curve keys, the only key
//! type whose signing path the account contract understands. Other key types
//! are refused outright rather than half-supported.
//!
//! Uses the following primitives:
//! - Stark curve ECDSA (via `starknet-crypto`)
//! - Cryptographically secure random number generation (via `rand`)

use crate::error::DidError;
use crate::utils::serialization::parse_felt;
use crate::wallet::signer::{LocalStarkSigner, MessageSigner, Signature};
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use starknet_crypto::FieldElement;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Signing algorithm name for Stark keys.
pub const STARKNET_SIGN: &str = "StarkNetSign";

/// Key types a key manager can be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagedKeyType {
    StarkNetKey,
    Ed25519,
    Secp256k1,
    X25519,
}

/// Public description of a managed key. Never contains private material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedKeyInfo {
    /// Key id; the alias given at import, otherwise the public key hex
    pub kid: String,
    #[serde(rename = "type")]
    pub key_type: ManagedKeyType,
    pub public_key_hex: String,
    pub algorithms: Vec<String>,
}

struct ManagedKey {
    info: ManagedKeyInfo,
    signer: LocalStarkSigner,
}

/// In-memory key management system.
///
/// # Security Notes
/// - Private keys never leave this struct; callers get [`ManagedKeyInfo`] or a
///   [`LocalStarkSigner`] handle
/// - Keys live only for the lifetime of the process
#[derive(Default)]
pub struct KeyManager {
    keys: RwLock<HashMap<String, ManagedKey>>,
}

impl KeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a new key.
    ///
    /// # Arguments
    /// * `key_type` - Only `StarkNetKey` is supported
    /// * `alias` - Optional key id; defaults to the public key hex
    ///
    /// # Errors
    /// `NotImplemented` for every type except `StarkNetKey`.
    pub async fn create_key(
        &self,
        key_type: ManagedKeyType,
        alias: Option<String>,
    ) -> Result<ManagedKeyInfo, DidError> {
        match key_type {
            ManagedKeyType::StarkNetKey => {
                let private_key = random_stark_private_key();
                self.import_stark_key(alias, private_key).await
            }
            ManagedKeyType::Ed25519 => Err(DidError::NotImplemented("Ed25519 key creation")),
            ManagedKeyType::Secp256k1 => Err(DidError::NotImplemented("Secp256k1 key creation")),
            ManagedKeyType::X25519 => Err(DidError::NotImplemented("X25519 key creation")),
        }
    }

    /// Imports an existing private key.
    ///
    /// # Arguments
    /// * `alias` - Optional key id; defaults to the public key hex
    /// * `key_type` - Only `StarkNetKey` is supported
    /// * `private_key_hex` - `0x`-prefixed hex private key
    pub async fn import_key(
        &self,
        alias: Option<String>,
        key_type: ManagedKeyType,
        private_key_hex: &str,
    ) -> Result<ManagedKeyInfo, DidError> {
        if key_type != ManagedKeyType::StarkNetKey {
            return Err(DidError::NotImplemented("importing non-Stark keys"));
        }
        let private_key = parse_felt(private_key_hex)?;
        if private_key == FieldElement::ZERO {
            return Err(DidError::InvalidFieldElement("private key is zero".to_string()));
        }
        self.import_stark_key(alias, private_key).await
    }

    async fn import_stark_key(
        &self,
        alias: Option<String>,
        private_key: FieldElement,
    ) -> Result<ManagedKeyInfo, DidError> {
        let signer = LocalStarkSigner::new(private_key);
        let public_key_hex = format!("{:#x}", signer.public_key());
        let info = ManagedKeyInfo {
            kid: alias.unwrap_or_else(|| public_key_hex.clone()),
            key_type: ManagedKeyType::StarkNetKey,
            public_key_hex,
            algorithms: vec![STARKNET_SIGN.to_string()],
        };

        debug!("imported key {} ({:?})", info.kid, info.key_type);
        self.keys.write().await.insert(
            info.kid.clone(),
            ManagedKey {
                info: info.clone(),
                signer,
            },
        );
        Ok(info)
    }

    /// Returns the public description of a key.
    pub async fn get_key(&self, kid: &str) -> Result<ManagedKeyInfo, DidError> {
        self.keys
            .read()
            .await
            .get(kid)
            .map(|key| key.info.clone())
            .ok_or_else(|| DidError::KeyNotFound(kid.to_string()))
    }

    /// Hands out a signer bound to one managed key.
    pub async fn signer(&self, kid: &str) -> Result<LocalStarkSigner, DidError> {
        self.keys
            .read()
            .await
            .get(kid)
            .map(|key| key.signer.clone())
            .ok_or_else(|| DidError::KeyNotFound(kid.to_string()))
    }

    /// Signs a message hash with a managed key.
    ///
    /// # Arguments
    /// * `kid` - Key id
    /// * `algorithm` - `None` or `Some("StarkNetSign")`
    /// * `message_hash` - Felt to sign
    pub async fn sign(
        &self,
        kid: &str,
        algorithm: Option<&str>,
        message_hash: &FieldElement,
    ) -> Result<Signature, DidError> {
        if let Some(algorithm) = algorithm {
            if algorithm != STARKNET_SIGN {
                return Err(DidError::NotImplemented("signing algorithms other than StarkNetSign"));
            }
        }
        self.signer(kid).await?.sign_hash(message_hash).await
    }

    pub async fn delete_key(&self, _kid: &str) -> Result<bool, DidError> {
        Err(DidError::NotImplemented("key deletion"))
    }

    pub async fn list_keys(&self) -> Result<Vec<ManagedKeyInfo>, DidError> {
        Err(DidError::NotImplemented("key listing"))
    }

    pub async fn shared_secret(
        &self,
        _kid: &str,
        _their_public_key_hex: &str,
    ) -> Result<Vec<u8>, DidError> {
        Err(DidError::NotImplemented("shared secret derivation"))
    }
}

/// Random non-zero scalar below 2^251, which is under the curve order.
fn random_stark_private_key() -> FieldElement {
    let mut rng = rand::thread_rng();
    loop {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        bytes[0] &= 0x07;
        if let Ok(key) = FieldElement::from_bytes_be(&bytes) {
            if key != FieldElement::ZERO {
                return key;
            }
        }
    }
}
