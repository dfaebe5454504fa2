// src/wallet/signer.rs
//! Signing capability for account transactions.
//!
//! The transaction signer never sees private key material. It hands a message
//! hash to a [`MessageSigner`] and gets back `(r, s)`; whether that is a local
//! key, a hardware module, or a remote service is up to the implementation.

use crate::error::DidError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starknet_crypto::{get_public_key, rfc6979_generate_k, sign, FieldElement, SignError};

/// Stark curve ECDSA signature over a message hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: FieldElement,
    pub s: FieldElement,
}

impl Signature {
    /// Signature in the order the account contract reads it: `[r, s]`.
    pub fn to_vec(&self) -> Vec<FieldElement> {
        vec![self.r, self.s]
    }
}

/// A capability that signs message hashes.
///
/// Implementations hold no state shared with the caller. `sign_hash` may take
/// arbitrarily long (hardware confirmation, remote signer); callers own the
/// timeout policy.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Signs `message_hash`.
    ///
    /// # Errors
    /// `Signing` if the capability refuses or fails.
    async fn sign_hash(&self, message_hash: &FieldElement) -> Result<Signature, DidError>;
}

/// Signs with a Stark private key held in memory.
#[derive(Clone)]
pub struct LocalStarkSigner {
    private_key: FieldElement,
}

impl LocalStarkSigner {
    pub fn new(private_key: FieldElement) -> Self {
        LocalStarkSigner { private_key }
    }

    /// The Stark public key (x coordinate) for this signer.
    pub fn public_key(&self) -> FieldElement {
        get_public_key(&self.private_key)
    }

    /// Deterministic RFC 6979 signing. A rejected `k` is retried with an
    /// incremented seed, matching the cairo-lang reference signer.
    pub fn sign_blocking(&self, message_hash: &FieldElement) -> Result<Signature, DidError> {
        let mut seed: Option<FieldElement> = None;
        loop {
            let k = rfc6979_generate_k(message_hash, &self.private_key, seed.as_ref());
            match sign(&self.private_key, message_hash, &k) {
                Ok(signature) => {
                    return Ok(Signature {
                        r: signature.r,
                        s: signature.s,
                    })
                }
                Err(SignError::InvalidMessageHash) => {
                    return Err(DidError::Signing(format!(
                        "message hash {:#x} out of range",
                        message_hash
                    )))
                }
                Err(SignError::InvalidK) => {
                    seed = Some(match seed {
                        Some(seed) => seed + FieldElement::ONE,
                        None => FieldElement::ONE,
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for LocalStarkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStarkSigner")
            .field("public_key", &format_args!("{:#x}", self.public_key()))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSigner for LocalStarkSigner {
    async fn sign_hash(&self, message_hash: &FieldElement) -> Result<Signature, DidError> {
        self.sign_blocking(message_hash)
    }
}
