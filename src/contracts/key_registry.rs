// src/contracts/key_registry.rs
//! Key registry smart contract interface.
//!
//! The registry stores, per subject address, an index-addressed list of keys.
//! Each slot is `(type_tag, low, high)`: a Cairo short-string type tag and the
//! public key split into two 128-bit limbs. A removed or never-written slot
//! reads back as zeros.
//!
//! Only this one layout is supported. Older registry deployments with numeric
//! type tags and single-felt public keys are not read by this module.

use crate::blockchain::transport::ContractTransport;
use crate::error::DidError;
use crate::models::did::KeyType;
use crate::models::transaction::{Call, ContractAddress};
use crate::utils::crypto::selector_from_name;
use crate::utils::serialization::{
    felt_to_short_string, felt_to_u64, short_string_to_felt, u256_from_limbs, u256_to_limbs,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use num_bigint::BigUint;
use starknet_crypto::FieldElement;
use std::sync::Arc;

pub const GET_KEYS_LEN: &str = "get_keys_len";
pub const GET_KEY: &str = "get_key";
pub const ADD_KEY: &str = "add_key";

/// Default number of `get_key` reads kept in flight during enumeration.
pub const DEFAULT_READ_CONCURRENCY: usize = 8;

/// One occupied registry slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRecord {
    /// Slot index in the registry; stable as long as the registry never compacts
    pub index: u64,
    /// Decoded short-string tag, or the raw tag in hex if it is not a short string
    pub key_type_tag: String,
    pub public_key: BigUint,
}

/// Read-only client enumerating the keys registered for a subject.
#[derive(Clone)]
pub struct RegistryReader {
    transport: Arc<dyn ContractTransport>,
    registry_address: ContractAddress,
    read_concurrency: usize,
}

impl RegistryReader {
    /// Creates a reader for the registry deployed at `registry_address`.
    pub fn new(transport: Arc<dyn ContractTransport>, registry_address: ContractAddress) -> Self {
        RegistryReader {
            transport,
            registry_address,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
        }
    }

    /// Sets how many per-index reads may be in flight at once. `1` gives
    /// strictly sequential reads.
    pub fn with_read_concurrency(mut self, read_concurrency: usize) -> Self {
        self.read_concurrency = read_concurrency.max(1);
        self
    }

    pub fn registry_address(&self) -> ContractAddress {
        self.registry_address
    }

    /// Reads `get_keys_len(subject)`.
    pub async fn keys_len(&self, subject: ContractAddress) -> Result<u64, DidError> {
        let call = Call::new(
            self.registry_address,
            selector_from_name(GET_KEYS_LEN),
            vec![subject.felt()],
        );
        let result = self.transport.call_contract(&call).await?;
        let len = result
            .first()
            .ok_or_else(|| DidError::malformed(GET_KEYS_LEN, "empty result"))?;
        felt_to_u64(len).ok_or_else(|| {
            DidError::malformed(GET_KEYS_LEN, format!("length {:#x} out of range", len))
        })
    }

    /// Reads and decodes one slot.
    ///
    /// # Returns
    /// `None` for an empty slot (`type_tag == 0 && low == 0`).
    pub async fn get_key(
        &self,
        subject: ContractAddress,
        index: u64,
    ) -> Result<Option<KeyRecord>, DidError> {
        let call = Call::new(
            self.registry_address,
            selector_from_name(GET_KEY),
            vec![subject.felt(), FieldElement::from(index)],
        );
        let result = self.transport.call_contract(&call).await?;
        let (type_tag, low, high) = match result.as_slice() {
            [type_tag, low, high, ..] => (*type_tag, *low, *high),
            other => {
                return Err(DidError::malformed(
                    GET_KEY,
                    format!("expected 3 values, got {}", other.len()),
                ))
            }
        };

        if type_tag == FieldElement::ZERO && low == FieldElement::ZERO {
            debug!("registry slot {} of {} is empty", index, subject);
            return Ok(None);
        }

        Ok(Some(KeyRecord {
            index,
            key_type_tag: felt_to_short_string(&type_tag)
                .unwrap_or_else(|| format!("{:#x}", type_tag)),
            public_key: u256_from_limbs(&low, &high),
        }))
    }

    /// Lists every occupied slot for `subject`, in index order.
    ///
    /// Performs `len + 1` reads. The length read first bounds the enumeration;
    /// slots appended afterwards are not seen. Any failed read aborts the whole
    /// listing.
    pub async fn list_keys(&self, subject: ContractAddress) -> Result<Vec<KeyRecord>, DidError> {
        let len = self.keys_len(subject).await?;
        debug!("registry holds {} slots for {}", len, subject);

        // `buffered` yields results in input order regardless of completion order
        let slots: Vec<Option<KeyRecord>> = stream::iter(0..len)
            .map(|index| self.get_key(subject, index))
            .buffered(self.read_concurrency)
            .try_collect()
            .await?;

        Ok(slots.into_iter().flatten().collect())
    }

    /// Builds the `add_key(type_tag, low, high)` call for the signed path.
    ///
    /// # Errors
    /// `InvalidPublicKey` if the key does not fit in 256 bits.
    pub fn add_key_call(&self, key_type: KeyType, public_key: &BigUint) -> Result<Call, DidError> {
        let (low, high) = u256_to_limbs(public_key)?;
        Ok(Call::new(
            self.registry_address,
            selector_from_name(ADD_KEY),
            vec![short_string_to_felt(key_type.tag())?, low, high],
        ))
    }
}
