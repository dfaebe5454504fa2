// tests/common/mod.rs
//! In-memory chain double: one key registry plus any number of accounts.
//!
//! Invokes are checked the way the account contract checks them: `execute`
//! selector, calldata layout, current nonce, and a signature over the message
//! hash. Accepted `add_key` calls to the registry are applied to its state.

#![allow(dead_code)]

use async_trait::async_trait;
use did_scorpius::blockchain::gateway_client::TRANSACTION_RECEIVED;
use did_scorpius::blockchain::transport::ContractTransport;
use did_scorpius::error::DidError;
use did_scorpius::models::transaction::{
    Call, ContractAddress, RawTransaction, TransactionReceipt,
};
use did_scorpius::utils::crypto::{compute_message_hash, selector_from_name};
use did_scorpius::utils::serialization::short_string_to_felt;
use starknet_crypto::{verify, FieldElement};
use std::collections::HashMap;
use std::sync::Mutex;

pub const REGISTRY: &str = "0x07b4f8fcfc647cbbeac352588faec88b69c1d659128a8ecf8b0d71cbbc3979a2";
pub const ACCOUNT: &str = "0x33f45f07e1bd1a51b45fc24ec8c8c9908db9e42191be9e169bfcac0c0d99745";

pub fn felt(hex: &str) -> FieldElement {
    FieldElement::from_hex_be(hex).unwrap()
}

pub fn address(hex: &str) -> ContractAddress {
    ContractAddress(felt(hex))
}

pub fn tag(name: &str) -> FieldElement {
    short_string_to_felt(name).unwrap()
}

struct Account {
    public_key: FieldElement,
    nonce: FieldElement,
}

#[derive(Default)]
struct ChainState {
    accounts: HashMap<FieldElement, Account>,
    /// Registry slots per subject: `[type_tag, low, high]`
    keys: HashMap<FieldElement, Vec<[FieldElement; 3]>>,
    submissions: Vec<RawTransaction>,
    reads: Vec<Call>,
    failing_selector: Option<FieldElement>,
    deployments: u64,
}

pub struct MockChain {
    registry: ContractAddress,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Self {
        MockChain {
            registry: address(REGISTRY),
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn registry(&self) -> ContractAddress {
        self.registry
    }

    pub fn add_account(&self, account: ContractAddress, public_key: FieldElement) {
        self.state.lock().unwrap().accounts.insert(
            account.felt(),
            Account {
                public_key,
                nonce: FieldElement::ZERO,
            },
        );
    }

    pub fn nonce(&self, account: ContractAddress) -> FieldElement {
        self.state.lock().unwrap().accounts[&account.felt()].nonce
    }

    /// Writes raw slots for `subject`, sentinels included.
    pub fn set_slots(&self, subject: ContractAddress, slots: Vec<[FieldElement; 3]>) {
        self.state.lock().unwrap().keys.insert(subject.felt(), slots);
    }

    pub fn slots(&self, subject: ContractAddress) -> Vec<[FieldElement; 3]> {
        self.state
            .lock()
            .unwrap()
            .keys
            .get(&subject.felt())
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every read of `entry_point` fail with a transport error.
    pub fn fail_reads_of(&self, entry_point: &str) {
        self.state.lock().unwrap().failing_selector = Some(selector_from_name(entry_point));
    }

    pub fn submissions(&self) -> Vec<RawTransaction> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn reads(&self) -> Vec<Call> {
        self.state.lock().unwrap().reads.clone()
    }

    fn rejected(code: &str, message: impl Into<String>) -> DidError {
        DidError::SubmissionRejected {
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn execute(
        &self,
        state: &mut ChainState,
        tx: &did_scorpius::models::transaction::InvokeTransaction,
    ) -> Result<FieldElement, DidError> {
        let account = tx.contract_address.felt();
        let (public_key, current_nonce) = match state.accounts.get(&account) {
            Some(account) => (account.public_key, account.nonce),
            None => return Err(Self::rejected("StarknetErrorCode.UNINITIALIZED_CONTRACT", "no account")),
        };
        if tx.entry_point_selector != selector_from_name("execute") {
            return Err(Self::rejected("StarknetErrorCode.ENTRY_POINT_NOT_FOUND_IN_CONTRACT", "not execute"));
        }

        let calldata = &tx.calldata;
        if calldata.len() < 4 {
            return Err(Self::rejected("StarknetErrorCode.TRANSACTION_FAILED", "short calldata"));
        }
        let target = calldata[0];
        let selector = calldata[1];
        let argc = u64::try_from(calldata[2]).unwrap() as usize;
        if calldata.len() != argc + 4 {
            return Err(Self::rejected("StarknetErrorCode.TRANSACTION_FAILED", "bad argument count"));
        }
        let args = &calldata[3..3 + argc];
        let nonce = calldata[3 + argc];
        if nonce != current_nonce {
            return Err(Self::rejected("StarknetErrorCode.INVALID_TRANSACTION_NONCE", "nonce mismatch"));
        }

        let hash = compute_message_hash(&account, &target, &selector, args, &nonce);
        let valid = match tx.signature.as_slice() {
            [r, s] => verify(&public_key, &hash, r, s).unwrap_or(false),
            _ => false,
        };
        if !valid {
            return Err(Self::rejected("StarknetErrorCode.TRANSACTION_FAILED", "invalid signature"));
        }

        if target == self.registry.felt() && selector == selector_from_name("add_key") {
            let slot = [args[0], args[1], args[2]];
            state.keys.entry(account).or_default().push(slot);
        }
        if let Some(account) = state.accounts.get_mut(&account) {
            account.nonce = account.nonce + FieldElement::ONE;
        }
        Ok(hash)
    }
}

#[async_trait]
impl ContractTransport for MockChain {
    async fn call_contract(&self, call: &Call) -> Result<Vec<FieldElement>, DidError> {
        let mut state = self.state.lock().unwrap();
        state.reads.push(call.clone());

        if state.failing_selector == Some(call.entry_point_selector) {
            return Err(DidError::transport("call_contract", call.contract_address, "connection refused"));
        }

        let selector = call.entry_point_selector;
        if selector == selector_from_name("get_nonce") {
            return state
                .accounts
                .get(&call.contract_address.felt())
                .map(|account| vec![account.nonce])
                .ok_or_else(|| DidError::transport("get_nonce", call.contract_address, "no contract"));
        }

        let subject = call.calldata[0];
        let slots = state.keys.get(&subject).cloned().unwrap_or_default();
        if selector == selector_from_name("get_keys_len") {
            Ok(vec![FieldElement::from(slots.len())])
        } else if selector == selector_from_name("get_key") {
            let index = u64::try_from(call.calldata[1]).unwrap() as usize;
            Ok(slots
                .get(index)
                .map(|slot| slot.to_vec())
                .unwrap_or_else(|| vec![FieldElement::ZERO; 3]))
        } else {
            Err(DidError::transport("call_contract", call.contract_address, "unknown entry point"))
        }
    }

    async fn add_transaction(
        &self,
        transaction: &RawTransaction,
    ) -> Result<TransactionReceipt, DidError> {
        let mut state = self.state.lock().unwrap();
        state.submissions.push(transaction.clone());

        match transaction {
            RawTransaction::Deploy(deploy) => {
                state.deployments += 1;
                let address = FieldElement::from(0x1000u64 + state.deployments);
                let public_key = deploy.constructor_calldata[0];
                state.accounts.insert(
                    address,
                    Account {
                        public_key,
                        nonce: FieldElement::ZERO,
                    },
                );
                Ok(TransactionReceipt {
                    code: TRANSACTION_RECEIVED.to_string(),
                    transaction_hash: deploy.contract_address_salt,
                    address: Some(address),
                })
            }
            RawTransaction::Invoke(tx) => {
                let hash = self.execute(&mut state, tx)?;
                Ok(TransactionReceipt {
                    code: TRANSACTION_RECEIVED.to_string(),
                    transaction_hash: hash,
                    address: None,
                })
            }
        }
    }
}
