// src/config.rs
//! Runtime settings.
//!
//! Layered in order: built-in defaults, an optional `scorpius.toml` in the
//! working directory, then `SCORPIUS_*` environment variables (a `.env` file is
//! loaded into the environment by `main`).

use crate::contracts::key_registry::DEFAULT_READ_CONCURRENCY;
use crate::error::DidError;
use crate::models::transaction::ContractAddress;
use crate::services::resolver::DEFAULT_DID_METHOD;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;

pub const DEFAULT_GATEWAY_URL: &str = "https://alpha4.starknet.io";
pub const DEFAULT_REGISTRY_ADDRESS: &str =
    "0x07b4f8fcfc647cbbeac352588faec88b69c1d659128a8ecf8b0d71cbbc3979a2";
pub const DEFAULT_ACCOUNT_CONTRACT_PATH: &str =
    "./starknet-artifacts/contracts/ArgentAccount.cairo/ArgentAccount.json";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Sequencer base URL; `/gateway` and `/feeder_gateway` are appended
    pub gateway_url: String,
    pub registry_address: String,
    pub did_method: String,
    /// Account used for writes, if any
    #[serde(default)]
    pub account_address: Option<String>,
    /// Stark private key of `account_address`
    #[serde(default)]
    pub private_key: Option<String>,
    pub account_contract_path: String,
    pub listen_addr: String,
    pub registry_read_concurrency: usize,
}

impl Settings {
    /// Loads settings from defaults, `scorpius.toml` and the environment.
    pub fn load() -> Result<Self, DidError> {
        let settings = Self::builder()?
            .add_source(File::with_name("scorpius").required(false))
            .add_source(Environment::with_prefix("SCORPIUS"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, DidError> {
        Ok(Config::builder()
            .set_default("gateway_url", DEFAULT_GATEWAY_URL)?
            .set_default("registry_address", DEFAULT_REGISTRY_ADDRESS)?
            .set_default("did_method", DEFAULT_DID_METHOD)?
            .set_default("account_contract_path", DEFAULT_ACCOUNT_CONTRACT_PATH)?
            .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
            .set_default("registry_read_concurrency", DEFAULT_READ_CONCURRENCY as i64)?)
    }

    pub fn registry_address(&self) -> Result<ContractAddress, DidError> {
        self.registry_address.parse()
    }

    /// The write account, when both address and key are configured.
    pub fn account(&self) -> Result<Option<(ContractAddress, String)>, DidError> {
        match (&self.account_address, &self.private_key) {
            (Some(address), Some(key)) => Ok(Some((address.parse()?, key.clone()))),
            _ => Ok(None),
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, DidError> {
        self.listen_addr
            .parse()
            .map_err(|e| DidError::Config(config::ConfigError::Message(format!(
                "invalid listen_addr {}: {}",
                self.listen_addr, e
            ))))
    }
}
