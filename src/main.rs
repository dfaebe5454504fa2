// src/main.rs

//! # did-scorpius - Main Entry Point
//!
//! Wires the gateway client, key registry and resolver from [`Settings`] and
//! runs one of:
//! - `serve` (default): the HTTP resolver on `listen_addr`
//! - `create-identifier [alias]`: deploys a new account and prints its DID
//! - `add-key <Secp256k1|Ed25519|X25519> <public key hex>`: registers a key for
//!   the configured account
//!
//! ## Environment Variables
//! - `SCORPIUS_GATEWAY_URL`, `SCORPIUS_REGISTRY_ADDRESS`, `SCORPIUS_DID_METHOD`
//! - `SCORPIUS_ACCOUNT_ADDRESS`, `SCORPIUS_PRIVATE_KEY`: required by `add-key`
//! - `SCORPIUS_LISTEN_ADDR`, `SCORPIUS_REGISTRY_READ_CONCURRENCY`
//! - `RUST_LOG`: log filter

use anyhow::{anyhow, bail, Context, Result};
use did_scorpius::blockchain::gateway_client::GatewayClient;
use did_scorpius::blockchain::transport::ContractTransport;
use did_scorpius::config::Settings;
use did_scorpius::contracts::key_registry::RegistryReader;
use did_scorpius::models::did::{KeyType, ParsedDid};
use did_scorpius::services::api_server::ApiServer;
use did_scorpius::services::identifier_provider::{Identifier, IdentifierProvider};
use did_scorpius::services::resolver::DidResolver;
use did_scorpius::wallet::key_management::{KeyManager, ManagedKeyType};
use dotenv::dotenv;
use log::info;
use num_bigint::BigUint;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::load().context("loading settings")?;
    let transport: Arc<dyn ContractTransport> = Arc::new(GatewayClient::new(&settings.gateway_url));
    let registry = RegistryReader::new(transport.clone(), settings.registry_address()?)
        .with_read_concurrency(settings.registry_read_concurrency);
    let key_manager = Arc::new(KeyManager::new());
    let provider = IdentifierProvider::new(
        transport.clone(),
        key_manager.clone(),
        registry.clone(),
        &settings.did_method,
        settings.account_contract_path.as_str(),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str).unwrap_or("serve") {
        "serve" => {
            let resolver = DidResolver::new(registry, &settings.did_method);
            let addr = settings.listen_addr()?;
            info!("GET /1.0/identifiers/:did on {}", addr);
            ApiServer::new(resolver).run(addr).await?;
        }
        "create-identifier" => {
            let identifier = provider.create_identifier(args.get(1).cloned()).await?;
            println!("{}", identifier.did);
        }
        "add-key" => {
            let (tag, key_hex) = match (args.get(1), args.get(2)) {
                (Some(tag), Some(key_hex)) => (tag, key_hex),
                _ => bail!("usage: add-key <Secp256k1|Ed25519|X25519> <public key hex>"),
            };
            let key_type = KeyType::from_tag(tag)?;
            let public_key = BigUint::parse_bytes(key_hex.trim_start_matches("0x").as_bytes(), 16)
                .ok_or_else(|| anyhow!("public key is not hex: {}", key_hex))?;

            let (account, private_key) = settings
                .account()?
                .ok_or_else(|| anyhow!("SCORPIUS_ACCOUNT_ADDRESS and SCORPIUS_PRIVATE_KEY are required"))?;
            let controller = key_manager
                .import_key(Some("controller".to_string()), ManagedKeyType::StarkNetKey, &private_key)
                .await?;
            let identifier = Identifier {
                did: ParsedDid::format(&settings.did_method, &account),
                controller_key_id: controller.kid.clone(),
                keys: vec![controller],
                services: Vec::new(),
            };

            let receipt = provider.add_key(&identifier, key_type, &public_key).await?;
            println!("{:#x}", receipt.transaction_hash);
        }
        other => bail!("unknown command `{}`", other),
    }

    Ok(())
}
