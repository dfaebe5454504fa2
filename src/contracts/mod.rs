pub mod account;
pub mod key_registry;
