pub mod key_management;
pub mod signer;
pub mod transaction_signer;
