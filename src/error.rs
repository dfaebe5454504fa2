// src/error.rs
//! Error taxonomy shared by the signing and resolution paths.
//!
//! Every variant propagates to the immediate caller. Nothing in this crate
//! retries, falls back to a default, or returns a partial result.

use thiserror::Error;

/// Errors produced by DID account control and resolution.
#[derive(Debug, Error)]
pub enum DidError {
    /// Network or RPC failure while reaching the chain.
    #[error("transport error during `{operation}` on {address}: {message}")]
    Transport {
        /// Which call was being made (`get_nonce`, `get_key`, `add_transaction`, ...)
        operation: String,
        /// Contract address the call targeted
        address: String,
        message: String,
    },

    /// The signing capability refused or failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The gateway or the account contract rejected a submitted transaction.
    ///
    /// `code` and `message` are the remote values, unmodified.
    #[error("transaction rejected ({code}): {message}")]
    SubmissionRejected { code: String, message: String },

    /// The registry returned a key type tag with no verification-method mapping.
    #[error("unknown key type `{0}`")]
    UnknownKeyType(String),

    /// Operation deliberately outside the implemented surface.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("invalid DID `{0}`")]
    InvalidDid(String),

    #[error("unsupported DID method `{0}`")]
    UnsupportedMethod(String),

    /// A contract call returned data that does not match the expected layout.
    #[error("malformed response from `{operation}`: {message}")]
    MalformedResponse { operation: String, message: String },

    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DidError {
    /// Builds a [`DidError::Transport`] with call context.
    pub fn transport(
        operation: impl Into<String>,
        address: impl std::fmt::LowerHex,
        message: impl ToString,
    ) -> Self {
        DidError::Transport {
            operation: operation.into(),
            address: format!("{:#x}", address),
            message: message.to_string(),
        }
    }

    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        DidError::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
