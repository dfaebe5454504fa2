// src/services/api_server.rs
//! HTTP interface of the DID resolver.
//!
//! Exposes a Universal Resolver style driver endpoint:
//! - `GET /1.0/identifiers/:did` returns the DID resolution result
//!
//! Every request resolves against the registry afresh.

use crate::error::DidError;
use crate::services::resolver::DidResolver;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use log::{info, warn};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

/// API server state, shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    resolver: Arc<DidResolver>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `resolver` - Resolver serving the configured DID method
    pub fn new(resolver: DidResolver) -> Self {
        ApiServer {
            resolver: Arc::new(resolver),
        }
    }

    /// The route table, with state attached.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/1.0/identifiers/:did", get(Self::resolve_did_handler))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and serves until the listener fails.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    ///
    /// # Errors
    /// `Io` if the address cannot be bound or serving fails.
    pub async fn run(&self, addr: SocketAddr) -> Result<(), DidError> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("resolver listening on http://{}", addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Resolves a DID to its resolution result
    ///
    /// # Endpoint
    /// GET /1.0/identifiers/:did
    ///
    /// # Responses
    /// - 200 OK: `{ didDocument, didResolutionMetadata, didDocumentMetadata }`
    /// - 400 Bad Request: malformed DID or another method
    /// - 502 Bad Gateway: the chain could not be reached or answered malformed data
    /// - 500 Internal Server Error: any other resolution failure
    async fn resolve_did_handler(
        Path(did): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> (StatusCode, Json<Value>) {
        match state.resolver.resolve(&did).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(body) => (StatusCode::OK, Json(body)),
                Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            },
            Err(e) => {
                warn!("resolution of {} failed: {}", did, e);
                error_response(status_for(&e), &e.to_string())
            }
        }
    }
}

fn status_for(error: &DidError) -> StatusCode {
    match error {
        DidError::InvalidDid(_)
        | DidError::UnsupportedMethod(_)
        | DidError::InvalidFieldElement(_) => StatusCode::BAD_REQUEST,
        DidError::Transport { .. } | DidError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}
