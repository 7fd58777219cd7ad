//! Error types for the payment gate server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paygate::Network;
use paygate::error::IssueError;
use paygate_evm::EvmConfigError;
use paygate_svm::SvmConfigError;

use crate::config::ConfigError;

/// Errors raised while assembling the server from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An account-chain verifier could not be built.
    #[error("{network}: {source}")]
    Evm {
        /// Network being configured.
        network: Network,
        /// The underlying configuration error.
        #[source]
        source: EvmConfigError,
    },

    /// A ledger-chain verifier could not be built.
    #[error("{network}: {source}")]
    Svm {
        /// Network being configured.
        network: Network,
        /// The underlying configuration error.
        #[source]
        source: SvmConfigError,
    },

    /// No asset is known for the network and none was configured.
    #[error("No stable-coin asset known for {0}; set `asset` in its network section")]
    MissingAsset(Network),
}

/// Errors returned by the explicit issue/verify endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The payment request could not be issued.
    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Issue(_) => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
