//! Solana JSON-RPC access.
//!
//! [`LedgerRpc`] is the single read the verifier needs: fetch a confirmed
//! transaction in `jsonParsed` encoding. [`JsonRpcLedgerClient`] implements it
//! over plain HTTP with `reqwest`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use solana_signature::Signature;
use url::Url;

use crate::error::{LedgerRpcError, SvmConfigError};
use crate::types::ParsedTransaction;

/// Commitment level used when reading transactions.
pub const DEFAULT_COMMITMENT: &str = "confirmed";

/// Read-only RPC surface of a ledger chain.
pub trait LedgerRpc: Send + Sync {
    /// Transport error type.
    type Error: fmt::Display + Send;

    /// Fetches a transaction by signature; `None` when the node does not know it.
    fn transaction(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<Option<ParsedTransaction>, Self::Error>> + Send;
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client for a Solana node.
#[derive(Clone, Debug)]
pub struct JsonRpcLedgerClient {
    url: Url,
    client: Client,
    commitment: &'static str,
}

impl JsonRpcLedgerClient {
    /// Creates a client whose requests are aborted after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SvmConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn try_new(url: Url, timeout: Duration) -> Result<Self, SvmConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SvmConfigError::HttpClient(e.to_string()))?;
        #[cfg(feature = "telemetry")]
        tracing::info!(rpc_url = %url, "Using Solana JSON-RPC transport");
        Ok(Self {
            url,
            client,
            commitment: DEFAULT_COMMITMENT,
        })
    }

    /// Uses `finalized` instead of `confirmed` commitment.
    #[must_use]
    pub const fn finalized(mut self) -> Self {
        self.commitment = "finalized";
        self
    }

    /// The node URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    async fn call<R>(
        &self,
        context: &'static str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<R>, LedgerRpcError>
    where
        R: serde::de::DeserializeOwned,
    {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| LedgerRpcError::Http { context, source })?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(LedgerRpcError::HttpStatus { context, status });
        }
        let envelope: RpcResponse<R> = response
            .json()
            .await
            .map_err(|source| LedgerRpcError::JsonDeserialization { context, source })?;
        if let Some(error) = envelope.error {
            return Err(LedgerRpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result)
    }
}

impl LedgerRpc for JsonRpcLedgerClient {
    type Error = LedgerRpcError;

    async fn transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<ParsedTransaction>, LedgerRpcError> {
        let params = json!([
            signature.to_string(),
            {
                "encoding": "jsonParsed",
                "commitment": self.commitment,
                "maxSupportedTransactionVersion": 0,
            }
        ]);
        self.call("getTransaction", "getTransaction", params).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn signature() -> Signature {
        Signature::from([7u8; 64])
    }

    async fn client(server: &MockServer) -> JsonRpcLedgerClient {
        JsonRpcLedgerClient::try_new(server.uri().parse().unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_transaction_sends_parsed_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "getTransaction",
                "params": [signature().to_string(), {
                    "encoding": "jsonParsed",
                    "commitment": "confirmed",
                    "maxSupportedTransactionVersion": 0
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "slot": 7,
                    "meta": { "err": null },
                    "transaction": { "message": { "instructions": [] }, "signatures": [] }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tx = client(&server).await.transaction(&signature()).await.unwrap();
        let tx = tx.unwrap();
        assert_eq!(tx.slot, 7);
        assert!(tx.succeeded());
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": null })),
            )
            .mount(&server)
            .await;

        let tx = client(&server).await.transaction(&signature()).await.unwrap();
        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32005, "message": "Node is behind" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .transaction(&signature())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerRpcError::Rpc { code: -32005, .. }));
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .transaction(&signature())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerRpcError::HttpStatus {
                status: StatusCode::TOO_MANY_REQUESTS,
                ..
            }
        ));
    }
}
