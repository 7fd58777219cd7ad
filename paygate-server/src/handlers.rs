//! Axum route handlers.
//!
//! Besides the configured protected routes, the server exposes explicit
//! issue and verify endpoints for collaborators that drive the protocol
//! themselves instead of going through the gate middleware.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use paygate::request::PaymentId;
use paygate::{
    FailureReason, PaymentProof, PaymentRequest, PaymentSpec, VerificationOutcome,
    VerifiedPayment,
};
use paygate_http::PriceTag;
use serde::{Deserialize, Serialize};

use crate::config::RouteConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /payments/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Request being paid.
    pub payment_id: PaymentId,
    /// Reference to the on-chain transfer.
    pub proof: PaymentProof,
}

/// Response of `POST /payments/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Whether the proof was accepted.
    pub verified: bool,
    /// Rejection reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// The consumed request, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<VerifiedPayment>,
}

impl From<VerificationOutcome> for VerifyResponse {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Verified(payment) => Self {
                verified: true,
                reason: None,
                payment: Some(payment),
            },
            VerificationOutcome::Rejected(reason) => Self {
                verified: false,
                reason: Some(reason),
                payment: None,
            },
        }
    }
}

/// `GET /health` - Liveness and configured networks.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut networks: Vec<_> = state
        .gate
        .issuer()
        .config()
        .recipients
        .keys()
        .map(ToString::to_string)
        .collect();
    networks.sort();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "networks": networks,
        "pending": state.store.len(),
    }))
}

/// `POST /payments` - Issues a payment request.
///
/// # Errors
///
/// Returns 400 when the amount or network cannot be served.
pub async fn post_payment(
    State(state): State<AppState>,
    Json(spec): Json<PaymentSpec>,
) -> Result<(StatusCode, Json<PaymentRequest>), ApiError> {
    let request = state.gate.issuer().issue(spec)?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `POST /payments/verify` - Verifies a proof against an outstanding request.
///
/// Always answers 200; the outcome is in the body.
pub async fn post_verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let outcome = state.gate.verify(&body.payment_id, &body.proof).await;
    Json(outcome.into())
}

/// Stand-in for a protected resource: reports the payment that unlocked it.
async fn protected(
    Extension(route): Extension<RouteConfig>,
    Extension(payment): Extension<VerifiedPayment>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "granted",
        "resource": route.path,
        "description": route.description,
        "paymentId": payment.request.id,
        "transactionReference": payment.transaction_reference,
    }))
}

/// Creates the router with the explicit endpoints and every protected route.
///
/// Endpoints:
/// - `GET /health` - liveness
/// - `POST /payments` - issue a payment request
/// - `POST /payments/verify` - verify a proof
/// - `GET <route.path>` - each configured route, behind the payment gate
pub fn router(state: AppState, routes: &[RouteConfig]) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/payments", post(post_payment))
        .route("/payments/verify", post(post_verify));

    for route in routes {
        let price = PriceTag::new(route.amount, route.network)
            .with_description(route.description.clone());
        app = app.route(
            &route.path,
            get(protected)
                .route_layer(state.gate.route(price))
                .route_layer(Extension(route.clone())),
        );
    }

    app.with_state(state)
}
