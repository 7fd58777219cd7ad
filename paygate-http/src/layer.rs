//! Per-route tower payment gate middleware.
//!
//! [`AccessGate::route`] creates a [`PaymentGateLayer`] that plugs into
//! axum's `.layer()` on individual routes. Each route carries its own
//! [`PriceTag`]; axum does the routing.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use paygate::Network;
//! use paygate_http::{AccessGate, PriceTag};
//!
//! let gate = AccessGate::new(issuer, verifier);
//! let app: Router = Router::new().route(
//!     "/report",
//!     get(report_handler).layer(gate.route(
//!         PriceTag::new("0.10".parse()?, Network::Base).with_description("Daily report"),
//!     )),
//! );
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::body::Body;
use http::header::{ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_TYPE, HeaderValue};
use http::{Request, Response, StatusCode};
use serde::Serialize;
use tower::{Layer, Service};

use crate::body::FaultBody;
use crate::constants::{PAYMENT_VERIFIED_HEADER, VERIFICATION_FAILED};
use crate::error::GateFault;
use crate::gate::{AccessGate, GateDecision, PriceTag};

/// Shared state for a single payment-protected route.
#[derive(Debug)]
struct RouteShared {
    gate: AccessGate,
    price: Arc<PriceTag>,
}

/// Per-route tower [`Layer`] that demands payment before the wrapped service.
///
/// Created by [`AccessGate::route`].
#[derive(Clone, Debug)]
pub struct PaymentGateLayer {
    shared: Arc<RouteShared>,
}

impl PaymentGateLayer {
    /// Creates a layer charging `price` through `gate`.
    #[must_use]
    pub fn new(gate: AccessGate, price: Arc<PriceTag>) -> Self {
        Self {
            shared: Arc::new(RouteShared { gate, price }),
        }
    }

    /// The route's price.
    #[must_use]
    pub fn price(&self) -> &PriceTag {
        &self.shared.price
    }
}

impl<S> Layer<S> for PaymentGateLayer {
    type Service = PaymentGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PaymentGateService {
            inner,
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Per-route tower [`Service`] enforcing payment.
///
/// Created by [`PaymentGateLayer`]. On a verified proof the wrapped service
/// is called exactly once with the [`VerifiedPayment`](paygate::VerifiedPayment)
/// in the request extensions; otherwise it is never called.
#[derive(Clone)]
pub struct PaymentGateService<S> {
    inner: S,
    shared: Arc<RouteShared>,
}

impl<S> std::fmt::Debug for PaymentGateService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateService")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

impl<S> Service<Request<Body>> for PaymentGateService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let shared = Arc::clone(&self.shared);
        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let decision = shared.gate.gate(req.headers(), &shared.price).await;
            match decision {
                GateDecision::Pass(payment) => {
                    let verified = HeaderValue::from_str(payment.request.id.as_str()).ok();
                    req.extensions_mut().insert(payment);
                    let mut response = inner.call(req).await?;
                    if let Some(value) = verified {
                        let headers = response.headers_mut();
                        headers.insert(PAYMENT_VERIFIED_HEADER, value);
                        headers.insert(
                            ACCESS_CONTROL_EXPOSE_HEADERS,
                            HeaderValue::from_static(PAYMENT_VERIFIED_HEADER),
                        );
                    }
                    Ok(response)
                }
                GateDecision::Gated(body) => {
                    Ok(json_response(StatusCode::PAYMENT_REQUIRED, &body))
                }
                GateDecision::Fault(fault) => Ok(fault_response(&fault)),
            }
        })
    }
}

/// Creates the JSON response for a gate fault.
#[must_use]
pub fn fault_response(fault: &GateFault) -> Response<Body> {
    let body = FaultBody {
        error: VERIFICATION_FAILED.to_owned(),
        reason: fault.reason().to_owned(),
        details: fault.to_string(),
    };
    json_response(fault.status_code(), &body)
}

/// Creates a JSON response with the given status.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let json = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Body::from(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
