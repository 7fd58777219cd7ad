//! HTTP header names used by the payment gate.

/// Request header carrying the payment request id (client → server).
pub const PAYMENT_ID_HEADER: &str = "x-payment-id";

/// Request header carrying the payment proof (client → server).
///
/// The value is a JSON object `{transactionReference, network, blockNumber?,
/// timestamp?}`, either verbatim or Base64-encoded.
pub const PAYMENT_PROOF_HEADER: &str = "x-payment-proof";

/// Response header carrying the id of the payment that unlocked the resource.
pub const PAYMENT_VERIFIED_HEADER: &str = "x-payment-verified";

/// Generic error text of gate fault responses.
pub const VERIFICATION_FAILED: &str = "Payment verification failed";
