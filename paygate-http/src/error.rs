//! Error types for the HTTP gate.

use http::StatusCode;
use paygate::FailureReason;
use paygate::error::IssueError;

/// Errors decoding a payment proof header.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Base64 decoding failed.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A header value is not visible ASCII.
    #[error("Header {0} is not valid ASCII")]
    InvalidHeader(&'static str),

    /// A proof was sent without the payment id it belongs to.
    #[error("Header {0} is missing")]
    MissingHeader(&'static str),
}

/// A gate outcome that is not a payment demand.
///
/// Faults mean the server could not decide whether the client paid, so they
/// are reported as errors rather than answered with a fresh 402.
#[derive(Debug, thiserror::Error)]
pub enum GateFault {
    /// The proof headers could not be decoded.
    #[error("Malformed payment proof: {0}")]
    MalformedProof(#[from] HttpError),
    /// Verification ended with an infrastructure reason.
    #[error("{}", .0.message())]
    Verification(FailureReason),
    /// A new payment request could not be issued.
    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl GateFault {
    /// Machine-readable reason code.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MalformedProof(_) => FailureReason::MalformedProof.as_str(),
            Self::Verification(reason) => reason.as_str(),
            Self::Issue(_) => "issue_failed",
        }
    }

    /// HTTP status the fault is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedProof(_) | Self::Verification(FailureReason::MalformedProof) => {
                StatusCode::BAD_REQUEST
            }
            Self::Verification(FailureReason::ChainUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Verification(_) | Self::Issue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
