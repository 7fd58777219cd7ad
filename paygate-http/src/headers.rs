//! Encoding and decoding of the `x-payment-proof` header.

use base64::prelude::*;
use http::HeaderMap;
use paygate::PaymentProof;

use crate::error::HttpError;

/// Decodes an `x-payment-proof` header value.
///
/// A value starting with `{` is read as JSON; anything else is treated as
/// Base64-encoded JSON.
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure, including an
/// unknown network name.
pub fn decode_payment_proof(header_value: &str) -> Result<PaymentProof, HttpError> {
    let trimmed = header_value.trim();
    if trimmed.starts_with('{') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let bytes = BASE64_STANDARD.decode(trimmed)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encodes a [`PaymentProof`] as Base64 JSON for the `x-payment-proof` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment_proof(proof: &PaymentProof) -> Result<String, HttpError> {
    let json = serde_json::to_vec(proof)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Reads an optional header as a trimmed, non-empty string.
pub(crate) fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, HttpError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| HttpError::InvalidHeader(name))
        })
        .transpose()
        .map(|value| value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use paygate::Network;

    use super::*;

    #[test]
    fn test_decode_plain_json() {
        let proof =
            decode_payment_proof(r#" {"transactionReference":"0xabc","network":"base"} "#).unwrap();
        assert_eq!(proof, PaymentProof::new("0xabc", Network::Base));
    }

    #[test]
    fn test_decode_base64_json() {
        let mut expected = PaymentProof::new("5Sig", Network::SolanaDevnet);
        expected.block_number = Some(99);
        let encoded = encode_payment_proof(&expected).unwrap();
        assert_eq!(decode_payment_proof(&encoded).unwrap(), expected);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_payment_proof("not base64!"),
            Err(HttpError::Base64(_))
        ));
        assert!(matches!(
            decode_payment_proof("{\"network\":\"base\"}"),
            Err(HttpError::Serialize(_))
        ));
        assert!(matches!(
            decode_payment_proof(r#"{"transactionReference":"0x1","network":"mars"}"#),
            Err(HttpError::Serialize(_))
        ));
    }

    #[test]
    fn test_header_str_trims_and_skips_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-payment-id", " pay_1 ".parse().unwrap());
        headers.insert("x-payment-proof", "".parse().unwrap());
        assert_eq!(header_str(&headers, "x-payment-id").unwrap(), Some("pay_1"));
        assert_eq!(header_str(&headers, "x-payment-proof").unwrap(), None);
        assert_eq!(header_str(&headers, "x-other").unwrap(), None);
    }
}
