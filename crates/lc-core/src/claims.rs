//! Unsigned decoding of bearer-token claims
//!
//! Tokens are dot-delimited strings whose middle segment is base64url JSON.
//! Signatures are not checked: every token decoded here was just issued by
//! the authority the caller talked to.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::ParseError;

/// URL-safe engine that accepts the payload with or without `=` padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claim map decoded from a token payload
pub type Claims = Map<String, Value>;

/// Decode the payload segment of `token` into a claim map
pub fn decode_claims(token: &str) -> Result<Claims, ParseError> {
    let payload = payload_bytes(token)?;
    serde_json::from_slice(&payload).map_err(|e| ParseError::new("token claims", e))
}

/// Decode the payload segment of `token` into a typed claim set
pub fn decode_claims_as<T: DeserializeOwned>(token: &str) -> Result<T, ParseError> {
    let payload = payload_bytes(token)?;
    serde_json::from_slice(&payload).map_err(|e| ParseError::new("token claims", e))
}

/// Build an unsigned token carrying `claims`
///
/// The header is fixed to `{"alg":"none"}` and the signature segment is empty.
pub fn encode_unsigned(claims: &Value) -> String {
    let header = PAYLOAD_ENGINE.encode(br#"{"alg":"none"}"#);
    let payload = PAYLOAD_ENGINE.encode(claims.to_string());
    format!("{header}.{payload}.")
}

fn payload_bytes(token: &str) -> Result<Vec<u8>, ParseError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ParseError::missing("token", "payload segment"))?;

    PAYLOAD_ENGINE
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ParseError::new("token payload", e))
}
