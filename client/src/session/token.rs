//! Reading JWT claims on the client.
//!
//! Signatures are not verified: the payload is only used to decide when to
//! refresh, never to grant anything.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::Value;
use thiserror::Error;

use crate::config::REFRESH_THRESHOLD_SECS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not base64url")]
    Encoding,
    #[error("token payload is not a JSON object")]
    Payload,
    #[error("token has no numeric exp claim")]
    MissingExpiry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    /// Seconds since the epoch.
    pub exp: i64,
    pub jti: Option<String>,
    pub user_id: Option<Value>,
    pub token_type: Option<String>,
}

pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;
    let value: Value = serde_json::from_slice(&decoded).map_err(|_| TokenError::Payload)?;
    let object = value.as_object().ok_or(TokenError::Payload)?;

    let exp = object
        .get("exp")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.floor() as i64)))
        .ok_or(TokenError::MissingExpiry)?;

    Ok(Claims {
        exp,
        jti: object.get("jti").and_then(Value::as_str).map(str::to_string),
        user_id: object.get("user_id").cloned(),
        token_type: object
            .get("token_type")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// `exp` strictly in the future.
pub fn is_valid_at(token: &str, now: i64) -> bool {
    decode_claims(token).map(|c| c.exp > now).unwrap_or(false)
}

/// Inside the refresh window, already expired, or unreadable.
pub fn is_expiring_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp.saturating_sub(now) < REFRESH_THRESHOLD_SECS,
        Err(_) => true,
    }
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

#[cfg(test)]
pub(crate) fn token_expiring_in(secs: i64) -> String {
    encode_test_token(serde_json::json!({
        "token_type": "access",
        "exp": now_secs() + secs,
        "jti": format!("jti-{}", secs),
        "user_id": 7
    }))
}
