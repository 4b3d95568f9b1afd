//! Decode-only JWT inspection.
//!
//! The client never verifies signatures; the server's 401 is the real
//! security boundary. Reading `exp` here only lets us log out proactively
//! instead of waiting for a failed call.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Expiry instant from the token's `exp` claim, if one can be decoded.
///
/// Any malformed token, payload, or claim yields `None`; the token is
/// then trusted until the server rejects it.
#[must_use]
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;

    let claims: Claims = match serde_json::from_slice(&bytes) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "token payload is not valid JSON");
            return None;
        }
    };

    claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
}

#[cfg(test)]
pub mod testing {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    /// Builds an unsigned token with the given `exp` claim for tests.
    #[must_use]
    pub fn token_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"test","exp":{exp}}}"#));
        format!("{header}.{payload}.sig")
    }
}
