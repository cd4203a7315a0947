use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by an access token.
///
/// The server signs and verifies these; clients only peek at them through
/// [`TokenClaims::decode_unverified`] to know who is logged in and whether
/// the stored token has already expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not valid claims JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenClaims {
    /// Read the payload segment without checking the signature.
    pub fn decode_unverified(token: &str) -> Result<Self, ClaimsError> {
        let mut parts = token.trim().split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ClaimsError::Malformed);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.exp <= now_unix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_token(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_unverified_reads_claims() {
        let token = fake_token(r#"{"userId":9,"username":"ada","iat":100,"exp":200}"#);
        let claims = TokenClaims::decode_unverified(&token).unwrap();

        assert_eq!(claims.user_id, 9);
        assert_eq!(claims.username, "ada");
        assert!(!claims.is_expired_at(199));
        assert!(claims.is_expired_at(200));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            TokenClaims::decode_unverified("not-a-token"),
            Err(ClaimsError::Malformed)
        ));
        assert!(matches!(
            TokenClaims::decode_unverified("a.b.c.d"),
            Err(ClaimsError::Malformed)
        ));
        assert!(matches!(
            TokenClaims::decode_unverified("a.%%%.c"),
            Err(ClaimsError::Encoding(_))
        ));
        let token = fake_token(r#"{"hello":"world"}"#);
        assert!(matches!(
            TokenClaims::decode_unverified(&token),
            Err(ClaimsError::Json(_))
        ));
    }
}
