use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use snapshare_types::TokenClaims;

use crate::service::ServiceError;

const BEARER_PREFIX: &str = "Bearer ";

/// Stateless access-token issuer and verifier.
///
/// Tokens are HS256 JWTs carrying [`TokenClaims`]. Nothing is stored on the
/// server: a token is valid as long as its signature checks out and it has
/// not expired.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service
    ///
    /// # Arguments
    /// * `secret` - The shared HMAC secret
    /// * `ttl_hours` - How long issued tokens stay valid
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, user_id: i64, username: &str) -> Result<String> {
        self.issue_at(user_id, username, Utc::now())
    }

    pub(crate) fn issue_at(&self, user_id: i64, username: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign access token")
    }

    /// Verify a token and return the user ID it was issued for
    ///
    /// Bad signatures, malformed tokens and expired tokens all fail the same way.
    pub fn verify(&self, token: &str) -> Result<i64, ServiceError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.user_id)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                ServiceError::Unauthenticated("Not authenticated".to_string())
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 24)
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service();
        let token = tokens.issue(7, "ada").unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), 7);

        let claims = TokenClaims::decode_unverified(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().issue(7, "ada").unwrap();
        let other = TokenService::new("another-secret", 24);

        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated(ref msg) if msg == "Not authenticated"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at(7, "ada", Utc::now() - Duration::hours(25))
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(service().verify("not.a.jwt").is_err());
        assert!(service().verify("").is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(Some("Bearer   ")), None);
        assert_eq!(bearer_token(Some("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(Some("abc.def.ghi")), None);
        assert_eq!(bearer_token(None), None);
    }
}
