//! Signed session token issuance and verification (HS256 JWT).
//!
//! Tokens are bearer credentials with a fixed TTL. Select/switch/clear tenant
//! are implemented as reissues with different claims; nothing is revoked
//! server-side — old tokens simply expire.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use praxis_core::{IdentityId, TenantId};

use crate::SessionClaims;

/// Default session lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// HS256 issuer/verifier with a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for `identity_id`, optionally bound to a tenant.
    pub fn issue(
        &self,
        identity_id: IdentityId,
        tenant_id: Option<TenantId>,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: identity_id,
            tenant_id,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.encode(&claims)
    }

    /// Encode arbitrary claims (tests use this to mint expired tokens).
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);
        validation.leeway = 0;

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(b"test-secret", Duration::hours(1))
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let codec = codec();
        let identity = IdentityId::new();
        let tenant = TenantId::new();

        let token = codec.issue(identity, Some(tenant)).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, identity);
        assert_eq!(claims.tenant_id, Some(tenant));
        assert!(claims.expires_at > claims.issued_at);
    }

    #[test]
    fn tenant_less_token_roundtrips() {
        let codec = codec();
        let token = codec.issue(IdentityId::new(), None).unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.tenant_id, None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: IdentityId::new(),
            tenant_id: None,
            issued_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
        };
        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = codec().issue(IdentityId::new(), None).unwrap();
        let other = Hs256TokenCodec::new(b"other-secret", Duration::hours(1));
        assert_eq!(other.verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn garbage_is_malformed() {
        let result = codec().verify("not-a-jwt");
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }
}
