//! Signed customer session tokens.
//!
//! Tokens are HS256 JWTs carrying a random `jti`. The `jti` is also stored in
//! `storefront.user_token`; a token is only honoured while that row exists, so
//! logout revokes exactly the presented token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use amazon_clone_core::UserId;

/// Cookie carrying the customer session token.
pub const SESSION_COOKIE: &str = "AmazonClone";

/// Lifetime of a customer session.
pub const SESSION_TTL: Duration = Duration::minutes(60);

/// JWT claims for a customer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id, as a decimal string.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

/// A freshly minted token and the id it must be stored under.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Keys for signing and verifying customer session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Mint a token for `user_id` valid for [`SESSION_TTL`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be signed.
    pub fn issue(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, jsonwebtoken::errors::Error> {
        let expires_at = now + SESSION_TTL;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedSession {
            token,
            jti: claims.jti,
            expires_at,
        })
    }

    /// Check the signature and expiry of a presented token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

impl SessionClaims {
    /// The user this token was issued to, if `sub` is well formed.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}
