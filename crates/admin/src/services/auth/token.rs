//! Signed admin session tokens.
//!
//! Admin tokens are HS256 JWTs signed with the admin secret and marked
//! `is_admin`. Their `jti` is recorded in `admin.admin_token`; removing the
//! row revokes the token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use amazon_clone_core::AdminId;

/// Cookie carrying the admin session token.
pub const ADMIN_COOKIE: &str = "AdminToken";

/// Lifetime of an admin session.
pub const ADMIN_TOKEN_TTL: Duration = Duration::hours(24);

/// JWT claims for an admin session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin id, as a decimal string.
    pub sub: String,
    /// Always true on tokens minted here.
    #[serde(default)]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl AdminClaims {
    /// The admin this token names, if it is an admin token with a valid `sub`.
    #[must_use]
    pub fn admin_id(&self) -> Option<AdminId> {
        if !self.is_admin {
            return None;
        }
        self.sub.parse().ok()
    }
}

/// A freshly minted token and the id it must be stored under.
#[derive(Debug, Clone)]
pub struct IssuedAdminToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Keys for signing and verifying admin tokens.
#[derive(Clone)]
pub struct AdminKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AdminKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Mint a token for `admin_id` valid for [`ADMIN_TOKEN_TTL`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be signed.
    pub fn issue(
        &self,
        admin_id: AdminId,
        now: DateTime<Utc>,
    ) -> Result<IssuedAdminToken, jsonwebtoken::errors::Error> {
        let expires_at = now + ADMIN_TOKEN_TTL;
        let claims = AdminClaims {
            sub: admin_id.to_string(),
            is_admin: true,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedAdminToken {
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
    pub fn verify(&self, token: &str) -> Result<AdminClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AdminClaims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}
