//! Bearer-token issuance and verification.
//!
//! Tokens are compact HS256 JWTs carrying the user's id and email plus an
//! expiry and issuer claim. Verification pins the algorithm family (so a
//! token re-signed under a different scheme is rejected) and collapses
//! every failure mode into one opaque error to avoid oracle leakage.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatekey_core::TokenPayload;

/// Errors from the token service.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Malformed, tampered, mis-signed, expired, or missing claims.
    /// Callers must not distinguish the reasons.
    #[error("invalid token")]
    Invalid,
    /// The configured token lifetime string could not be parsed.
    /// Raised at construction time only.
    #[error("invalid token lifetime '{0}'")]
    InvalidTtl(String),
    /// The signer rejected the key material.
    #[error("token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    exp: i64,
    iss: String,
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// The signing secret is read-only after construction, so a single
/// instance is safe to share across request workers.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    issuer: String,
}

impl TokenService {
    /// Creates a token service from the signing secret, a lifetime
    /// duration string (`"90s"`, `"15m"`, `"12h"`, `"1d"`, `"1M"`,
    /// `"1y"`), and the issuer name.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidTtl`] if the lifetime string does not
    /// parse. This is a configuration error and fatal at startup.
    pub fn new(secret: &str, ttl: &str, issuer: &str) -> Result<Self, TokenError> {
        let ttl_secs = parse_duration_secs(ttl)?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            issuer: issuer.to_string(),
        })
    }

    /// Issues a signed token for the given identity, expiring after the
    /// configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the underlying signer rejects
    /// the key material (does not happen with a non-empty secret).
    pub fn issue(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        self.issue_at(payload, Utc::now().timestamp())
    }

    fn issue_at(&self, payload: &TokenPayload, now_secs: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: payload.user_id,
            email: payload.email.clone(),
            exp: now_secs + self.ttl_secs,
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Verifies a token and returns the embedded identity.
    ///
    /// Only the HS256 algorithm is accepted; expiry is checked with zero
    /// leeway, so a token is valid strictly while `now < exp`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] for every failure mode.
    pub fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| TokenError::Invalid)?;
        Ok(TokenPayload::new(data.claims.sub, data.claims.email))
    }
}

/// Parses a duration string with a single-letter unit suffix into seconds.
fn parse_duration_secs(ttl: &str) -> Result<i64, TokenError> {
    let invalid = || TokenError::InvalidTtl(ttl.to_string());
    if !ttl.is_ascii() || ttl.len() < 2 {
        return Err(invalid());
    }
    let (num, unit) = ttl.split_at(ttl.len() - 1);
    let n: i64 = num.parse().map_err(|_| invalid())?;
    if n < 0 {
        return Err(invalid());
    }
    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "M" => 30 * 24 * 60 * 60,
        "y" => 365 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    Ok(n * unit_secs)
}
