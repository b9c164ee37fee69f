//! Credential issuance and verification
//!
//! Credentials are HS256-signed JWTs carrying the authenticated pharmacy's
//! identifier in the `sub` claim plus `iat`/`exp`.

use anyhow::{bail, Result};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;

/// Claims embedded in every credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the authenticated pharmacy
    #[serde(rename = "sub")]
    pub subject_id: String,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiry (unix timestamp)
    pub exp: i64,
}

/// A signed credential handed to the client on login
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies signed credentials
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl TokenService {
    /// Create a token service from the shared signing secret.
    ///
    /// An empty secret is a startup error.
    pub fn new(secret: &str, ttl_seconds: u64) -> Result<Self> {
        if secret.trim().is_empty() {
            bail!("signing secret must not be empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
        })
    }

    /// Issue a credential for `subject_id`, valid for the configured lifetime
    pub fn issue(&self, subject_id: &str) -> Result<Credential, AuthError> {
        self.issue_at(subject_id, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        subject_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Credential, AuthError> {
        let iat = issued_at.timestamp();
        let exp = iat.saturating_add(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX));

        let claims = Claims {
            subject_id: subject_id.to_string(),
            iat,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Ok(Credential { token, expires_at })
    }

    /// Verify a raw token and return the subject it asserts
    ///
    /// Signature is checked before expiry, so a tampered expired token is
    /// reported as `Invalid`.
    pub fn verify(&self, raw_token: &str) -> Result<String, AuthError> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(AuthError::Missing);
        }

        let data = jsonwebtoken::decode::<Claims>(raw_token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    debug!(error = %e, "Token rejected");
                    AuthError::Invalid
                }
            })?;

        if data.claims.subject_id.is_empty() {
            return Err(AuthError::Invalid);
        }

        Ok(data.claims.subject_id)
    }
}
