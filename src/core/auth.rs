//! Repository editing capability
//!
//! Editing requires an [`EditToken`], which can only be obtained by passing an
//! [`Authorizer`] check. Tokens carry their own expiry.

use chrono::{DateTime, Duration, Utc};
use miette::Diagnostic;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EditError {
    #[error("repository editing is not configured")]
    #[diagnostic(
        code(podrecon::edit::not_configured),
        help("set editor.password_sha256 in podrecon.yaml")
    )]
    NotConfigured,

    #[error("not authorized to edit the repository")]
    #[diagnostic(code(podrecon::edit::unauthorized))]
    Unauthorized,

    #[error("edit session expired at {expired_at}")]
    #[diagnostic(code(podrecon::edit::expired), help("authorize again to start a new session"))]
    TokenExpired { expired_at: DateTime<Utc> },
}

/// External is-authorized check
pub trait Authorizer {
    fn authorize(&self, secret: &str) -> bool;
}

/// Compares the SHA-256 of a secret against a stored hex digest
#[derive(Debug, Clone)]
pub struct Sha256Authorizer {
    digest: String,
}

impl Sha256Authorizer {
    pub fn new(hex_digest: &str) -> Self {
        Self {
            digest: hex_digest.trim().to_ascii_lowercase(),
        }
    }

    /// Build from an optional configured digest
    pub fn from_config(hex_digest: Option<&str>) -> Result<Self, EditError> {
        match hex_digest.map(str::trim) {
            Some(d) if !d.is_empty() => Ok(Self::new(d)),
            _ => Err(EditError::NotConfigured),
        }
    }
}

impl Authorizer for Sha256Authorizer {
    fn authorize(&self, secret: &str) -> bool {
        constant_time_eq(hash_secret(secret).as_bytes(), self.digest.as_bytes())
    }
}

/// Lowercase hex SHA-256 of a secret
pub fn hash_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Proof of a successful authorization, valid until `expires_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditToken {
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl EditToken {
    pub fn grant(
        authorizer: &dyn Authorizer,
        secret: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, EditError> {
        if !authorizer.authorize(secret) {
            tracing::warn!("edit authorization refused");
            return Err(EditError::Unauthorized);
        }
        Ok(Self {
            issued_at: now,
            expires_at: now + ttl,
        })
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Fail with [`EditError::TokenExpired`] once past expiry
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), EditError> {
        if self.is_valid_at(now) {
            Ok(())
        } else {
            Err(EditError::TokenExpired {
                expired_at: self.expires_at,
            })
        }
    }
}
