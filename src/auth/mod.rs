//! Authentication module
//!
//! Credential issuance/verification and password hashing.

pub mod password;
pub mod token;

use thiserror::Error;

pub use self::token::{Claims, Credential, TokenService};

/// Outcomes of a failed authentication attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token supplied")]
    Missing,

    #[error("token signature or payload is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}
