//! Middleware module
//!
//! Contains the credential-checking interceptor for protected routes.

pub mod auth;
