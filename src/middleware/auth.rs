//! Authentication middleware
//!
//! Verifies the bearer credential before a protected handler runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::{auth::AuthError, error::AppError, routes::metrics::record_auth_attempt, AppState};

/// Identity attached to requests that passed verification
#[derive(Debug, Clone)]
pub struct AuthenticatedPharmacy {
    pub pharmacy_id: String,
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Authentication middleware
///
/// This middleware:
/// 1. Extracts the credential from the Authorization header
/// 2. Verifies signature and expiry
/// 3. Adds AuthenticatedPharmacy to request extensions
///
/// Any failure short-circuits with 401; the wrapped handler never runs.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_header) = request.headers().get(header::AUTHORIZATION) else {
        record_auth_attempt("missing");
        return Err(AppError::AuthMissing);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| {
            record_auth_attempt("invalid");
            AppError::AuthInvalid
        })?;

    let pharmacy_id = match state.tokens.verify(token) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Credential rejected");
            record_auth_attempt(match e {
                AuthError::Missing => "missing",
                AuthError::Expired => "expired",
                _ => "invalid",
            });
            return Err(e.into());
        }
    };

    debug!(pharmacy_id = %pharmacy_id, "Request authenticated");
    record_auth_attempt("ok");

    request
        .extensions_mut()
        .insert(AuthenticatedPharmacy { pharmacy_id });

    Ok(next.run(request).await)
}
