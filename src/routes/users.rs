//! Registration and login
//!
//! Login is the only place credentials are issued.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use super::{metrics::record_auth_attempt, root::MessageResponse};
use crate::{
    auth::{
        password::{hash_password, verify_password},
        Credential,
    },
    error::{AppError, AppResult},
    models::{user::NewUser, LoginRequest, RegisterRequest, User},
    store::{collections::USERS, from_document, to_document, StoreError},
    AppState,
};

/// Fields no two accounts may share
const UNIQUE_USER_FIELDS: [&str; 2] = ["email", "username"];

fn duplicate(field: &str) -> AppError {
    match field {
        "email" => AppError::Conflict("Email already registered".to_string()),
        _ => AppError::Conflict("Username already taken".to_string()),
    }
}

/// Hashing is CPU-bound; keep it off the async workers
async fn run_blocking<T, F>(task: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password task failed: {}", e)))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload?;
    request.validate()?;

    let username = request.username.unwrap_or_default();
    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    if state
        .store
        .find_one_by_field(USERS, "email", &email)
        .await?
        .is_some()
    {
        return Err(duplicate("email"));
    }
    if state
        .store
        .find_one_by_field(USERS, "username", &username)
        .await?
        .is_some()
    {
        return Err(duplicate("username"));
    }

    let hashed = run_blocking(move || hash_password(&password)).await??;

    let user = NewUser {
        username: &username,
        email: &email,
        password: hashed,
    };
    // Uniqueness is decided here; the lookups above are a fast path
    let doc = match state
        .store
        .insert_unique(USERS, to_document(&user)?, &UNIQUE_USER_FIELDS)
        .await
    {
        Ok(doc) => doc,
        Err(StoreError::Duplicate(field)) => return Err(duplicate(&field)),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = ?doc.get("_id"), "User registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<Credential>> {
    let Json(request) = payload?;
    request.validate()?;

    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let Some(doc) = state.store.find_one_by_field(USERS, "email", &email).await? else {
        warn!("Login for unknown email");
        record_auth_attempt("rejected");
        return Err(AppError::InvalidCredentials);
    };
    let user: User = from_document(doc)?;

    let hash = user.password.clone();
    if !run_blocking(move || verify_password(&password, &hash)).await? {
        warn!(user_id = %user.id, "Login with wrong password");
        record_auth_attempt("rejected");
        return Err(AppError::InvalidCredentials);
    }

    let credential = state.tokens.issue(&user.id)?;
    record_auth_attempt("issued");
    info!(user_id = %user.id, "Credential issued");

    Ok(Json(credential))
}
