//! Root, API index and credential check endpoints

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::auth::AuthenticatedPharmacy;

/// Plain `{"message": ...}` body used by several endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hello world"))
}

pub async fn api_index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Medlr API v1"))
}

/// Echo the identity carried by the caller's credential
pub async fn protected(Extension(auth): Extension<AuthenticatedPharmacy>) -> String {
    format!("Pharmacy ID: {}", auth.pharmacy_id)
}
