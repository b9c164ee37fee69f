//! User accounts

use serde::{Deserialize, Serialize};

use super::Validator;
use crate::error::AppResult;

const MIN_PASSWORD_LENGTH: usize = 6;

/// A stored user. `password` is an Argon2 PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User fields as written on registration
#[derive(Debug, Serialize)]
pub(crate) struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        Validator::new()
            .required("username", self.username.as_deref())
            .required("email", self.email.as_deref())
            .email("email", self.email.as_deref())
            .required("password", self.password.as_deref())
            .min_len("password", self.password.as_deref(), MIN_PASSWORD_LENGTH)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        Validator::new()
            .required("email", self.email.as_deref())
            .email("email", self.email.as_deref())
            .required("password", self.password.as_deref())
            .min_len("password", self.password.as_deref(), MIN_PASSWORD_LENGTH)
            .finish()
    }
}
