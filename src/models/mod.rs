//! Entity models and request payloads
//!
//! Payload validation checks input shape only: required fields present and
//! non-empty, emails well-formed, passwords long enough.

pub mod medicine;
pub mod pharmacy;
pub mod user;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult, FieldError};

pub use self::medicine::{Medicine, MedicineInput, MedicineView};
pub use self::pharmacy::{Address, Pharmacy, PharmacyInput};
pub use self::user::{LoginRequest, RegisterRequest, User};

/// Loose email shape: something@something.tld, no whitespace
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Collects field errors and turns them into a single validation failure
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field must be present and non-blank
    pub fn required(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            Some(_) => self.errors.push(FieldError::new(field, "must not be empty")),
            None => self.errors.push(FieldError::new(field, "is required")),
        }
        self
    }

    /// Field, when present, must be non-blank
    pub fn non_empty(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            self.errors.push(FieldError::new(field, "must not be empty"));
        }
        self
    }

    /// Field, when present, must look like an email address
    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if !is_valid_email(v) {
                self.errors.push(FieldError::new(field, "Invalid email address"));
            }
        }
        self
    }

    /// Field, when present, must have at least `min` characters
    pub fn min_len(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.errors.push(FieldError::new(
                    field,
                    format!("must be at least {} characters", min),
                ));
            }
        }
        self
    }

    pub fn finish(&mut self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
