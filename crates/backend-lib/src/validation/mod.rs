// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.
//!
//! Identifiers reach the flat-file store as file names, so everything
//! that names a user, event, lobby or room is checked here first.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{AppError, FieldError};

const MAX_ID_LENGTH: usize = 128;

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("id regex is valid"));

/// Collects field errors across a request body
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a required identifier field and return its value when valid
    pub fn id(&mut self, field: &str, value: Option<&str>) -> String {
        match value.map(str::trim) {
            None | Some("") => {
                self.errors
                    .push(FieldError::new(field, format!("{field} is required")));
            },
            Some(value) => match check_id(value) {
                Ok(()) => return value.to_string(),
                Err(message) => self.errors.push(FieldError::new(field, message)),
            },
        }
        String::new()
    }

    /// Record a failure the identifier check does not cover
    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Finish validation, failing with every collected field error
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

fn check_id(value: &str) -> Result<(), String> {
    if value.len() > MAX_ID_LENGTH {
        return Err(format!("must be at most {MAX_ID_LENGTH} characters"));
    }
    if value == "." || value == ".." {
        return Err("must not be a relative path".to_string());
    }
    if !ID_REGEX.is_match(value) {
        return Err("may only contain letters, digits, '_', '.', ':' and '-'".to_string());
    }
    Ok(())
}

/// Validate a single identifier, e.g. a path parameter
pub fn validate_id(field: &str, value: &str) -> Result<String, AppError> {
    let mut validator = Validator::new();
    let value = validator.id(field, Some(value));
    validator.finish()?;
    Ok(value)
}
