//! Custom field validators for the `validator` derive.
//!
//! Thin adapters over the `velvet_core` checks so request DTOs and the
//! in-memory catalog reject exactly the same inputs.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;
use velvet_core::error::CoreError;
use velvet_core::listing::{validate_city, validate_media_kind, validate_services};

/// Letters (Latin or Cyrillic), whitespace and hyphens.
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Zа-яА-ЯёЁ\s-]+$").expect("valid regex"));

/// E.164-like: optional `+`, no leading zero, 2 to 15 digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid regex"));

pub fn listing_name(name: &str) -> Result<(), ValidationError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(error(
            "name",
            "Name can only contain letters, spaces and hyphens",
        ))
    }
}

pub fn phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(error("phone", "Invalid phone number format"))
    }
}

pub fn city(city: &str) -> Result<(), ValidationError> {
    validate_city(city).map_err(|e| from_core("city", e))
}

pub fn services(services: &[String]) -> Result<(), ValidationError> {
    validate_services(services).map_err(|e| from_core("services", e))
}

pub fn media_kind(kind: &str) -> Result<(), ValidationError> {
    validate_media_kind(kind).map_err(|e| from_core("kind", e))
}

/// At least one lowercase letter, one uppercase letter and one digit.
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    let lower = password.chars().any(|c| c.is_lowercase());
    let upper = password.chars().any(|c| c.is_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if lower && upper && digit {
        Ok(())
    } else {
        Err(error(
            "password_strength",
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        ))
    }
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn from_core(code: &'static str, err: CoreError) -> ValidationError {
    let message = match err {
        CoreError::Validation(msg) => msg,
        other => other.to_string(),
    };
    ValidationError::new(code).with_message(Cow::Owned(message))
}
