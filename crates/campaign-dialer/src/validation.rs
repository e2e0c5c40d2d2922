//! Field rules shared by user, contact and call request handling.

use std::sync::OnceLock;

use regex::Regex;

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern compiles"))
}

/// E.164-shaped number: optional `+`, no leading zero, 2 to 15 digits.
pub fn is_valid_phone(phone_number: &str) -> bool {
    !phone_number.is_empty() && phone_pattern().is_match(phone_number)
}

pub fn validate_phone(phone_number: &str) -> Result<(), String> {
    if is_valid_phone(phone_number) {
        Ok(())
    } else {
        Err(format!("Invalid phone number format: {phone_number}"))
    }
}

pub fn normalize_email(email: &str) -> Result<String, String> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err("Valid email address is required".to_string());
    }
    Ok(trimmed.to_lowercase())
}

pub fn normalize_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return Err("Name must be at least 2 characters long".to_string());
    }
    Ok(trimmed.to_string())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }
    Ok(())
}

/// Trims and drops blank optional text.
pub fn blank_as_none(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
