use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{ServiceError, ServiceResult};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,30}$").expect("valid username regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed, non-blank value of a required field
pub fn required<'a>(field: &str, value: &'a str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::bad_input(format!("{} is required", field)));
    }
    Ok(trimmed)
}

/// Trimmed value of an optional field; blank becomes `None`
pub fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn username(value: &str) -> ServiceResult<&str> {
    let value = required("Username", value)?;
    if !USERNAME_RE.is_match(value) {
        return Err(ServiceError::bad_input(
            "Username must be 3-30 characters of letters, digits, '_' or '.'",
        ));
    }
    Ok(value)
}

pub fn email(value: &str) -> ServiceResult<&str> {
    let value = required("Email", value)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(value),
        _ => Err(ServiceError::bad_input("Email address is invalid")),
    }
}

pub fn password(value: &str) -> ServiceResult<&str> {
    if value.trim().is_empty() {
        return Err(ServiceError::bad_input("Password is required"));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::bad_input(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(value)
}
