use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::utils::error::AppError;

/// Unwraps a JSON body, turning extractor rejections into the API error envelope.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

/// Query-string counterpart of [`json_body`].
pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

/// `true`/`1`/`yes` or `false`/`0`/`no`; blank and `all` mean unset.
pub fn parse_flag(field: &str, value: Option<&str>) -> Result<Option<bool>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty() && *v != "all") {
        None => Ok(None),
        Some(v) if ["true", "1", "yes"].iter().any(|t| v.eq_ignore_ascii_case(t)) => Ok(Some(true)),
        Some(v) if ["false", "0", "no"].iter().any(|f| v.eq_ignore_ascii_case(f)) => Ok(Some(false)),
        Some(other) => Err(AppError::ValidationError(format!(
            "{} must be true or false, got '{}'",
            field, other
        ))),
    }
}

pub fn require_non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Loose check: something before an `@`, and a dot somewhere after it.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub fn require_email(field: &str, value: &str) -> Result<String, AppError> {
    let email = require_non_empty(field, value)?;
    if !is_valid_email(&email) {
        return Err(AppError::ValidationError(format!(
            "{} must be a valid email address",
            field
        )));
    }
    Ok(email.to_lowercase())
}

/// Byte comparison that does not stop at the first mismatch.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
