//! Field-level validation. Each function either returns the validated value
//! or fails with a typed client-error carrying the offending field name.

use regex::Regex;
use response::ApiError;
use std::sync::LazyLock;

static GUID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{32}$").expect("valid regex"));
static USER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid regex"));

/// Determines whether the value is a valid GUID (32 digit hex, without dashes).
pub fn is_guid(value: &str) -> bool {
    GUID_PATTERN.is_match(value)
}

/// Fails unless the value is a valid GUID (32 digit hex, without dashes).
pub fn guid<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    let value = non_empty_string(field, value)?;

    if !GUID_PATTERN.is_match(value) {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value must be a GUID (32 digit hex, without dashes)"
        )));
    }

    Ok(value)
}

/// Fails unless the value is a valid user ID (alphanumeric, 4-50 chars).
/// Failures are UNAUTHORIZED because the user ID doubles as the API key.
pub fn user(value: Option<&str>) -> Result<&str, ApiError> {
    let value = non_empty_string("X-API-Key", value)?;

    if !USER_PATTERN.is_match(value) {
        Err(ApiError::unauthorized(
            "The X-API-Key header must be an alphanumeric string",
        ))
    } else if value.len() < 4 {
        Err(ApiError::unauthorized("The X-API-Key header is too short"))
    } else if value.len() > 50 {
        Err(ApiError::unauthorized("The X-API-Key header is too long"))
    } else {
        Ok(value)
    }
}

/// Fails unless the value is a string with at least one non-whitespace character.
pub fn non_empty_string<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    let Some(value) = value else {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value must be a string"
        )));
    };

    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value is missing"
        )));
    }

    Ok(value)
}

/// Fails if the string is longer than the specified maximum.
pub fn max_length<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, ApiError> {
    if value.len() > max {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value is too long ({max} characters max)"
        )));
    }

    Ok(value)
}

/// Fails unless the value is a positive integer.
pub fn positive_integer(field: &str, value: Option<i64>) -> Result<i64, ApiError> {
    let Some(value) = value else {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value must be a number"
        )));
    };

    if value <= 0 {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value must be a positive integer"
        )));
    }

    Ok(value)
}

/// Fails unless the value is one of the allowed values.
pub fn one_of<'a>(field: &str, value: &'a str, allowed: &[&str]) -> Result<&'a str, ApiError> {
    if !allowed.contains(&value) {
        return Err(ApiError::bad_request(format!(
            "The \"{field}\" value must be {}",
            comma_list(allowed, "or")
        )));
    }

    Ok(value)
}

/// Renders a list as a comma-delimited string with a conjunction
/// (e.g. `"apples", "oranges", and "pears"`).
fn comma_list(list: &[&str], conjunction: &str) -> String {
    let (last, rest) = list.split_last().expect("list must not be empty");

    format!(
        "\"{}\", {} \"{}\"",
        rest.join("\", \""),
        conjunction,
        last
    )
}
