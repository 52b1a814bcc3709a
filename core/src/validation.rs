//! Parameter validation helpers.
//!
//! Each check returns the parsed value or a [`ValidationError`] whose message
//! names the parameter and the rejected value.

use crate::error::ValidationError;

/// Reject empty (or whitespace-only) values.
///
/// # Errors
///
/// Returns a `ValidationError` with reason `EMPTY` if `value` is blank.
///
/// # Examples
///
/// ```
/// use pipeline_core::validation::check_not_empty;
///
/// assert_eq!(check_not_empty("username", "bob").ok(), Some("bob"));
/// assert!(check_not_empty("username", "  ").is_err());
/// ```
pub fn check_not_empty<'a>(param: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            param,
            None,
            "EMPTY",
            format!("Parameter '{param}' must not be empty"),
        ));
    }
    Ok(value)
}

/// Parse a signed 64-bit integer.
///
/// # Errors
///
/// Returns a `ValidationError` with reason `NOT_INTEGER` if parsing fails.
pub fn check_i64(param: &str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid(param, value, "NOT_INTEGER", "an integer"))
}

/// Parse a floating point number.
///
/// # Errors
///
/// Returns a `ValidationError` with reason `NOT_NUMBER` if parsing fails.
pub fn check_f64(param: &str, value: &str) -> Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(param, value, "NOT_NUMBER", "a number"))
}

/// Parse a boolean. Accepts `true`/`false`/`1`/`0` in any case.
///
/// # Errors
///
/// Returns a `ValidationError` with reason `NOT_BOOLEAN` if parsing fails.
pub fn check_bool(param: &str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(param, value, "NOT_BOOLEAN", "a boolean")),
    }
}

fn invalid(param: &str, value: &str, reason: &str, expected: &str) -> ValidationError {
    ValidationError::new(
        param,
        Some(value.to_string()),
        reason,
        format!("Parameter '{param}' must be {expected}, got '{value}'"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_i64_names_param_and_value() {
        let err = check_i64("age", "abc").err();
        let err = err.as_ref();
        assert_eq!(err.map(|e| e.param.as_str()), Some("age"));
        assert_eq!(err.and_then(|e| e.invalid_value.as_deref()), Some("abc"));
        assert!(err.is_some_and(|e| e.message.contains("age") && e.message.contains("abc")));
    }

    #[test]
    fn test_check_i64_accepts_padded_numbers() {
        assert_eq!(check_i64("age", " 42 ").ok(), Some(42));
    }

    #[test]
    fn test_check_bool() {
        assert_eq!(check_bool("flag", "TRUE").ok(), Some(true));
        assert_eq!(check_bool("flag", "0").ok(), Some(false));
        assert!(check_bool("flag", "maybe").is_err());
    }

    #[test]
    fn test_check_f64() {
        assert_eq!(check_f64("ratio", "0.5").ok(), Some(0.5));
        assert!(check_f64("ratio", "half").is_err());
    }
}
