pub mod account;
pub mod auth;
pub mod error;
pub mod images;
pub mod posts;
pub mod relationships;

pub use error::{ApiError, ApiResult};

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::{Form, Json};

use y_types::{MAX_NAME_LEN, MAX_TEXT_LEN};

/// Message for requests missing required fields
pub const INVALID_REQUEST: &str = "Invalid request recieved.";

/// Unwrap a form body, reporting a malformed one as a JSON 400
pub fn form_payload<T>(payload: Result<Form<T>, FormRejection>) -> ApiResult<T> {
    payload
        .map(|Form(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("{} {}", INVALID_REQUEST, e.body_text())))
}

/// Unwrap a JSON body, reporting a malformed one as a JSON 400
pub fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("{} {}", INVALID_REQUEST, e.body_text())))
}

/// Parse an id sent as a form field
pub fn parse_id(raw: Option<&str>) -> ApiResult<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ApiError::BadRequest(INVALID_REQUEST.to_string()))
}

/// Parse an optional id where an empty field or `0` means "none"
pub fn parse_optional_id(raw: Option<&str>) -> ApiResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => match s.parse::<i64>() {
            Ok(0) => Ok(None),
            Ok(id) => Ok(Some(id)),
            Err(_) => Err(ApiError::BadRequest(INVALID_REQUEST.to_string())),
        },
    }
}

pub fn check_text_len(text: &str, what: &str) -> ApiResult<()> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ApiError::BadRequest(format!(
            "{} may be at most {} characters.",
            what, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

pub fn check_name_len(text: &str, what: &str) -> ApiResult<()> {
    if text.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "{} may be at most {} characters.",
            what, MAX_NAME_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some(" 42 ")).unwrap(), 42);
        assert!(parse_id(Some("forty")).is_err());
        assert!(parse_id(None).is_err());
    }

    #[test]
    fn test_parse_optional_id_treats_zero_as_none() {
        assert_eq!(parse_optional_id(Some("0")).unwrap(), None);
        assert_eq!(parse_optional_id(Some("")).unwrap(), None);
        assert_eq!(parse_optional_id(Some("7")).unwrap(), Some(7));
        assert!(parse_optional_id(Some("x")).is_err());
    }

    #[test]
    fn test_length_limits_count_characters() {
        assert!(check_text_len(&"é".repeat(400), "Post").is_ok());
        assert!(check_text_len(&"a".repeat(401), "Post").is_err());
        assert!(check_name_len(&"b".repeat(33), "Username").is_err());
    }
}
