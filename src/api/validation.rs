use time::Date;

use crate::api::errors::ApiError;
use crate::core::time::parse_date;
use crate::services::regions::MAX_QUESTION_NUMBER;

/// Round labels in paths must be positive integers; `"3"` and `" 3 "` are accepted.
pub(crate) fn parse_round_number(raw: &str) -> Result<i32, ApiError> {
    match raw.trim().parse::<i32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ApiError::BadRequest(format!("Round '{raw}' is not a positive number"))),
    }
}

pub(crate) fn parse_question_number(raw: &str) -> Result<u32, ApiError> {
    match raw.trim().parse::<u32>() {
        Ok(number) if number > 0 && number <= MAX_QUESTION_NUMBER => Ok(number),
        _ => Err(ApiError::BadRequest(format!("Question '{raw}' is not a positive number"))),
    }
}

pub(crate) fn validate_class_name(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        return Err(ApiError::BadRequest("Class name must be 1-100 characters".to_string()));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_held_on(raw: Option<&str>) -> Result<Option<Date>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("held_on '{value}' is not YYYY-MM-DD"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_numbers_must_be_positive_integers() {
        assert_eq!(parse_round_number(" 3 ").unwrap(), 3);
        assert!(parse_round_number("0").is_err());
        assert!(parse_round_number("-2").is_err());
        assert!(parse_round_number("third").is_err());
    }

    #[test]
    fn question_numbers_stay_within_storage_range() {
        assert_eq!(parse_question_number("7").unwrap(), 7);
        assert_eq!(parse_question_number("2147483647").unwrap(), MAX_QUESTION_NUMBER);
        assert!(parse_question_number("2147483648").is_err());
        assert!(parse_question_number("0").is_err());
    }

    #[test]
    fn class_names_are_trimmed_and_bounded() {
        assert_eq!(validate_class_name("  A1 ").unwrap(), "A1");
        assert!(validate_class_name("   ").is_err());
        assert!(validate_class_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn held_on_accepts_iso_dates_only() {
        assert!(parse_held_on(None).unwrap().is_none());
        assert!(parse_held_on(Some("  ")).unwrap().is_none());
        assert!(parse_held_on(Some("2025-03-14")).unwrap().is_some());
        assert!(parse_held_on(Some("14/03/2025")).is_err());
    }
}
