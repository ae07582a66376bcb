//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, ListingStatus};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidStatus,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidStatus => "invalid_status",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_error(
            field,
            format!("{} must be a valid UUID", field.as_str()),
            ErrorCode::InvalidUuid,
            value,
        )
    })
}

pub(crate) fn parse_status(value: &str, field: FieldName) -> Result<ListingStatus, Error> {
    value.parse::<ListingStatus>().map_err(|()| {
        field_error(
            field,
            format!(
                "{} must be one of draft, live, funded, cancelled",
                field.as_str()
            ),
            ErrorCode::InvalidStatus,
            value,
        )
    })
}

/// Interpret a `mine=` query flag the way the original API did: `1` and
/// `true` opt in, anything else (or absence) opts out.
pub(crate) fn parse_mine_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "True"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_uuid_reports_the_field() {
        let err = parse_uuid("nope", FieldName::new("listing")).expect_err("invalid");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "listing");
        assert_eq!(details["code"], "invalid_uuid");
    }

    #[test]
    fn parse_status_accepts_known_states() {
        let status = parse_status("live", FieldName::new("status")).expect("known status");
        assert_eq!(status, ListingStatus::Live);
        assert!(parse_status("archived", FieldName::new("status")).is_err());
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("0"), false)]
    #[case(Some("false"), false)]
    #[case(Some("1"), true)]
    #[case(Some("true"), true)]
    #[case(Some("True"), true)]
    fn mine_flag_matches_the_original_spelling(#[case] raw: Option<&str>, #[case] expected: bool) {
        assert_eq!(parse_mine_flag(raw), expected);
    }
}
