use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Document collection holding notices.
pub const NOTICE_COLLECTION: &str = "notices";

/// Store-assigned notice identifier (e.g. `notices/1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoticeId(String);

impl NoticeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A notice that has not been assigned an identity yet.
///
/// This is also the persisted document shape: the identifier lives in the
/// document key, and days-left is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotice {
    pub subject: String,
    pub deadline: NaiveDateTime,
}

/// Lenient inbound shape; every field is optional so missing values can be
/// reported by name instead of as a generic serde error.
#[derive(Deserialize)]
struct NoticePayload {
    #[serde(default, alias = "Subject")]
    subject: Option<String>,
    #[serde(default, alias = "Deadline")]
    deadline: Option<String>,
}

impl NewNotice {
    pub fn new(subject: impl Into<String>, deadline: NaiveDateTime) -> Self {
        Self {
            subject: subject.into(),
            deadline,
        }
    }

    /// Decode a create-notice JSON payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, ValidationError> {
        // Derived struct impls also read sequences, so insist on an object first.
        let raw: NoticePayload = match serde_json::from_slice::<Value>(payload)? {
            object @ Value::Object(_) => serde_json::from_value(object)?,
            other => {
                return Err(serde_json::Error::invalid_type(unexpected(&other), &"a JSON object").into())
            }
        };
        let subject = raw.subject.ok_or(ValidationError::MissingField("subject"))?;
        let deadline = raw.deadline.ok_or(ValidationError::MissingField("deadline"))?;
        let deadline = parse_deadline(&deadline)
            .ok_or(ValidationError::InvalidDeadline { value: deadline })?;
        Ok(Self { subject, deadline })
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

/// A persisted notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub subject: String,
    pub deadline: NaiveDateTime,
}

impl Notice {
    pub fn from_stored(id: NoticeId, stored: NewNotice) -> Self {
        Self {
            id,
            subject: stored.subject,
            deadline: stored.deadline,
        }
    }

    /// Whole days from `today` to the deadline's date. Time of day is
    /// ignored; past deadlines give negative values.
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        (self.deadline.date() - today).num_days()
    }
}

/// Parse an ISO-8601 deadline.
///
/// Accepts RFC 3339 with an offset (converted to local time), a naive
/// date-time, or a bare date (midnight).
pub fn parse_deadline(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = value.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn notice_due(deadline: NaiveDateTime) -> Notice {
        Notice::from_stored(NoticeId::new("notices/1"), NewNotice::new("Rent", deadline))
    }

    #[test]
    fn days_left_is_zero_for_today() {
        let today = date(2026, 10, 19);
        let notice = notice_due(today.and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(notice.days_left(today), 0);
    }

    #[test]
    fn days_left_counts_forward() {
        let today = date(2026, 10, 19);
        let notice = notice_due(date(2026, 10, 21).and_hms_opt(0, 0, 1).unwrap());
        assert_eq!(notice.days_left(today), 2);
    }

    #[test]
    fn days_left_is_negative_for_past_deadlines() {
        let today = date(2026, 10, 19);
        let notice = notice_due(date(2026, 10, 12).and_hms_opt(18, 0, 0).unwrap());
        assert_eq!(notice.days_left(today), -7);
    }

    #[test]
    fn days_left_crosses_month_and_leap_day() {
        let today = date(2024, 2, 28);
        let notice = notice_due(date(2024, 3, 1).and_time(NaiveTime::MIN));
        assert_eq!(notice.days_left(today), 2);
    }

    #[test]
    fn from_json_reads_subject_and_deadline() {
        let notice =
            NewNotice::from_json(br#"{"subject":"Tax return","deadline":"2026-10-21T09:30:00"}"#)
                .unwrap();
        assert_eq!(notice.subject, "Tax return");
        assert_eq!(notice.deadline, date(2026, 10, 21).and_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn from_json_accepts_pascal_case_fields() {
        let notice =
            NewNotice::from_json(br#"{"Subject":"Test Notice","Deadline":"2026-10-21"}"#).unwrap();
        assert_eq!(notice.subject, "Test Notice");
        assert_eq!(notice.deadline, date(2026, 10, 21).and_time(NaiveTime::MIN));
    }

    #[test]
    fn from_json_reports_missing_subject() {
        let err = NewNotice::from_json(br#"{"deadline":"2026-10-21"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("subject")), "got: {err}");
    }

    #[test]
    fn from_json_reports_missing_deadline() {
        let err = NewNotice::from_json(br#"{"subject":"x","deadline":null}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("deadline")), "got: {err}");
    }

    #[test]
    fn from_json_rejects_unparseable_deadline() {
        let err = NewNotice::from_json(br#"{"subject":"x","deadline":"next tuesday"}"#).unwrap_err();
        assert!(err.to_string().contains("next tuesday"), "got: {err}");
    }

    #[test]
    fn from_json_rejects_non_json() {
        let err = NewNotice::from_json(b"subject=x").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn from_json_rejects_array_payload() {
        let err = NewNotice::from_json(br#"["Test Notice","2026-10-21"]"#).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)), "got: {err}");
        assert!(err.to_string().contains("a JSON object"), "got: {err}");
    }

    #[test]
    fn from_json_rejects_scalar_payloads() {
        for payload in [&b"null"[..], b"42", br#""Test Notice""#, b"true"] {
            let err = NewNotice::from_json(payload).unwrap_err();
            assert!(matches!(err, ValidationError::Malformed(_)), "got: {err}");
        }
    }

    #[test]
    fn from_json_rejects_wrong_subject_type() {
        let err = NewNotice::from_json(br#"{"subject":42,"deadline":"2026-10-21"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn parse_deadline_accepts_fractional_seconds() {
        let parsed = parse_deadline("2026-10-21T09:30:00.250").unwrap();
        assert_eq!(parsed.date(), date(2026, 10, 21));
    }

    #[test]
    fn parse_deadline_converts_offsets_to_local() {
        let parsed = parse_deadline("2026-10-21T12:00:00Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2026-10-21T12:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn stored_shape_round_trips_through_json() {
        let stored = NewNotice::new("Rent", date(2026, 11, 1).and_hms_opt(8, 0, 0).unwrap());
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["subject"], "Rent");
        assert_eq!(json["deadline"], "2026-11-01T08:00:00");
        assert!(json.get("days_left").is_none());
    }
}
