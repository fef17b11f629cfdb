//! Validation of the review API payload and rendering of status messages.
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CycleError;

pub const HOMEWORKS: &str = "homeworks";
pub const CURRENT_DATE: &str = "current_date";
pub const HOMEWORK_NAME: &str = "homework_name";
pub const STATUS: &str = "status";

/// Review states known to the bot. Anything else is rejected by
/// [`parse_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Approved,
        ReviewStatus::Reviewing,
        ReviewStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == code)
    }

    /// Human-readable verdict shown in the chat.
    pub fn verdict(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            ReviewStatus::Reviewing => "Работа взята на проверку ревьюером.",
            ReviewStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// One entry of the `homeworks` array, kept as raw JSON until extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord(Map<String, Value>);

impl SubmissionRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Result of validating one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedResponse {
    /// Most recent submission, `None` when the list is empty.
    pub submission: Option<SubmissionRecord>,
    /// Server-supplied cursor for the next poll, when present and integral.
    pub current_date: Option<i64>,
}

/// The fields of a submission that drive change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub status: ReviewStatus,
}

pub fn check_response(payload: Value) -> Result<CheckedResponse, CycleError> {
    let mut body = match payload {
        Value::Object(map) => map,
        other => {
            return Err(CycleError::Shape(format!(
                "response is not an object, but {}",
                json_kind(&other)
            )))
        }
    };

    let current_date = body.get(CURRENT_DATE).and_then(parse_timestamp);

    let homeworks = match body.remove(HOMEWORKS) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(CycleError::Shape(format!(
                "\"{}\" is not an array, but {}",
                HOMEWORKS,
                json_kind(&other)
            )))
        }
        None => return Err(CycleError::MissingField(HOMEWORKS)),
    };
    debug!(count = homeworks.len(), ?current_date, "validated response");

    let submission = match homeworks.into_iter().next() {
        None => None,
        Some(Value::Object(fields)) => Some(SubmissionRecord::new(fields)),
        Some(other) => {
            return Err(CycleError::Shape(format!(
                "homework entry is not an object, but {}",
                json_kind(&other)
            )))
        }
    };

    Ok(CheckedResponse {
        submission,
        current_date,
    })
}

/// Extract identity and the chat message for a submission.
pub fn parse_status(record: &SubmissionRecord) -> Result<(Identity, String), CycleError> {
    let name = match record.get(HOMEWORK_NAME) {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(CycleError::Shape(format!(
                "\"{}\" is not a string, but {}",
                HOMEWORK_NAME,
                json_kind(other)
            )))
        }
        None => return Err(CycleError::MissingField(HOMEWORK_NAME)),
    };

    let status = match record.get(STATUS) {
        Some(Value::String(code)) => ReviewStatus::from_code(code)
            .ok_or_else(|| CycleError::UnknownStatus(format!("\"{}\"", code)))?,
        Some(other) => return Err(CycleError::UnknownStatus(other.to_string())),
        None => return Err(CycleError::MissingField(STATUS)),
    };
    debug!(homework = %name, status = status.as_str(), "parsed submission");

    let message = render_message(&name, status);
    Ok((Identity { name, status }, message))
}

pub fn render_message(name: &str, status: ReviewStatus) -> String {
    format!(
        "Изменился статус проверки работы \"{}\". {}",
        name,
        status.verdict()
    )
}

/// Accepts a JSON integer or a string holding one.
fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> SubmissionRecord {
        match value {
            Value::Object(map) => SubmissionRecord::new(map),
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn renders_approved_message_verbatim() {
        let (identity, message) =
            parse_status(&record(json!({"homework_name": "HW1", "status": "approved"}))).unwrap();
        assert_eq!(
            message,
            "Изменился статус проверки работы \"HW1\". Работа проверена: ревьюеру всё понравилось. Ура!"
        );
        assert_eq!(identity.name, "HW1");
        assert_eq!(identity.status, ReviewStatus::Approved);
    }

    #[test]
    fn verdict_table_has_three_entries() {
        assert_eq!(ReviewStatus::from_code("approved"), Some(ReviewStatus::Approved));
        assert_eq!(ReviewStatus::from_code("reviewing"), Some(ReviewStatus::Reviewing));
        assert_eq!(ReviewStatus::from_code("rejected"), Some(ReviewStatus::Rejected));
        assert_eq!(ReviewStatus::from_code("Approved"), None);
        assert_eq!(
            ReviewStatus::Rejected.verdict(),
            "Работа проверена: у ревьюера есть замечания."
        );
        assert_eq!(
            ReviewStatus::Reviewing.verdict(),
            "Работа взята на проверку ревьюером."
        );
    }

    #[test]
    fn non_object_payload_is_shape_error() {
        let err = check_response(json!([1, 2])).unwrap_err();
        assert!(matches!(err, CycleError::Shape(msg) if msg.contains("an array")));
    }

    #[test]
    fn missing_homeworks_key() {
        let err = check_response(json!({"current_date": 5})).unwrap_err();
        assert_eq!(err, CycleError::MissingField("homeworks"));
    }

    #[test]
    fn homeworks_must_be_an_array() {
        let err = check_response(json!({"homeworks": {"a": 1}})).unwrap_err();
        assert!(matches!(err, CycleError::Shape(_)));
    }

    #[test]
    fn empty_list_is_no_submission() {
        let checked = check_response(json!({"homeworks": [], "current_date": 100})).unwrap();
        assert_eq!(checked.submission, None);
        assert_eq!(checked.current_date, Some(100));
    }

    #[test]
    fn only_first_entry_is_taken() {
        let checked = check_response(json!({
            "homeworks": [
                {"homework_name": "new", "status": "reviewing"},
                {"homework_name": "old", "status": "approved"}
            ]
        }))
        .unwrap();
        let submission = checked.submission.unwrap();
        assert_eq!(submission.get("homework_name"), Some(&json!("new")));
        assert_eq!(checked.current_date, None);
    }

    #[test]
    fn current_date_parsing() {
        let checked = check_response(json!({"homeworks": [], "current_date": "42"})).unwrap();
        assert_eq!(checked.current_date, Some(42));
        let checked = check_response(json!({"homeworks": [], "current_date": 1.5})).unwrap();
        assert_eq!(checked.current_date, None);
        let checked = check_response(json!({"homeworks": [], "current_date": "soon"})).unwrap();
        assert_eq!(checked.current_date, None);
    }

    #[test]
    fn missing_fields_in_record() {
        let err = parse_status(&record(json!({"status": "approved"}))).unwrap_err();
        assert_eq!(err, CycleError::MissingField("homework_name"));
        let err = parse_status(&record(json!({"homework_name": "HW1"}))).unwrap_err();
        assert_eq!(err, CycleError::MissingField("status"));
    }

    #[test]
    fn unknown_status_code() {
        let err = parse_status(&record(json!({"homework_name": "HW1", "status": "unknown_code"})))
            .unwrap_err();
        assert_eq!(err, CycleError::UnknownStatus("\"unknown_code\"".into()));
    }
}
