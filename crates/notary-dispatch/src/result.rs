use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for an action that is not recognised.
pub const UNEXPECTED_ACTION: &str = "An unexpected error occurred";

/// Envelope status code for success.
pub const STATUS_OK: u16 = 200;
/// Envelope status code for every failure.
pub const STATUS_ERROR: u16 = 505;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Add,
    Validate,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Self::Success => STATUS_OK,
            Self::Error => STATUS_ERROR,
        }
    }
}

/// Outcome of one dispatched request.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionResult {
    pub status: Status,
    pub kind: ResultKind,
    /// A single value, an ordered list of values, or an error message.
    pub payload: Value,
}

impl ActionResult {
    pub fn success(kind: ResultKind, payload: Value) -> Self {
        Self {
            status: Status::Success,
            kind,
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            kind: ResultKind::Error,
            payload: Value::String(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn into_envelope(self) -> Envelope {
        Envelope {
            status: self.status.code(),
            data_type: self.kind,
            data: self.payload,
        }
    }
}

/// The response document returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub data_type: ResultKind,
    pub data: Value,
}

impl From<ActionResult> for Envelope {
    fn from(result: ActionResult) -> Self {
        result.into_envelope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_shape() {
        let ok = ActionResult::success(ResultKind::Validate, json!(["0xab"])).into_envelope();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": 200, "data_type": "validate", "data": ["0xab"]})
        );

        let err: Envelope = ActionResult::error(UNEXPECTED_ACTION).into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": 505, "data_type": "error", "data": "An unexpected error occurred"})
        );
    }
}
