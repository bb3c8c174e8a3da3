use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::result::ResultKind;

/// Contract function that records a document hash.
pub const ADD_DOCUMENT: &str = "addDocument";
/// Contract function that checks a document hash.
pub const VALIDATE_ONE: &str = "validateOne";

/// An operation the notary performs on behalf of a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    AddDocument,
    AddMultiple,
    ValidateOne,
    ValidateMultiple,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::AddDocument,
        Action::AddMultiple,
        Action::ValidateOne,
        Action::ValidateMultiple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddDocument => "addDocument",
            Self::AddMultiple => "addMultiple",
            Self::ValidateOne => "validateOne",
            Self::ValidateMultiple => "validateMultiple",
        }
    }

    pub fn kind(&self) -> ResultKind {
        if self.is_mutating() {
            ResultKind::Add
        } else {
            ResultKind::Validate
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::AddDocument | Self::AddMultiple)
    }

    /// Whether every supplied hash is processed, rather than only the first.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::AddMultiple | Self::ValidateMultiple)
    }

    /// The contract function invoked once per processed hash.
    pub fn function(&self) -> &'static str {
        if self.is_mutating() {
            ADD_DOCUMENT
        } else {
            VALIDATE_ONE
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownAction(s.to_string()))
    }
}

/// One inbound request: who, which hashes, and what to do with them.
///
/// `action` stays a plain string so an unknown action still produces a
/// well-formed error result instead of a deserialization failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default)]
    pub action: String,
}

impl ActionRequest {
    pub fn new(user: impl Into<String>, hashes: Vec<String>, action: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            hashes,
            action: action.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_actions() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!(matches!(
            "AddDocument".parse::<Action>(),
            Err(DispatchError::UnknownAction(a)) if a == "AddDocument"
        ));
        assert!("".parse::<Action>().is_err());
    }

    #[test]
    fn functions_and_kinds() {
        assert_eq!(Action::AddMultiple.function(), "addDocument");
        assert_eq!(Action::ValidateMultiple.function(), "validateOne");
        assert_eq!(Action::AddDocument.kind(), ResultKind::Add);
        assert_eq!(Action::ValidateOne.kind(), ResultKind::Validate);
        assert!(Action::AddMultiple.is_batch());
        assert!(!Action::ValidateOne.is_batch());
    }

    #[test]
    fn request_fields_default() {
        let req: ActionRequest = serde_json::from_str(r#"{"action": "validateOne"}"#).unwrap();
        assert!(req.user.is_empty());
        assert!(req.hashes.is_empty());
    }
}
