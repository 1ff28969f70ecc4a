//! Required actions and the canonical action tokens used in permission names.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// An action a caller asks to perform on a scoped resource.
///
/// Callers speak in CRUD verbs (`create|read|edit|delete`), permission names
/// carry canonical tokens (`create|view|update|delete`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Edit,
    Delete,
}

impl Action {
    /// Token that must appear after the dot in a matching permission name.
    pub fn canonical_token(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "view",
            Action::Edit => "update",
            Action::Delete => "delete",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }

    /// Lenient parse used for stored constraint records, which may use either
    /// the request verb or the canonical token.
    pub fn from_either_vocabulary(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Some(Action::Create),
            "read" | "view" => Some(Action::Read),
            "edit" | "update" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// Error returned when a required action is not one of the four request verbs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    /// Strict parse: only the request verbs are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_verbs_map_to_canonical_tokens() {
        assert_eq!(Action::Create.canonical_token(), "create");
        assert_eq!(Action::Read.canonical_token(), "view");
        assert_eq!(Action::Edit.canonical_token(), "update");
        assert_eq!(Action::Delete.canonical_token(), "delete");
    }

    #[test]
    fn strict_parse_rejects_canonical_tokens() {
        assert!("view".parse::<Action>().is_err());
        assert!("update".parse::<Action>().is_err());
        assert!("READ".parse::<Action>().is_err());
        assert_eq!("read".parse::<Action>(), Ok(Action::Read));
    }

    #[test]
    fn lenient_parse_accepts_both_vocabularies() {
        assert_eq!(Action::from_either_vocabulary("view"), Some(Action::Read));
        assert_eq!(Action::from_either_vocabulary(" Update "), Some(Action::Edit));
        assert_eq!(Action::from_either_vocabulary("archive"), None);
    }
}
