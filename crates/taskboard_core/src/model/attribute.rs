//! Board-scoped custom attributes (Status, Type).
//!
//! # Responsibility
//! - Model both attribute families with one shared record and a kind tag.
//! - Own the attribute name pattern.
//!
//! # Invariants
//! - Attribute names are unique per `(board, kind)`, compared
//!   case-insensitively.
//! - Names match `ATTRIBUTE_NAME_PATTERN` after trimming.

use crate::error::CoreError;
use crate::model::board::BoardId;
use crate::model::class::ClassTag;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type AttributeId = i64;

/// Letters, digits, spaces, `_` and `-`; must start with a letter or digit.
pub const ATTRIBUTE_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9 _\-]{0,49}$";

static ATTRIBUTE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(ATTRIBUTE_NAME_PATTERN).expect("valid attribute name regex"));

/// Attribute family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Status,
    Type,
}

impl AttributeKind {
    /// Storage value used in `attributes.kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Type => "type",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "status" => Some(Self::Status),
            "type" => Some(Self::Type),
            _ => None,
        }
    }

    /// Class tag of this family, for dispatch and error reporting.
    pub fn class(self) -> ClassTag {
        match self {
            Self::Status => ClassTag::Status,
            Self::Type => ClassTag::Type,
        }
    }
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<ClassTag> for AttributeKind {
    type Error = CoreError;

    fn try_from(value: ClassTag) -> Result<Self, Self::Error> {
        match value {
            ClassTag::Status => Ok(Self::Status),
            ClassTag::Type => Ok(Self::Type),
            ClassTag::Item | ClassTag::Comment => {
                Err(CoreError::IllegalInput("Invalid Attribute class".to_string()))
            }
        }
    }
}

/// A named, board-scoped category. Status and Type share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub board_id: BoardId,
    pub kind: AttributeKind,
    pub name: String,
    pub description: String,
}

/// Trims `name` and checks it against `ATTRIBUTE_NAME_PATTERN`.
pub fn normalize_attribute_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if !ATTRIBUTE_NAME_RE.is_match(trimmed) {
        return Err(CoreError::IllegalInput(format!(
            "attribute name `{trimmed}` must match {ATTRIBUTE_NAME_PATTERN}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_attribute_name, AttributeKind};
    use crate::error::CoreError;
    use crate::model::class::ClassTag;

    #[test]
    fn attribute_name_accepts_plain_words_and_trims() {
        assert_eq!(normalize_attribute_name("  In Progress ").unwrap(), "In Progress");
        assert_eq!(normalize_attribute_name("bug-2").unwrap(), "bug-2");
    }

    #[test]
    fn attribute_name_rejects_symbols_and_blank() {
        for bad in ["", "   ", "-lead", "a;drop", "emoji\u{1F600}"] {
            let err = normalize_attribute_name(bad).unwrap_err();
            assert!(matches!(err, CoreError::IllegalInput(_)), "{bad:?}");
        }
        assert!(normalize_attribute_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn content_classes_are_not_attribute_kinds() {
        assert_eq!(
            AttributeKind::try_from(ClassTag::Status).unwrap(),
            AttributeKind::Status
        );
        let err = AttributeKind::try_from(ClassTag::Comment).unwrap_err();
        assert_eq!(err.to_string(), "illegal input: Invalid Attribute class");
    }
}
