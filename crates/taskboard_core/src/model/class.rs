//! Closed set of dispatchable entity classes.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Type tag a facade passes to select the engine for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassTag {
    Status,
    Type,
    Item,
    Comment,
}

impl ClassTag {
    pub const ALL: [ClassTag; 4] = [Self::Status, Self::Type, Self::Item, Self::Comment];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Type => "type",
            Self::Item => "item",
            Self::Comment => "comment",
        }
    }
}

impl Display for ClassTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassTag {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == normalized)
            .ok_or_else(|| CoreError::IllegalInput("No such class in the system".to_string()))
    }
}

/// Every persisted record family, used to name what a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    Board,
    Section,
    Status,
    Type,
    Item,
    Comment,
    NotificationSetting,
    Notification,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Board => "board",
            Self::Section => "section",
            Self::Status => "status",
            Self::Type => "type",
            Self::Item => "item",
            Self::Comment => "comment",
            Self::NotificationSetting => "notification setting",
            Self::Notification => "notification",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ClassTag> for Entity {
    fn from(value: ClassTag) -> Self {
        match value {
            ClassTag::Status => Self::Status,
            ClassTag::Type => Self::Type,
            ClassTag::Item => Self::Item,
            ClassTag::Comment => Self::Comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClassTag;

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!("Status".parse::<ClassTag>().unwrap(), ClassTag::Status);
        assert_eq!(" COMMENT ".parse::<ClassTag>().unwrap(), ClassTag::Comment);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "Board".parse::<ClassTag>().unwrap_err();
        assert!(err.to_string().contains("No such class in the system"));
    }
}
