//! Board permission levels and the path/verb/field rule table.
//!
//! # Responsibility
//! - Decide whether a caller's level on a board allows one mutation or read
//!   before the request reaches a registry or engine.
//!
//! # Invariants
//! - The rule table is closed: every `(level, resource, verb)` has exactly
//!   one answer.
//! - `Admin` is allowed everything.

use crate::error::{CoreError, CoreResult};
use crate::service::update::UpdateField;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Role of a user on one board. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    User,
    Leader,
    Admin,
}

impl PermissionLevel {
    /// Storage value used in `board_members.level`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Leader => "leader",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "leader" => Some(Self::Leader),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl Display for PermissionLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request verb, as routed by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

/// Board-scoped resource a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Board,
    Section,
    Status,
    Type,
    Item,
    Comment,
    Member,
}

/// Stateless rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionPolicy;

impl PermissionPolicy {
    pub fn allows(
        &self,
        level: PermissionLevel,
        resource: Resource,
        verb: Verb,
        field: Option<UpdateField>,
    ) -> bool {
        match level {
            PermissionLevel::Admin => true,
            PermissionLevel::Leader => !matches!(
                (resource, verb),
                (Resource::Board, Verb::Delete)
                    | (Resource::Member, Verb::Post | Verb::Patch | Verb::Delete)
            ),
            PermissionLevel::User => match (resource, verb) {
                (_, Verb::Get) => true,
                (Resource::Item, Verb::Patch) => field != Some(UpdateField::Section),
                (Resource::Item | Resource::Comment, Verb::Post | Verb::Patch) => true,
                _ => false,
            },
        }
    }

    /// Same as `allows`, as a `Forbidden` error for `?` call sites.
    pub fn check(
        &self,
        level: PermissionLevel,
        resource: Resource,
        verb: Verb,
        field: Option<UpdateField>,
    ) -> CoreResult<()> {
        if self.allows(level, resource, verb, field) {
            return Ok(());
        }
        Err(CoreError::Forbidden(format!(
            "{level} may not {verb:?} {resource:?}{}",
            field.map(|f| format!(" field {f}")).unwrap_or_default()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{PermissionLevel, PermissionPolicy, Resource, Verb};
    use crate::error::CoreError;
    use crate::service::update::UpdateField;

    const RESOURCES: [Resource; 7] = [
        Resource::Board,
        Resource::Section,
        Resource::Status,
        Resource::Type,
        Resource::Item,
        Resource::Comment,
        Resource::Member,
    ];
    const VERBS: [Verb; 4] = [Verb::Get, Verb::Post, Verb::Patch, Verb::Delete];

    #[test]
    fn admin_is_allowed_everything() {
        let policy = PermissionPolicy;
        for resource in RESOURCES {
            for verb in VERBS {
                assert!(policy.allows(PermissionLevel::Admin, resource, verb, None));
            }
        }
    }

    #[test]
    fn leader_cannot_delete_board_or_manage_members() {
        let policy = PermissionPolicy;
        assert!(!policy.allows(PermissionLevel::Leader, Resource::Board, Verb::Delete, None));
        assert!(!policy.allows(PermissionLevel::Leader, Resource::Member, Verb::Post, None));
        assert!(policy.allows(PermissionLevel::Leader, Resource::Member, Verb::Get, None));
        assert!(policy.allows(PermissionLevel::Leader, Resource::Status, Verb::Delete, None));
        assert!(policy.allows(PermissionLevel::Leader, Resource::Section, Verb::Post, None));
    }

    #[test]
    fn user_reads_everything_but_only_writes_content() {
        let policy = PermissionPolicy;
        for resource in RESOURCES {
            assert!(policy.allows(PermissionLevel::User, resource, Verb::Get, None));
        }
        assert!(policy.allows(PermissionLevel::User, Resource::Item, Verb::Post, None));
        assert!(policy.allows(PermissionLevel::User, Resource::Comment, Verb::Patch, None));
        assert!(!policy.allows(PermissionLevel::User, Resource::Item, Verb::Delete, None));
        assert!(!policy.allows(PermissionLevel::User, Resource::Status, Verb::Post, None));
        assert!(!policy.allows(PermissionLevel::User, Resource::Section, Verb::Patch, None));
    }

    #[test]
    fn user_cannot_move_items_between_sections() {
        let policy = PermissionPolicy;
        assert!(policy.allows(
            PermissionLevel::User,
            Resource::Item,
            Verb::Patch,
            Some(UpdateField::Status)
        ));
        let err = policy
            .check(
                PermissionLevel::User,
                Resource::Item,
                Verb::Patch,
                Some(UpdateField::Section),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn levels_are_ordered_by_privilege() {
        assert!(PermissionLevel::Admin > PermissionLevel::Leader);
        assert!(PermissionLevel::Leader > PermissionLevel::User);
        assert_eq!(PermissionLevel::parse("leader"), Some(PermissionLevel::Leader));
        assert_eq!(PermissionLevel::parse("owner"), None);
    }
}
