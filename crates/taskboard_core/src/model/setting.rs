//! Notification catalog and per-user delivery preferences.
//!
//! # Invariants
//! - The catalog holds exactly one `NotificationSetting` per
//!   `NotificationKind`, keyed by `NotificationKind::as_str()`.
//! - A user has at most one `UserSetting` per catalog entry.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type NotificationSettingId = i64;
pub type UserSettingId = i64;
pub type NotificationId = i64;

/// Event types a user can be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ItemAssigned,
    ItemUpdated,
    ItemDeleted,
    CommentAdded,
    CommentMention,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        Self::ItemAssigned,
        Self::ItemUpdated,
        Self::ItemDeleted,
        Self::CommentAdded,
        Self::CommentMention,
    ];

    /// Catalog name stored in `notification_settings.name`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ItemAssigned => "ITEM_ASSIGNED",
            Self::ItemUpdated => "ITEM_UPDATED",
            Self::ItemDeleted => "ITEM_DELETED",
            Self::CommentAdded => "COMMENT_ADDED",
            Self::CommentMention => "COMMENT_MENTION",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ItemAssigned => "An item was assigned to you.",
            Self::ItemUpdated => "An item you follow was changed.",
            Self::ItemDeleted => "An item you follow was deleted.",
            Self::CommentAdded => "Someone commented on your item.",
            Self::CommentMention => "You were mentioned in a comment.",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Catalog entry seeded from `NotificationKind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSetting {
    pub id: NotificationSettingId,
    pub kind: NotificationKind,
    pub description: String,
}

/// Whether one user wants one event type in-app and/or by email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSetting {
    pub id: UserSettingId,
    pub user_id: UserId,
    pub setting_id: NotificationSettingId,
    pub in_app: bool,
    pub in_email: bool,
}

/// Materialized in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    /// Epoch ms.
    pub created_at: i64,
}
