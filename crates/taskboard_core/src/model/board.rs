//! Board and section records.
//!
//! # Invariants
//! - A section always belongs to exactly one board.
//! - Board membership carries one `PermissionLevel` per user.

use crate::model::user::UserId;
use crate::permission::PermissionLevel;
use serde::{Deserialize, Serialize};

pub type BoardId = i64;
pub type SectionId = i64;

/// Top-level workspace grouping sections, attributes and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    /// Epoch ms.
    pub created_at: i64,
}

/// Named grouping of items within a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub board_id: BoardId,
    pub name: String,
    pub description: String,
}

/// One user's role on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMember {
    pub board_id: BoardId,
    pub user_id: UserId,
    pub level: PermissionLevel,
}
