//! Shared content: items and comments.
//!
//! # Responsibility
//! - Hold the fields every piece of user-authored content carries once, in
//!   `ContentCore`, embedded by value in `Item` and `Comment`.
//! - Tag the two families with `ContentKind` for dispatch.
//!
//! # Invariants
//! - A comment always has a parent item.
//! - An item is never its own parent, directly or through its ancestors.
//! - `status_id`/`type_id` may be absent after the referenced attribute was
//!   deleted; the item itself survives.

use crate::error::CoreError;
use crate::model::attribute::AttributeId;
use crate::model::board::{BoardId, SectionId};
use crate::model::class::ClassTag;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type ItemId = i64;
pub type CommentId = i64;

/// Shared content family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Item,
    Comment,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Comment => "comment",
        }
    }

    pub fn class(self) -> ClassTag {
        match self {
            Self::Item => ClassTag::Item,
            Self::Comment => ClassTag::Comment,
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<ClassTag> for ContentKind {
    type Error = CoreError;

    fn try_from(value: ClassTag) -> Result<Self, Self::Error> {
        match value {
            ClassTag::Item => Ok(Self::Item),
            ClassTag::Comment => Ok(Self::Comment),
            ClassTag::Status | ClassTag::Type => Err(CoreError::IllegalInput(
                "Invalid Shared Content class".to_string(),
            )),
        }
    }
}

/// Fields common to every content family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCore {
    pub id: i64,
    pub creator_id: UserId,
    /// Epoch ms, stamped at insert.
    pub created_at: i64,
    pub title: String,
    pub description: String,
}

/// Work item living in a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub core: ContentCore,
    pub board_id: BoardId,
    pub section_id: SectionId,
    pub status_id: Option<AttributeId>,
    pub type_id: Option<AttributeId>,
    pub assignee_id: Option<UserId>,
    /// Epoch ms.
    pub due_date: Option<i64>,
    pub importance: i64,
    pub parent_item_id: Option<ItemId>,
}

impl Item {
    pub fn id(&self) -> ItemId {
        self.core.id
    }
}

/// Comment attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub core: ContentCore,
    pub item_id: ItemId,
    /// Sorted ascending, no duplicates.
    pub related_user_ids: Vec<UserId>,
}

impl Comment {
    pub fn id(&self) -> CommentId {
        self.core.id
    }
}

/// Either content family, as returned by the generic engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SharedContent {
    Item(Item),
    Comment(Comment),
}

impl SharedContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Item(_) => ContentKind::Item,
            Self::Comment(_) => ContentKind::Comment,
        }
    }

    pub fn core(&self) -> &ContentCore {
        match self {
            Self::Item(item) => &item.core,
            Self::Comment(comment) => &comment.core,
        }
    }

    pub fn id(&self) -> i64 {
        self.core().id
    }

    pub fn into_item(self) -> Option<Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Comment(_) => None,
        }
    }

    pub fn into_comment(self) -> Option<Comment> {
        match self {
            Self::Comment(comment) => Some(comment),
            Self::Item(_) => None,
        }
    }
}

impl From<Item> for SharedContent {
    fn from(value: Item) -> Self {
        Self::Item(value)
    }
}

impl From<Comment> for SharedContent {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}
