//! Generic field-update resolver.
//!
//! # Responsibility
//! - Map a symbolic field name plus an opaque JSON value to one typed
//!   mutation on a board, section, attribute, item or comment.
//! - Coerce primitive values and re-resolve reference fields through the
//!   repository ports before persisting.
//!
//! # Invariants
//! - The legal update surface of each family is the closed table returned by
//!   `UpdateTarget::fields`; anything else is `IllegalInput`.
//! - Validation happens on a copy; the stored entity is only written when
//!   every check passed.
//! - An item is never its own parent or ancestor.

use crate::error::{CoreError, CoreResult};
use crate::model::attribute::{normalize_attribute_name, Attribute, AttributeId, AttributeKind};
use crate::model::board::{Board, BoardId, Section, SectionId};
use crate::model::class::Entity;
use crate::model::content::{Comment, Item, ItemId};
use crate::model::user::{User, UserId};
use crate::repo::Repositories;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Accepted values for `Item::importance`.
pub const IMPORTANCE_RANGE: RangeInclusive<i64> = 0..=10;

/// Every field name the resolver understands, across all families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateField {
    Name,
    Description,
    Status,
    Type,
    Section,
    DueDate,
    ParentItem,
    Importance,
    Assignee,
    RelatedUsers,
}

impl UpdateField {
    pub const ALL: [UpdateField; 10] = [
        Self::Name,
        Self::Description,
        Self::Status,
        Self::Type,
        Self::Section,
        Self::DueDate,
        Self::ParentItem,
        Self::Importance,
        Self::Assignee,
        Self::RelatedUsers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Description => "DESCRIPTION",
            Self::Status => "STATUS",
            Self::Type => "TYPE",
            Self::Section => "SECTION",
            Self::DueDate => "DUE_DATE",
            Self::ParentItem => "PARENT_ITEM",
            Self::Importance => "IMPORTANCE",
            Self::Assignee => "ASSIGNEE",
            Self::RelatedUsers => "RELATED_USERS",
        }
    }
}

impl Display for UpdateField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateField {
    type Err = CoreError;

    /// Case-insensitive; `-` and spaces are read as `_`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| CoreError::IllegalInput(format!("unknown field `{}`", value.trim())))
    }
}

/// Entity families with an update surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateTarget {
    Board,
    Section,
    Attribute,
    Item,
    Comment,
}

const NAMED_FIELDS: &[UpdateField] = &[UpdateField::Name, UpdateField::Description];

const ITEM_FIELDS: &[UpdateField] = &[
    UpdateField::Name,
    UpdateField::Description,
    UpdateField::Status,
    UpdateField::Type,
    UpdateField::Section,
    UpdateField::DueDate,
    UpdateField::ParentItem,
    UpdateField::Importance,
    UpdateField::Assignee,
];

const COMMENT_FIELDS: &[UpdateField] = &[
    UpdateField::Name,
    UpdateField::Description,
    UpdateField::RelatedUsers,
];

impl UpdateTarget {
    /// Closed list of fields this family accepts.
    pub fn fields(self) -> &'static [UpdateField] {
        match self {
            Self::Board | Self::Section | Self::Attribute => NAMED_FIELDS,
            Self::Item => ITEM_FIELDS,
            Self::Comment => COMMENT_FIELDS,
        }
    }

    pub fn accepts(self, field: UpdateField) -> bool {
        self.fields().contains(&field)
    }
}

/// One field change as received from the facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Symbolic field name, e.g. `STATUS`.
    pub field: Option<String>,
    /// Opaque new value; interpretation depends on `field`.
    #[serde(default)]
    pub content: Value,
}

impl UpdateRequest {
    pub fn new(field: UpdateField, content: impl Into<Value>) -> Self {
        Self {
            field: Some(field.as_str().to_string()),
            content: content.into(),
        }
    }

    /// Parses the field name and checks it against the family's table.
    pub fn field_for(&self, target: UpdateTarget) -> CoreResult<UpdateField> {
        let name = self.field.as_deref().ok_or(CoreError::NullInput("field"))?;
        let field = name.parse::<UpdateField>()?;
        if !target.accepts(field) {
            return Err(no_such_field());
        }
        Ok(field)
    }
}

/// Applies `UpdateRequest`s through the repository ports.
#[derive(Clone, Copy)]
pub struct UpdateResolver<'r> {
    repos: Repositories<'r>,
}

impl<'r> UpdateResolver<'r> {
    pub fn new(repos: Repositories<'r>) -> Self {
        Self { repos }
    }

    pub fn update_board(&self, board: &Board, request: &UpdateRequest) -> CoreResult<Board> {
        let mut updated = board.clone();
        match request.field_for(UpdateTarget::Board)? {
            UpdateField::Name => updated.name = required_text(&request.content)?,
            UpdateField::Description => updated.description = optional_text(&request.content)?,
            _ => return Err(no_such_field()),
        }
        self.repos.boards.save_board(&updated)?;
        Ok(updated)
    }

    pub fn update_section(&self, section: &Section, request: &UpdateRequest) -> CoreResult<Section> {
        let mut updated = section.clone();
        match request.field_for(UpdateTarget::Section)? {
            UpdateField::Name => updated.name = required_text(&request.content)?,
            UpdateField::Description => updated.description = optional_text(&request.content)?,
            _ => return Err(no_such_field()),
        }
        self.repos.boards.save_section(&updated)?;
        Ok(updated)
    }

    /// Renames re-check per-board uniqueness and fail with `Conflict`.
    pub fn update_attribute(
        &self,
        attribute: &Attribute,
        request: &UpdateRequest,
    ) -> CoreResult<Attribute> {
        let mut updated = attribute.clone();
        match request.field_for(UpdateTarget::Attribute)? {
            UpdateField::Name => {
                let name = normalize_attribute_name(&required_text(&request.content)?)?;
                if self.repos.attributes.exists_by_board_and_name(
                    attribute.board_id,
                    attribute.kind,
                    &name,
                    Some(attribute.id),
                )? {
                    return Err(CoreError::Conflict(format!(
                        "{} `{name}` already exists in board {}",
                        attribute.kind, attribute.board_id
                    )));
                }
                updated.name = name;
            }
            UpdateField::Description => updated.description = optional_text(&request.content)?,
            _ => return Err(no_such_field()),
        }
        self.repos.attributes.save_attribute(&updated)?;
        Ok(updated)
    }

    pub fn update_item(&self, item: &Item, request: &UpdateRequest) -> CoreResult<Item> {
        let mut updated = item.clone();
        let content = &request.content;
        match request.field_for(UpdateTarget::Item)? {
            UpdateField::Name => updated.core.title = required_text(content)?,
            UpdateField::Description => updated.core.description = optional_text(content)?,
            UpdateField::DueDate => updated.due_date = optional_integer(content)?,
            UpdateField::Importance => updated.importance = importance(integer(content)?)?,
            UpdateField::Status => {
                let status =
                    self.resolve_attribute(AttributeKind::Status, integer(content)?, item.board_id)?;
                updated.status_id = Some(status.id);
            }
            UpdateField::Type => {
                let kind =
                    self.resolve_attribute(AttributeKind::Type, integer(content)?, item.board_id)?;
                updated.type_id = Some(kind.id);
            }
            UpdateField::Section => {
                let section = self.resolve_section(integer(content)?, item.board_id)?;
                updated.section_id = section.id;
            }
            UpdateField::ParentItem => {
                updated.parent_item_id = match optional_integer(content)? {
                    Some(parent_id) => {
                        let parent = self.resolve_parent(Some(item.id()), parent_id, item.board_id)?;
                        Some(parent.id())
                    }
                    None => None,
                };
            }
            UpdateField::Assignee => {
                updated.assignee_id = match optional_integer(content)? {
                    Some(user_id) => Some(self.resolve_user(user_id)?.id),
                    None => None,
                };
            }
            UpdateField::RelatedUsers => return Err(no_such_field()),
        }
        self.repos.items.save_item(&updated)?;
        Ok(updated)
    }

    pub fn update_comment(&self, comment: &Comment, request: &UpdateRequest) -> CoreResult<Comment> {
        let mut updated = comment.clone();
        match request.field_for(UpdateTarget::Comment)? {
            UpdateField::Name => updated.core.title = required_text(&request.content)?,
            UpdateField::Description => {
                updated.core.description = optional_text(&request.content)?;
            }
            UpdateField::RelatedUsers => {
                updated.related_user_ids = self.resolve_users(&id_list(&request.content)?)?;
            }
            _ => return Err(no_such_field()),
        }
        self.repos.comments.save_comment(&updated)?;
        Ok(updated)
    }

    /// Loads an attribute of `kind` and checks it lives on `board_id`.
    pub(crate) fn resolve_attribute(
        &self,
        kind: AttributeKind,
        id: AttributeId,
        board_id: BoardId,
    ) -> CoreResult<Attribute> {
        let attribute = self
            .repos
            .attributes
            .find_attribute(kind, id)?
            .ok_or_else(|| CoreError::not_found(kind.class().into(), id))?;
        if attribute.board_id != board_id {
            return Err(CoreError::IllegalInput(format!(
                "{kind} {id} belongs to board {}, not board {board_id}",
                attribute.board_id
            )));
        }
        Ok(attribute)
    }

    pub(crate) fn resolve_section(&self, id: SectionId, board_id: BoardId) -> CoreResult<Section> {
        let section = self
            .repos
            .boards
            .find_section(id)?
            .ok_or(CoreError::not_found(Entity::Section, id))?;
        if section.board_id != board_id {
            return Err(CoreError::IllegalInput(format!(
                "section {id} belongs to board {}, not board {board_id}",
                section.board_id
            )));
        }
        Ok(section)
    }

    /// Resolves `parent_id` as the parent of `child_id` (`None` for a new
    /// item), rejecting self-parenting and ancestor cycles.
    pub(crate) fn resolve_parent(
        &self,
        child_id: Option<ItemId>,
        parent_id: ItemId,
        board_id: BoardId,
    ) -> CoreResult<Item> {
        if child_id == Some(parent_id) {
            return Err(CoreError::IllegalInput(format!(
                "item {parent_id} cannot be its own parent"
            )));
        }
        let parent = self
            .repos
            .items
            .find_item(parent_id)?
            .ok_or(CoreError::not_found(Entity::Item, parent_id))?;
        if parent.board_id != board_id {
            return Err(CoreError::IllegalInput(format!(
                "item {parent_id} belongs to board {}, not board {board_id}",
                parent.board_id
            )));
        }

        if let Some(child_id) = child_id {
            let mut visited = HashSet::new();
            let mut cursor = parent.parent_item_id;
            while let Some(current) = cursor {
                if current == child_id || !visited.insert(current) {
                    return Err(CoreError::IllegalInput(format!(
                        "item {parent_id} is a descendant of item {child_id}"
                    )));
                }
                cursor = self
                    .repos
                    .items
                    .find_item(current)?
                    .and_then(|ancestor| ancestor.parent_item_id);
            }
        }
        Ok(parent)
    }

    pub(crate) fn resolve_user(&self, id: UserId) -> CoreResult<User> {
        self.repos
            .users
            .find_user(id)?
            .ok_or(CoreError::not_found(Entity::User, id))
    }

    /// Resolves every id; returns them sorted and deduplicated.
    pub(crate) fn resolve_users(&self, ids: &[UserId]) -> CoreResult<Vec<UserId>> {
        let mut resolved = ids
            .iter()
            .map(|id| self.resolve_user(*id).map(|user| user.id))
            .collect::<CoreResult<Vec<_>>>()?;
        resolved.sort_unstable();
        resolved.dedup();
        Ok(resolved)
    }
}

fn no_such_field() -> CoreError {
    CoreError::IllegalInput("Field object doesn't exist".to_string())
}

/// Non-blank string, trimmed.
pub(crate) fn required_text(content: &Value) -> CoreResult<String> {
    match content {
        Value::Null => Err(CoreError::NullInput("content")),
        Value::String(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Value::String(_) => Err(CoreError::IllegalInput("value must not be blank".to_string())),
        other => Err(type_mismatch("a string", other)),
    }
}

/// Any string; `null` clears to empty.
pub(crate) fn optional_text(content: &Value) -> CoreResult<String> {
    match content {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        other => Err(type_mismatch("a string", other)),
    }
}

/// JSON integer or a string holding one.
pub(crate) fn integer(content: &Value) -> CoreResult<i64> {
    match content {
        Value::Null => Err(CoreError::NullInput("content")),
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| type_mismatch("an integer", content)),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| type_mismatch("an integer", content)),
        other => Err(type_mismatch("an integer", other)),
    }
}

pub(crate) fn optional_integer(content: &Value) -> CoreResult<Option<i64>> {
    match content {
        Value::Null => Ok(None),
        other => integer(other).map(Some),
    }
}

pub(crate) fn id_list(content: &Value) -> CoreResult<Vec<i64>> {
    match content {
        Value::Null => Err(CoreError::NullInput("content")),
        Value::Array(values) => values.iter().map(integer).collect(),
        other => Err(type_mismatch("a list of ids", other)),
    }
}

pub(crate) fn importance(value: i64) -> CoreResult<i64> {
    if !IMPORTANCE_RANGE.contains(&value) {
        return Err(CoreError::IllegalInput(format!(
            "importance {value} outside {}..={}",
            IMPORTANCE_RANGE.start(),
            IMPORTANCE_RANGE.end()
        )));
    }
    Ok(value)
}

fn type_mismatch(expected: &str, actual: &Value) -> CoreError {
    let found = match actual {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    };
    CoreError::IllegalInput(format!("expected {expected}, got {found}"))
}
