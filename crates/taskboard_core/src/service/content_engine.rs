//! Shared-content engine: items and comments behind one operation set.
//!
//! # Responsibility
//! - Resolve every foreign key of a create request before inserting.
//! - Best-effort batch deletion with item-subtree cascade.
//! - Field updates through `UpdateResolver` and multi-axis queries.
//!
//! # Invariants
//! - A batch delete never fails on an unknown id; it only counts the ids it
//!   actually removed.
//! - Deleting an item removes its comments and sub-items in the same
//!   transaction.

use crate::error::{CoreError, CoreResult};
use crate::model::attribute::{AttributeId, AttributeKind};
use crate::model::board::{BoardId, SectionId};
use crate::model::class::Entity;
use crate::model::content::{Comment, ContentKind, Item, ItemId, SharedContent};
use crate::model::user::UserId;
use crate::repo::comment_repo::NewComment;
use crate::repo::item_repo::NewItem;
use crate::repo::{RepoError, Repositories};
use crate::service::update::{importance, UpdateRequest, UpdateResolver};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Create payload for either family, as decoded by the facade.
///
/// Item creates read `section_id`, `status_id`, `type_id` and the optional
/// item fields; comment creates read `item_id` and `related_user_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateContentRequest {
    pub creator_id: Option<UserId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub section_id: Option<SectionId>,
    pub status_id: Option<AttributeId>,
    pub type_id: Option<AttributeId>,
    pub parent_item_id: Option<ItemId>,
    pub assignee_id: Option<UserId>,
    pub due_date: Option<i64>,
    pub importance: Option<i64>,
    pub item_id: Option<ItemId>,
    pub related_user_ids: Vec<UserId>,
}

/// Engine for one shared-content family.
#[derive(Clone, Copy)]
pub struct ContentEngine<'r> {
    kind: ContentKind,
    repos: Repositories<'r>,
}

impl<'r> ContentEngine<'r> {
    pub fn new(kind: ContentKind, repos: Repositories<'r>) -> Self {
        Self { kind, repos }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Creates one item or comment.
    ///
    /// # Errors
    /// - `NullInput` naming the first missing required field.
    /// - `NotFound` naming the first reference that did not resolve.
    /// - `IllegalInput` for a blank title, out-of-range importance, or a
    ///   reference that lives on another board.
    pub fn create(&self, request: &CreateContentRequest) -> CoreResult<SharedContent> {
        let created = match self.kind {
            ContentKind::Item => SharedContent::Item(self.create_item(request)?),
            ContentKind::Comment => SharedContent::Comment(self.create_comment(request)?),
        };
        info!(
            "event=content_create module=content status=ok kind={} id={}",
            self.kind,
            created.id()
        );
        Ok(created)
    }

    /// Deletes every id that resolves and returns how many were removed.
    ///
    /// Unknown ids are skipped. An id already removed by an earlier cascade
    /// in the same batch counts as unknown.
    pub fn delete(&self, ids: &[i64]) -> CoreResult<usize> {
        let mut deleted = 0;
        for &id in ids {
            let removed = match self.kind {
                ContentKind::Item => self.delete_item(id)?,
                ContentKind::Comment => self.delete_comment(id)?,
            };
            if removed {
                deleted += 1;
            } else {
                debug!(
                    "event=content_delete module=content status=skip kind={} id={id}",
                    self.kind
                );
            }
        }
        info!(
            "event=content_delete module=content status=ok kind={} requested={} deleted={deleted}",
            self.kind,
            ids.len()
        );
        Ok(deleted)
    }

    /// Applies one field change and returns the updated entity.
    pub fn update(&self, request: &UpdateRequest, id: i64) -> CoreResult<SharedContent> {
        let resolver = UpdateResolver::new(self.repos);
        let updated = match self.get(id)? {
            SharedContent::Item(item) => SharedContent::Item(resolver.update_item(&item, request)?),
            SharedContent::Comment(comment) => {
                SharedContent::Comment(resolver.update_comment(&comment, request)?)
            }
        };
        info!(
            "event=content_update module=content status=ok kind={} id={id} field={}",
            self.kind,
            request.field.as_deref().unwrap_or_default()
        );
        Ok(updated)
    }

    pub fn get(&self, id: i64) -> CoreResult<SharedContent> {
        match self.kind {
            ContentKind::Item => self.item(id).map(SharedContent::Item),
            ContentKind::Comment => self
                .repos
                .comments
                .find_comment(id)?
                .map(SharedContent::Comment)
                .ok_or(CoreError::not_found(Entity::Comment, id)),
        }
    }

    /// Comments on the item (comment engine) or its sub-items (item engine).
    pub fn get_all_in_item(&self, item_id: ItemId) -> CoreResult<Vec<SharedContent>> {
        let item = self.item(item_id)?;
        let contents = match self.kind {
            ContentKind::Item => self
                .repos
                .items
                .find_by_parent_item(item.id())?
                .into_iter()
                .map(SharedContent::Item)
                .collect(),
            ContentKind::Comment => self
                .repos
                .comments
                .find_by_item(item.id())?
                .into_iter()
                .map(SharedContent::Comment)
                .collect(),
        };
        Ok(contents)
    }

    pub fn get_all_in_section(&self, section_id: SectionId) -> CoreResult<Vec<Item>> {
        let section = self
            .repos
            .boards
            .find_section(section_id)?
            .ok_or(CoreError::not_found(Entity::Section, section_id))?;
        Ok(self.repos.items.find_by_section(section.id)?)
    }

    pub fn get_all_items_in_board(&self, board_id: BoardId) -> CoreResult<Vec<Item>> {
        let board = self
            .repos
            .boards
            .find_board(board_id)?
            .ok_or(CoreError::not_found(Entity::Board, board_id))?;
        Ok(self.repos.items.find_by_board(board.id)?)
    }

    /// Items currently holding the status.
    pub fn get_all_items_in_status(&self, status_id: AttributeId) -> CoreResult<Vec<Item>> {
        let status = self
            .repos
            .attributes
            .find_attribute(AttributeKind::Status, status_id)?
            .ok_or(CoreError::not_found(Entity::Status, status_id))?;
        Ok(self.repos.items.find_by_status(status.id)?)
    }

    /// Comments on every item of every section of the board.
    pub fn get_all_comments_in_board(&self, board_id: BoardId) -> CoreResult<Vec<Comment>> {
        let board = self
            .repos
            .boards
            .find_board(board_id)?
            .ok_or(CoreError::not_found(Entity::Board, board_id))?;
        Ok(self.repos.comments.find_by_board(board.id)?)
    }

    /// Comments on every item currently holding the status.
    pub fn get_all_comments_in_status(&self, status_id: AttributeId) -> CoreResult<Vec<Comment>> {
        let status = self
            .repos
            .attributes
            .find_attribute(AttributeKind::Status, status_id)?
            .ok_or(CoreError::not_found(Entity::Status, status_id))?;
        Ok(self.repos.comments.find_by_status(status.id)?)
    }

    fn create_item(&self, request: &CreateContentRequest) -> CoreResult<Item> {
        let resolver = UpdateResolver::new(self.repos);
        let creator_id = request.creator_id.ok_or(CoreError::NullInput("creator_id"))?;
        let title = required_title(request)?;
        let section_id = request.section_id.ok_or(CoreError::NullInput("section_id"))?;
        let status_id = request.status_id.ok_or(CoreError::NullInput("status_id"))?;
        let type_id = request.type_id.ok_or(CoreError::NullInput("type_id"))?;
        let importance = importance(request.importance.unwrap_or_default())?;

        let creator = resolver.resolve_user(creator_id)?;
        let section = self
            .repos
            .boards
            .find_section(section_id)?
            .ok_or(CoreError::not_found(Entity::Section, section_id))?;
        let status = resolver.resolve_attribute(AttributeKind::Status, status_id, section.board_id)?;
        let item_type = resolver.resolve_attribute(AttributeKind::Type, type_id, section.board_id)?;
        let parent_item_id = match request.parent_item_id {
            Some(parent_id) => Some(resolver.resolve_parent(None, parent_id, section.board_id)?.id()),
            None => None,
        };
        let assignee_id = match request.assignee_id {
            Some(user_id) => Some(resolver.resolve_user(user_id)?.id),
            None => None,
        };

        Ok(self.repos.items.insert_item(&NewItem {
            board_id: section.board_id,
            section_id: section.id,
            status_id: status.id,
            type_id: item_type.id,
            parent_item_id,
            creator_id: creator.id,
            assignee_id,
            title,
            description: request.description.clone().unwrap_or_default(),
            due_date: request.due_date,
            importance,
        })?)
    }

    fn create_comment(&self, request: &CreateContentRequest) -> CoreResult<Comment> {
        let resolver = UpdateResolver::new(self.repos);
        let creator_id = request.creator_id.ok_or(CoreError::NullInput("creator_id"))?;
        let title = required_title(request)?;
        let item_id = request.item_id.ok_or(CoreError::NullInput("item_id"))?;

        let creator = resolver.resolve_user(creator_id)?;
        let item = self.item(item_id)?;
        let related_user_ids = resolver.resolve_users(&request.related_user_ids)?;

        Ok(self.repos.comments.insert_comment(&NewComment {
            item_id: item.id(),
            creator_id: creator.id,
            title,
            description: request.description.clone().unwrap_or_default(),
            related_user_ids,
        })?)
    }

    fn delete_item(&self, id: ItemId) -> CoreResult<bool> {
        let report = match self.repos.items.delete_item(id) {
            Ok(report) => report,
            Err(RepoError::NotFound { .. }) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        debug!(
            "event=item_cascade module=content status=ok id={id} items={} comments={}",
            report.items, report.comments
        );
        Ok(true)
    }

    fn delete_comment(&self, id: i64) -> CoreResult<bool> {
        match self.repos.comments.delete_comment(id) {
            Ok(()) => Ok(true),
            Err(RepoError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn item(&self, id: ItemId) -> CoreResult<Item> {
        self.repos
            .items
            .find_item(id)?
            .ok_or(CoreError::not_found(Entity::Item, id))
    }
}

fn required_title(request: &CreateContentRequest) -> CoreResult<String> {
    let title = request.title.as_deref().ok_or(CoreError::NullInput("title"))?;
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::IllegalInput("title must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}
