//! Board and section use-case service.
//!
//! # Responsibility
//! - Create, read, update and cascade-delete boards and sections.
//! - Manage board membership and gate requests through `PermissionPolicy`.
//!
//! # Invariants
//! - Board and section names are non-blank after trim.
//! - The board owner is an `Admin` member from creation on.

use crate::error::{CoreError, CoreResult};
use crate::model::board::{Board, BoardId, BoardMember, Section, SectionId};
use crate::model::class::Entity;
use crate::model::user::UserId;
use crate::permission::{PermissionLevel, PermissionPolicy, Resource, Verb};
use crate::repo::{CascadeReport, Repositories};
use crate::service::update::{UpdateField, UpdateRequest, UpdateResolver};
use log::{info, warn};

/// Board/section facade over the repository ports.
#[derive(Clone, Copy)]
pub struct BoardService<'r> {
    repos: Repositories<'r>,
    policy: PermissionPolicy,
}

impl<'r> BoardService<'r> {
    pub fn new(repos: Repositories<'r>) -> Self {
        Self {
            repos,
            policy: PermissionPolicy,
        }
    }

    pub fn create_board(
        &self,
        owner_id: Option<UserId>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> CoreResult<Board> {
        let owner_id = owner_id.ok_or(CoreError::NullInput("owner_id"))?;
        let name = normalize_name(name.ok_or(CoreError::NullInput("name"))?)?;
        self.repos
            .users
            .find_user(owner_id)?
            .ok_or(CoreError::not_found(Entity::User, owner_id))?;

        let board =
            self.repos
                .boards
                .insert_board(owner_id, &name, description.unwrap_or_default())?;
        info!(
            "event=board_create module=board status=ok board_id={} owner_id={owner_id}",
            board.id
        );
        Ok(board)
    }

    pub fn get_board(&self, board_id: BoardId) -> CoreResult<Board> {
        self.repos
            .boards
            .find_board(board_id)?
            .ok_or(CoreError::not_found(Entity::Board, board_id))
    }

    pub fn list_boards_for_owner(&self, owner_id: UserId) -> CoreResult<Vec<Board>> {
        Ok(self.repos.boards.find_boards_by_owner(owner_id)?)
    }

    /// Deletes the board with every attribute, section, item and comment.
    pub fn delete_board(&self, board_id: BoardId) -> CoreResult<CascadeReport> {
        let report = self.repos.boards.delete_board(board_id)?;
        info!(
            "event=board_delete module=board status=ok board_id={board_id} items={} comments={}",
            report.items, report.comments
        );
        Ok(report)
    }

    pub fn update_board(&self, board_id: BoardId, request: &UpdateRequest) -> CoreResult<Board> {
        let board = self.get_board(board_id)?;
        UpdateResolver::new(self.repos).update_board(&board, request)
    }

    pub fn create_section(
        &self,
        board_id: Option<BoardId>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> CoreResult<Section> {
        let board_id = board_id.ok_or(CoreError::NullInput("board_id"))?;
        let name = normalize_name(name.ok_or(CoreError::NullInput("name"))?)?;
        let board = self.get_board(board_id)?;

        let section =
            self.repos
                .boards
                .insert_section(board.id, &name, description.unwrap_or_default())?;
        info!(
            "event=section_create module=board status=ok board_id={board_id} section_id={}",
            section.id
        );
        Ok(section)
    }

    pub fn get_section(&self, section_id: SectionId) -> CoreResult<Section> {
        self.repos
            .boards
            .find_section(section_id)?
            .ok_or(CoreError::not_found(Entity::Section, section_id))
    }

    pub fn list_sections(&self, board_id: BoardId) -> CoreResult<Vec<Section>> {
        let board = self.get_board(board_id)?;
        Ok(self.repos.boards.find_sections_by_board(board.id)?)
    }

    /// Deletes the section, its items (with sub-items) and their comments.
    pub fn delete_section(&self, section_id: SectionId) -> CoreResult<CascadeReport> {
        let report = self.repos.boards.delete_section(section_id)?;
        info!(
            "event=section_delete module=board status=ok section_id={section_id} items={} comments={}",
            report.items, report.comments
        );
        Ok(report)
    }

    pub fn update_section(
        &self,
        section_id: SectionId,
        request: &UpdateRequest,
    ) -> CoreResult<Section> {
        let section = self.get_section(section_id)?;
        UpdateResolver::new(self.repos).update_section(&section, request)
    }

    pub fn add_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
        level: PermissionLevel,
    ) -> CoreResult<BoardMember> {
        let board = self.get_board(board_id)?;
        self.repos
            .users
            .find_user(user_id)?
            .ok_or(CoreError::not_found(Entity::User, user_id))?;

        let member = BoardMember {
            board_id: board.id,
            user_id,
            level,
        };
        self.repos.boards.upsert_member(&member)?;
        Ok(member)
    }

    /// Level of the user on the board; `None` for non-members.
    pub fn permission_level(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> CoreResult<Option<PermissionLevel>> {
        let board = self.get_board(board_id)?;
        Ok(self.repos.boards.find_member_level(board.id, user_id)?)
    }

    /// Gate consulted before a request reaches a registry or engine.
    ///
    /// Non-members are always `Forbidden`.
    pub fn authorize(
        &self,
        board_id: BoardId,
        user_id: UserId,
        resource: Resource,
        verb: Verb,
        field: Option<UpdateField>,
    ) -> CoreResult<PermissionLevel> {
        let Some(level) = self.permission_level(board_id, user_id)? else {
            warn!(
                "event=authorize module=board status=denied board_id={board_id} user_id={user_id} reason=not_member"
            );
            return Err(CoreError::Forbidden(format!(
                "user {user_id} is not a member of board {board_id}"
            )));
        };
        self.policy.check(level, resource, verb, field)?;
        Ok(level)
    }
}

fn normalize_name(value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::IllegalInput("name must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}
