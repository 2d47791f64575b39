//! Attribute registry: board-scoped Status and Type management.
//!
//! # Responsibility
//! - Create, delete, look up, enumerate and update attributes of one family.
//! - Enforce the name pattern and per-board uniqueness.
//!
//! # Invariants
//! - An attribute is only visible through the board that owns it.
//! - Concurrent creates of the same name on one board cannot both succeed:
//!   check and insert share one immediate transaction in the repository.

use crate::error::{CoreError, CoreResult};
use crate::model::attribute::{normalize_attribute_name, Attribute, AttributeId, AttributeKind};
use crate::model::board::{Board, BoardId};
use crate::model::class::Entity;
use crate::repo::Repositories;
use crate::service::update::{UpdateRequest, UpdateResolver};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Create payload as decoded by the facade; absent values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAttributeRequest {
    pub board_id: Option<BoardId>,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateAttributeRequest {
    pub fn new(board_id: BoardId, name: impl Into<String>) -> Self {
        Self {
            board_id: Some(board_id),
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Registry for one attribute family.
#[derive(Clone, Copy)]
pub struct AttributeRegistry<'r> {
    kind: AttributeKind,
    repos: Repositories<'r>,
}

impl<'r> AttributeRegistry<'r> {
    pub fn new(kind: AttributeKind, repos: Repositories<'r>) -> Self {
        Self { kind, repos }
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Creates an attribute in a board.
    ///
    /// # Errors
    /// - `NullInput` for a missing board id or name.
    /// - `IllegalInput` when the name does not match the attribute pattern.
    /// - `NotFound` when the board does not exist.
    /// - `Conflict` when the board already has this name for this family.
    pub fn create(&self, request: &CreateAttributeRequest) -> CoreResult<Attribute> {
        let board_id = request.board_id.ok_or(CoreError::NullInput("board_id"))?;
        let raw_name = request.name.as_deref().ok_or(CoreError::NullInput("name"))?;
        let name = normalize_attribute_name(raw_name)?;
        let description = request.description.clone().unwrap_or_default();
        let board = self.board(board_id)?;

        match self
            .repos
            .attributes
            .insert_attribute(board.id, self.kind, &name, &description)
        {
            Ok(attribute) => {
                info!(
                    "event=attribute_create module=attribute status=ok kind={} board_id={} attribute_id={}",
                    self.kind, board.id, attribute.id
                );
                Ok(attribute)
            }
            Err(err) => {
                let err = CoreError::from(err);
                if matches!(err, CoreError::Conflict(_)) {
                    warn!(
                        "event=attribute_create module=attribute status=conflict kind={} board_id={}",
                        self.kind, board.id
                    );
                }
                Err(err)
            }
        }
    }

    /// Deletes one attribute of this family from the board.
    ///
    /// Items that reference it survive with the reference cleared.
    pub fn delete(&self, board_id: BoardId, attribute_id: AttributeId) -> CoreResult<bool> {
        let attribute = self.get(board_id, attribute_id)?;
        self.repos
            .attributes
            .delete_attribute(self.kind, attribute.id)?;
        info!(
            "event=attribute_delete module=attribute status=ok kind={} board_id={board_id} attribute_id={attribute_id}",
            self.kind
        );
        Ok(true)
    }

    /// Looks up an attribute through its board.
    pub fn get(&self, board_id: BoardId, attribute_id: AttributeId) -> CoreResult<Attribute> {
        let board = self.board(board_id)?;
        self.repos
            .attributes
            .find_attribute(self.kind, attribute_id)?
            .filter(|attribute| attribute.board_id == board.id)
            .ok_or_else(|| CoreError::not_found(self.entity(), attribute_id))
    }

    /// All attributes of this family in the board; may be empty.
    pub fn get_all_in_board(&self, board_id: BoardId) -> CoreResult<Vec<Attribute>> {
        let board = self.board(board_id)?;
        Ok(self.repos.attributes.find_by_board(board.id, self.kind)?)
    }

    /// Every attribute of this family across all boards.
    pub fn get_all(&self) -> CoreResult<Vec<Attribute>> {
        Ok(self.repos.attributes.find_all(self.kind)?)
    }

    /// Attributes in the board whose name contains `partial_name`.
    ///
    /// Used to warn about near-duplicates; uniqueness is enforced by `create`.
    pub fn check_similarity(
        &self,
        board_id: BoardId,
        partial_name: &str,
    ) -> CoreResult<Vec<Attribute>> {
        let board = self.board(board_id)?;
        Ok(self
            .repos
            .attributes
            .find_by_board_and_name_containing(board.id, self.kind, partial_name.trim())?)
    }

    /// Applies one NAME or DESCRIPTION change.
    pub fn update(
        &self,
        board_id: BoardId,
        attribute_id: AttributeId,
        request: &UpdateRequest,
    ) -> CoreResult<Attribute> {
        let attribute = self.get(board_id, attribute_id)?;
        let updated = UpdateResolver::new(self.repos).update_attribute(&attribute, request)?;
        info!(
            "event=attribute_update module=attribute status=ok kind={} attribute_id={attribute_id}",
            self.kind
        );
        Ok(updated)
    }

    fn board(&self, board_id: BoardId) -> CoreResult<Board> {
        self.repos
            .boards
            .find_board(board_id)?
            .ok_or(CoreError::not_found(Entity::Board, board_id))
    }

    fn entity(&self) -> Entity {
        self.kind.class().into()
    }
}
