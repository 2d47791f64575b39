//! Core domain logic for the task board.
//! This crate is the single source of truth for board, attribute and
//! shared-content invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod permission;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::attribute::{Attribute, AttributeId, AttributeKind};
pub use model::board::{Board, BoardId, BoardMember, Section, SectionId};
pub use model::class::{ClassTag, Entity};
pub use model::content::{Comment, CommentId, ContentCore, ContentKind, Item, ItemId, SharedContent};
pub use model::setting::{Notification, NotificationKind, NotificationSetting, UserSetting};
pub use model::user::{User, UserId};
pub use permission::{PermissionLevel, PermissionPolicy, Resource, Verb};
pub use repo::{CascadeReport, RepoError, RepoResult, Repositories, SqliteRepositories};
pub use service::attribute_registry::{AttributeRegistry, CreateAttributeRequest};
pub use service::board_service::BoardService;
pub use service::content_engine::{ContentEngine, CreateContentRequest};
pub use service::dispatch::{DispatchTable, Handler};
pub use service::notification_service::{Delivery, EmailSender, NotificationService};
pub use service::update::{UpdateField, UpdateRequest, UpdateResolver, UpdateTarget};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
