//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository ports into registry/engine operations.
//! - Stay storage-agnostic: services only see `Repositories`.

pub mod attribute_registry;
pub mod board_service;
pub mod content_engine;
pub mod dispatch;
pub mod notification_service;
pub mod update;
