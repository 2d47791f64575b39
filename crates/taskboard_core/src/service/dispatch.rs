//! Class-to-engine dispatch table.
//!
//! # Responsibility
//! - Map a `ClassTag` to the one registry or engine that handles it, so the
//!   facade branches exactly once per request.
//!
//! # Invariants
//! - Every `ClassTag` maps to exactly one handler; the match is exhaustive.
//! - Unknown tag names fail with `IllegalInput("No such class in the system")`.

use crate::error::CoreResult;
use crate::model::attribute::AttributeKind;
use crate::model::class::ClassTag;
use crate::model::content::ContentKind;
use crate::repo::Repositories;
use crate::service::attribute_registry::AttributeRegistry;
use crate::service::content_engine::ContentEngine;

/// Handler selected for one class tag.
#[derive(Clone, Copy)]
pub enum Handler<'a, 'r> {
    Attribute(&'a AttributeRegistry<'r>),
    Content(&'a ContentEngine<'r>),
}

/// Status/Type registries and Item/Comment engines over one set of ports.
pub struct DispatchTable<'r> {
    statuses: AttributeRegistry<'r>,
    types: AttributeRegistry<'r>,
    items: ContentEngine<'r>,
    comments: ContentEngine<'r>,
}

impl<'r> DispatchTable<'r> {
    pub fn new(repos: Repositories<'r>) -> Self {
        Self {
            statuses: AttributeRegistry::new(AttributeKind::Status, repos),
            types: AttributeRegistry::new(AttributeKind::Type, repos),
            items: ContentEngine::new(ContentKind::Item, repos),
            comments: ContentEngine::new(ContentKind::Comment, repos),
        }
    }

    pub fn resolve(&self, tag: ClassTag) -> Handler<'_, 'r> {
        match tag {
            ClassTag::Status => Handler::Attribute(&self.statuses),
            ClassTag::Type => Handler::Attribute(&self.types),
            ClassTag::Item => Handler::Content(&self.items),
            ClassTag::Comment => Handler::Content(&self.comments),
        }
    }

    /// Parses a tag name from the request path, then resolves it.
    pub fn resolve_name(&self, tag: &str) -> CoreResult<Handler<'_, 'r>> {
        Ok(self.resolve(tag.parse()?))
    }

    /// Registry for an attribute tag; content tags are `IllegalInput`.
    pub fn attributes(&self, tag: ClassTag) -> CoreResult<&AttributeRegistry<'r>> {
        Ok(self.registry(AttributeKind::try_from(tag)?))
    }

    /// Engine for a content tag; attribute tags are `IllegalInput`.
    pub fn content(&self, tag: ClassTag) -> CoreResult<&ContentEngine<'r>> {
        Ok(self.engine(ContentKind::try_from(tag)?))
    }

    pub fn registry(&self, kind: AttributeKind) -> &AttributeRegistry<'r> {
        match kind {
            AttributeKind::Status => &self.statuses,
            AttributeKind::Type => &self.types,
        }
    }

    pub fn engine(&self, kind: ContentKind) -> &ContentEngine<'r> {
        match kind {
            ContentKind::Item => &self.items,
            ContentKind::Comment => &self.comments,
        }
    }
}
