//! Error taxonomy shared by every core operation.
//!
//! # Invariants
//! - Errors are produced by the operation that detected them and reach the
//!   caller unchanged; mapping to transport status belongs to the facade.
//! - A missing required value (`NullInput`) is never reported as a lookup
//!   miss (`NotFound`) and vice versa.

use crate::model::class::Entity;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by registries, engines and the update resolver.
#[derive(Debug)]
pub enum CoreError {
    /// A required id or field was absent. Carries the field name.
    NullInput(&'static str),
    /// Malformed value, unknown field/class tag, or broken invariant.
    IllegalInput(String),
    /// An id did not resolve.
    NotFound { entity: Entity, id: i64 },
    /// Uniqueness violation, e.g. a duplicate attribute name on one board.
    Conflict(String),
    /// Rejected by the permission policy.
    Forbidden(String),
    /// Storage failure unrelated to the request content.
    Repo(RepoError),
}

impl CoreError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Whether the caller sent a bad request rather than hitting a fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repo(_))
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullInput(field) => write!(f, "null input: `{field}` is required"),
            Self::IllegalInput(message) => write!(f, "illegal input: {message}"),
            Self::NotFound { entity, id } => write!(f, "no such id: {entity} {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Forbidden(message) => write!(f, "forbidden: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Duplicate(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::model::class::Entity;
    use crate::repo::RepoError;

    #[test]
    fn repo_lookup_miss_becomes_not_found() {
        let err = CoreError::from(RepoError::NotFound {
            entity: Entity::Item,
            id: 7,
        });
        assert!(matches!(err, CoreError::NotFound { entity: Entity::Item, id: 7 }));
        assert_eq!(err.to_string(), "no such id: item 7");
    }

    #[test]
    fn repo_duplicate_becomes_conflict() {
        let err = CoreError::from(RepoError::Duplicate("status `Open`".to_string()));
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn invalid_data_stays_a_storage_fault() {
        let err = CoreError::from(RepoError::InvalidData("bad kind".to_string()));
        assert!(matches!(err, CoreError::Repo(_)));
        assert!(!err.is_client_error());
    }
}
