//! User reference model.

use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// Account referenced by boards, items and comments.
///
/// Authentication data lives outside the core; only identity is kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Epoch ms.
    pub created_at: i64,
}
