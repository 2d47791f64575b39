//! Comment persistence.
//!
//! # Invariants
//! - Related users are stored in `comment_related_users` and always written
//!   together with their comment in one transaction.
//! - `related_user_ids` is returned sorted and deduplicated.

use crate::model::attribute::AttributeId;
use crate::model::board::BoardId;
use crate::model::class::Entity;
use crate::model::content::{Comment, CommentId, ContentCore, ItemId};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

const COMMENT_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.item_id AS item_id,
    c.creator_id AS creator_id,
    c.title AS title,
    c.description AS description,
    c.created_at AS created_at
FROM comments c";

/// Fully resolved input for one comment insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub item_id: ItemId,
    pub creator_id: UserId,
    pub title: String,
    pub description: String,
    pub related_user_ids: Vec<UserId>,
}

/// Repository interface for comments.
pub trait CommentRepository {
    fn insert_comment(&self, comment: &NewComment) -> RepoResult<Comment>;
    fn find_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    fn find_by_item(&self, item_id: ItemId) -> RepoResult<Vec<Comment>>;
    /// Comments on every item of every section in the board.
    fn find_by_board(&self, board_id: BoardId) -> RepoResult<Vec<Comment>>;
    /// Comments on every item currently holding the status.
    fn find_by_status(&self, status_id: AttributeId) -> RepoResult<Vec<Comment>>;
    /// Rewrites title, description and the related-user set.
    fn save_comment(&self, comment: &Comment) -> RepoResult<()>;
    fn delete_comment(&self, id: CommentId) -> RepoResult<()>;
}

pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["comments", "comment_related_users"])?;
        Ok(Self { conn })
    }

    fn list(&self, sql: &str, id: i64) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(Comment {
                core: ContentCore {
                    id: row.get("id")?,
                    creator_id: row.get("creator_id")?,
                    created_at: row.get("created_at")?,
                    title: row.get("title")?,
                    description: row.get("description")?,
                },
                item_id: row.get("item_id")?,
                related_user_ids: Vec::new(),
            });
        }
        for comment in &mut comments {
            comment.related_user_ids = load_related_users(self.conn, comment.id())?;
        }
        Ok(comments)
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn insert_comment(&self, comment: &NewComment) -> RepoResult<Comment> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO comments (item_id, creator_id, title, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.item_id,
                comment.creator_id,
                comment.title,
                comment.description,
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_related_users(&tx, id, &comment.related_user_ids)?;
        tx.commit()?;

        self.find_comment(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Comment,
            id,
        })
    }

    fn find_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut found = self.list(&format!("{COMMENT_SELECT_SQL} WHERE c.id = ?1;"), id)?;
        Ok(found.pop())
    }

    fn find_by_item(&self, item_id: ItemId) -> RepoResult<Vec<Comment>> {
        self.list(
            &format!("{COMMENT_SELECT_SQL} WHERE c.item_id = ?1 ORDER BY c.id ASC;"),
            item_id,
        )
    }

    fn find_by_board(&self, board_id: BoardId) -> RepoResult<Vec<Comment>> {
        self.list(
            &format!(
                "{COMMENT_SELECT_SQL}
                 INNER JOIN items i ON i.id = c.item_id
                 INNER JOIN sections s ON s.id = i.section_id
                 WHERE s.board_id = ?1
                 ORDER BY c.id ASC;"
            ),
            board_id,
        )
    }

    fn find_by_status(&self, status_id: AttributeId) -> RepoResult<Vec<Comment>> {
        self.list(
            &format!(
                "{COMMENT_SELECT_SQL}
                 INNER JOIN items i ON i.id = c.item_id
                 WHERE i.status_id = ?1
                 ORDER BY c.id ASC;"
            ),
            status_id,
        )
    }

    fn save_comment(&self, comment: &Comment) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE comments SET title = ?2, description = ?3 WHERE id = ?1;",
            params![comment.id(), comment.core.title, comment.core.description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Comment,
                id: comment.id(),
            });
        }
        tx.execute(
            "DELETE FROM comment_related_users WHERE comment_id = ?1;",
            [comment.id()],
        )?;
        write_related_users(&tx, comment.id(), &comment.related_user_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_comment(&self, id: CommentId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM comment_related_users WHERE comment_id = ?1;",
            [id],
        )?;
        let changed = tx.execute("DELETE FROM comments WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Comment,
                id,
            });
        }
        tx.commit()?;
        Ok(())
    }
}

fn write_related_users(
    conn: &Connection,
    comment_id: CommentId,
    user_ids: &[UserId],
) -> RepoResult<()> {
    for user_id in user_ids {
        conn.execute(
            "INSERT OR IGNORE INTO comment_related_users (comment_id, user_id) VALUES (?1, ?2);",
            params![comment_id, user_id],
        )?;
    }
    Ok(())
}

fn load_related_users(conn: &Connection, comment_id: CommentId) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM comment_related_users WHERE comment_id = ?1 ORDER BY user_id ASC;",
    )?;
    let users = stmt
        .query_map([comment_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<UserId>>>()?;
    Ok(users)
}
