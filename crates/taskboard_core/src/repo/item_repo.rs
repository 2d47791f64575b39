//! Item persistence and the item-subtree cascade.
//!
//! # Responsibility
//! - CRUD and multi-axis lookups (section, parent item, status, board).
//! - Remove an item together with its sub-items and every comment attached
//!   to any of them.
//!
//! # Invariants
//! - Cascade order: related users, comments, parent links, items. No
//!   foreign key is ever left pointing at a removed row.
//! - Lookups are ordered by `id ASC`.

use crate::model::attribute::AttributeId;
use crate::model::board::{BoardId, SectionId};
use crate::model::class::Entity;
use crate::model::content::{ContentCore, Item, ItemId};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, CascadeReport, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{HashSet, VecDeque};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    board_id,
    section_id,
    status_id,
    type_id,
    parent_item_id,
    creator_id,
    assignee_id,
    title,
    description,
    due_date,
    importance,
    created_at
FROM items";

/// Fully resolved input for one item insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub board_id: BoardId,
    pub section_id: SectionId,
    pub status_id: AttributeId,
    pub type_id: AttributeId,
    pub parent_item_id: Option<ItemId>,
    pub creator_id: UserId,
    pub assignee_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub due_date: Option<i64>,
    pub importance: i64,
}

/// Repository interface for items.
pub trait ItemRepository {
    fn insert_item(&self, item: &NewItem) -> RepoResult<Item>;
    fn find_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn find_by_section(&self, section_id: SectionId) -> RepoResult<Vec<Item>>;
    fn find_by_parent_item(&self, parent_item_id: ItemId) -> RepoResult<Vec<Item>>;
    fn find_by_status(&self, status_id: AttributeId) -> RepoResult<Vec<Item>>;
    fn find_by_board(&self, board_id: BoardId) -> RepoResult<Vec<Item>>;
    fn save_item(&self, item: &Item) -> RepoResult<()>;
    /// Deletes the item, its sub-items and all their comments atomically.
    fn delete_item(&self, id: ItemId) -> RepoResult<CascadeReport>;
}

pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["items", "comments", "comment_related_users"])?;
        Ok(Self { conn })
    }

    fn list_where(&self, condition: &str, id: i64) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE {condition} ORDER BY id ASC;"))?;
        let items = stmt
            .query_map([id], parse_item_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn insert_item(&self, item: &NewItem) -> RepoResult<Item> {
        self.conn.execute(
            "INSERT INTO items (
                board_id,
                section_id,
                status_id,
                type_id,
                parent_item_id,
                creator_id,
                assignee_id,
                title,
                description,
                due_date,
                importance
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                item.board_id,
                item.section_id,
                item.status_id,
                item.type_id,
                item.parent_item_id,
                item.creator_id,
                item.assignee_id,
                item.title,
                item.description,
                item.due_date,
                item.importance,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_item(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Item,
            id,
        })
    }

    fn find_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_item_row,
            )
            .optional()?;
        Ok(item)
    }

    fn find_by_section(&self, section_id: SectionId) -> RepoResult<Vec<Item>> {
        self.list_where("section_id = ?1", section_id)
    }

    fn find_by_parent_item(&self, parent_item_id: ItemId) -> RepoResult<Vec<Item>> {
        self.list_where("parent_item_id = ?1", parent_item_id)
    }

    fn find_by_status(&self, status_id: AttributeId) -> RepoResult<Vec<Item>> {
        self.list_where("status_id = ?1", status_id)
    }

    fn find_by_board(&self, board_id: BoardId) -> RepoResult<Vec<Item>> {
        self.list_where("board_id = ?1", board_id)
    }

    fn save_item(&self, item: &Item) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                section_id = ?2,
                status_id = ?3,
                type_id = ?4,
                parent_item_id = ?5,
                assignee_id = ?6,
                title = ?7,
                description = ?8,
                due_date = ?9,
                importance = ?10
             WHERE id = ?1;",
            params![
                item.id(),
                item.section_id,
                item.status_id,
                item.type_id,
                item.parent_item_id,
                item.assignee_id,
                item.core.title,
                item.core.description,
                item.due_date,
                item.importance,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Item,
                id: item.id(),
            });
        }
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<CascadeReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: Entity::Item,
                id,
            });
        }

        let report = delete_item_subtrees(&tx, &[id])?;
        tx.commit()?;
        Ok(report)
    }
}

/// Deletes `roots`, every descendant item, and their comments.
///
/// Must run inside the caller's transaction.
pub(crate) fn delete_item_subtrees(
    conn: &Connection,
    roots: &[ItemId],
) -> RepoResult<CascadeReport> {
    let doomed = collect_item_subtrees(conn, roots)?;
    let mut report = CascadeReport::default();

    for id in &doomed {
        conn.execute(
            "DELETE FROM comment_related_users
             WHERE comment_id IN (SELECT id FROM comments WHERE item_id = ?1);",
            [id],
        )?;
        report.comments += conn.execute("DELETE FROM comments WHERE item_id = ?1;", [id])?;
    }

    // Parent links inside the doomed set are cut first so deletion order
    // does not matter to the foreign key on parent_item_id.
    for id in &doomed {
        conn.execute("UPDATE items SET parent_item_id = NULL WHERE id = ?1;", [id])?;
    }
    for id in &doomed {
        report.items += conn.execute("DELETE FROM items WHERE id = ?1;", [id])?;
    }

    Ok(report)
}

fn collect_item_subtrees(conn: &Connection, roots: &[ItemId]) -> RepoResult<Vec<ItemId>> {
    let mut stmt = conn.prepare("SELECT id FROM items WHERE parent_item_id = ?1;")?;
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut queue: VecDeque<ItemId> = roots.iter().copied().collect();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        ordered.push(id);
        let children = stmt
            .query_map([id], |row| row.get::<_, ItemId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        queue.extend(children);
    }

    Ok(ordered)
}

fn parse_item_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        core: ContentCore {
            id: row.get("id")?,
            creator_id: row.get("creator_id")?,
            created_at: row.get("created_at")?,
            title: row.get("title")?,
            description: row.get("description")?,
        },
        board_id: row.get("board_id")?,
        section_id: row.get("section_id")?,
        status_id: row.get("status_id")?,
        type_id: row.get("type_id")?,
        assignee_id: row.get("assignee_id")?,
        due_date: row.get("due_date")?,
        importance: row.get("importance")?,
        parent_item_id: row.get("parent_item_id")?,
    })
}
