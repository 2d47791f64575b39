//! Board, section and membership persistence.
//!
//! # Responsibility
//! - CRUD for boards and sections.
//! - Cascade board and section deletion down to attributes, items and
//!   comments in one transaction.
//!
//! # Invariants
//! - Creating a board also records its owner as an `Admin` member.
//! - A cascade either removes the whole subtree or nothing.

use crate::model::board::{Board, BoardId, BoardMember, Section, SectionId};
use crate::model::class::Entity;
use crate::model::user::UserId;
use crate::permission::PermissionLevel;
use crate::repo::item_repo::delete_item_subtrees;
use crate::repo::{ensure_connection_ready, CascadeReport, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const BOARD_SELECT_SQL: &str = "SELECT id, owner_id, name, description, created_at FROM boards";
const SECTION_SELECT_SQL: &str = "SELECT id, board_id, name, description FROM sections";

/// Repository interface for boards, sections and board membership.
pub trait BoardRepository {
    fn insert_board(&self, owner_id: UserId, name: &str, description: &str)
        -> RepoResult<Board>;
    fn find_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    fn find_boards_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Board>>;
    fn save_board(&self, board: &Board) -> RepoResult<()>;
    /// Removes the board with its attributes, sections, items and comments.
    fn delete_board(&self, id: BoardId) -> RepoResult<CascadeReport>;

    fn insert_section(
        &self,
        board_id: BoardId,
        name: &str,
        description: &str,
    ) -> RepoResult<Section>;
    fn find_section(&self, id: SectionId) -> RepoResult<Option<Section>>;
    fn find_sections_by_board(&self, board_id: BoardId) -> RepoResult<Vec<Section>>;
    fn save_section(&self, section: &Section) -> RepoResult<()>;
    /// Removes the section, its items (with their sub-items) and comments.
    fn delete_section(&self, id: SectionId) -> RepoResult<CascadeReport>;

    /// Inserts or replaces one membership row.
    fn upsert_member(&self, member: &BoardMember) -> RepoResult<()>;
    fn find_member_level(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> RepoResult<Option<PermissionLevel>>;
}

pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["boards", "board_members", "sections"])?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn insert_board(
        &self,
        owner_id: UserId,
        name: &str,
        description: &str,
    ) -> RepoResult<Board> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO boards (owner_id, name, description) VALUES (?1, ?2, ?3);",
            params![owner_id, name, description],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO board_members (board_id, user_id, level) VALUES (?1, ?2, ?3);",
            params![id, owner_id, PermissionLevel::Admin.as_str()],
        )?;
        tx.commit()?;

        self.find_board(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Board,
            id,
        })
    }

    fn find_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let board = self
            .conn
            .query_row(
                &format!("{BOARD_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_board_row,
            )
            .optional()?;
        Ok(board)
    }

    fn find_boards_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Board>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOARD_SELECT_SQL} WHERE owner_id = ?1 ORDER BY id ASC;"))?;
        let boards = stmt
            .query_map([owner_id], parse_board_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(boards)
    }

    fn save_board(&self, board: &Board) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE boards SET name = ?2, description = ?3 WHERE id = ?1;",
            params![board.id, board.name, board.description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Board,
                id: board.id,
            });
        }
        Ok(())
    }

    fn delete_board(&self, id: BoardId) -> RepoResult<CascadeReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "SELECT EXISTS(SELECT 1 FROM boards WHERE id = ?1);", id)? {
            return Err(RepoError::NotFound {
                entity: Entity::Board,
                id,
            });
        }

        let roots = select_ids(&tx, "SELECT id FROM items WHERE board_id = ?1;", id)?;
        let report = delete_item_subtrees(&tx, &roots)?;
        tx.execute("DELETE FROM sections WHERE board_id = ?1;", [id])?;
        tx.execute("DELETE FROM attributes WHERE board_id = ?1;", [id])?;
        tx.execute("DELETE FROM board_members WHERE board_id = ?1;", [id])?;
        tx.execute("DELETE FROM boards WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(report)
    }

    fn insert_section(
        &self,
        board_id: BoardId,
        name: &str,
        description: &str,
    ) -> RepoResult<Section> {
        self.conn.execute(
            "INSERT INTO sections (board_id, name, description) VALUES (?1, ?2, ?3);",
            params![board_id, name, description],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_section(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Section,
            id,
        })
    }

    fn find_section(&self, id: SectionId) -> RepoResult<Option<Section>> {
        let section = self
            .conn
            .query_row(
                &format!("{SECTION_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_section_row,
            )
            .optional()?;
        Ok(section)
    }

    fn find_sections_by_board(&self, board_id: BoardId) -> RepoResult<Vec<Section>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SECTION_SELECT_SQL} WHERE board_id = ?1 ORDER BY id ASC;"))?;
        let sections = stmt
            .query_map([board_id], parse_section_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sections)
    }

    fn save_section(&self, section: &Section) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE sections SET name = ?2, description = ?3 WHERE id = ?1;",
            params![section.id, section.name, section.description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Section,
                id: section.id,
            });
        }
        Ok(())
    }

    fn delete_section(&self, id: SectionId) -> RepoResult<CascadeReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "SELECT EXISTS(SELECT 1 FROM sections WHERE id = ?1);", id)? {
            return Err(RepoError::NotFound {
                entity: Entity::Section,
                id,
            });
        }

        let roots = select_ids(&tx, "SELECT id FROM items WHERE section_id = ?1;", id)?;
        let report = delete_item_subtrees(&tx, &roots)?;
        tx.execute("DELETE FROM sections WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(report)
    }

    fn upsert_member(&self, member: &BoardMember) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO board_members (board_id, user_id, level)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (board_id, user_id) DO UPDATE SET level = excluded.level;",
            params![member.board_id, member.user_id, member.level.as_str()],
        )?;
        Ok(())
    }

    fn find_member_level(
        &self,
        board_id: BoardId,
        user_id: UserId,
    ) -> RepoResult<Option<PermissionLevel>> {
        let level: Option<String> = self
            .conn
            .query_row(
                "SELECT level FROM board_members WHERE board_id = ?1 AND user_id = ?2;",
                params![board_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        level
            .map(|value| {
                PermissionLevel::parse(&value).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid permission level `{value}` in board_members.level"
                    ))
                })
            })
            .transpose()
    }
}

fn parse_board_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_section_row(row: &Row<'_>) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn row_exists(conn: &Connection, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}

fn select_ids(conn: &Connection, sql: &str, id: i64) -> RepoResult<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}
