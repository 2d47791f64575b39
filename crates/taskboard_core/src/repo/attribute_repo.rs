//! Attribute (Status/Type) persistence.
//!
//! # Invariants
//! - Every query is scoped by `kind`; a Type row is never returned for a
//!   Status lookup.
//! - Name uniqueness per `(board, kind)` is checked and enforced in the same
//!   immediate transaction as the insert.

use crate::model::attribute::{Attribute, AttributeId, AttributeKind};
use crate::model::board::BoardId;
use crate::model::class::Entity;
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const ATTRIBUTE_SELECT_SQL: &str = "SELECT id, board_id, kind, name, description FROM attributes";

/// Repository interface for board-scoped attributes.
pub trait AttributeRepository {
    /// Inserts a new attribute unless `(board, kind, name)` is taken.
    fn insert_attribute(
        &self,
        board_id: BoardId,
        kind: AttributeKind,
        name: &str,
        description: &str,
    ) -> RepoResult<Attribute>;
    /// Case-insensitive name match, optionally ignoring one attribute id.
    fn exists_by_board_and_name(
        &self,
        board_id: BoardId,
        kind: AttributeKind,
        name: &str,
        excluding: Option<AttributeId>,
    ) -> RepoResult<bool>;
    fn find_attribute(&self, kind: AttributeKind, id: AttributeId)
        -> RepoResult<Option<Attribute>>;
    fn find_by_board(&self, board_id: BoardId, kind: AttributeKind) -> RepoResult<Vec<Attribute>>;
    fn find_all(&self, kind: AttributeKind) -> RepoResult<Vec<Attribute>>;
    /// Attributes whose name contains `fragment`, case-insensitively.
    fn find_by_board_and_name_containing(
        &self,
        board_id: BoardId,
        kind: AttributeKind,
        fragment: &str,
    ) -> RepoResult<Vec<Attribute>>;
    fn save_attribute(&self, attribute: &Attribute) -> RepoResult<()>;
    /// Deletes one attribute; items referencing it keep living without it.
    fn delete_attribute(&self, kind: AttributeKind, id: AttributeId) -> RepoResult<()>;
}

pub struct SqliteAttributeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttributeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["attributes"])?;
        Ok(Self { conn })
    }

    fn query_list(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Attribute>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut attributes = Vec::new();
        while let Some(row) = rows.next()? {
            attributes.push(parse_attribute_row(row)?);
        }
        Ok(attributes)
    }
}

impl AttributeRepository for SqliteAttributeRepository<'_> {
    fn insert_attribute(
        &self,
        board_id: BoardId,
        kind: AttributeKind,
        name: &str,
        description: &str,
    ) -> RepoResult<Attribute> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if name_taken(&tx, board_id, kind, name, None)? {
            return Err(duplicate(kind, name, board_id));
        }

        let inserted = tx.execute(
            "INSERT INTO attributes (board_id, kind, name, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![board_id, kind.as_str(), name, description],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Err(duplicate(kind, name, board_id)),
            Err(err) => return Err(err.into()),
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.find_attribute(kind, id)?.ok_or(RepoError::NotFound {
            entity: kind.class().into(),
            id,
        })
    }

    fn exists_by_board_and_name(
        &self,
        board_id: BoardId,
        kind: AttributeKind,
        name: &str,
        excluding: Option<AttributeId>,
    ) -> RepoResult<bool> {
        name_taken(self.conn, board_id, kind, name, excluding)
    }

    fn find_attribute(
        &self,
        kind: AttributeKind,
        id: AttributeId,
    ) -> RepoResult<Option<Attribute>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_SELECT_SQL} WHERE id = ?1 AND kind = ?2;"
        ))?;
        let mut rows = stmt.query(params![id, kind.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attribute_row(row)?));
        }
        Ok(None)
    }

    fn find_by_board(&self, board_id: BoardId, kind: AttributeKind) -> RepoResult<Vec<Attribute>> {
        self.query_list(
            &format!("{ATTRIBUTE_SELECT_SQL} WHERE board_id = ?1 AND kind = ?2 ORDER BY id ASC;"),
            params![board_id, kind.as_str()],
        )
    }

    fn find_all(&self, kind: AttributeKind) -> RepoResult<Vec<Attribute>> {
        self.query_list(
            &format!("{ATTRIBUTE_SELECT_SQL} WHERE kind = ?1 ORDER BY board_id ASC, id ASC;"),
            [kind.as_str()],
        )
    }

    fn find_by_board_and_name_containing(
        &self,
        board_id: BoardId,
        kind: AttributeKind,
        fragment: &str,
    ) -> RepoResult<Vec<Attribute>> {
        let pattern = format!("%{}%", escape_like(fragment));
        self.query_list(
            &format!(
                "{ATTRIBUTE_SELECT_SQL}
                 WHERE board_id = ?1
                   AND kind = ?2
                   AND name LIKE ?3 ESCAPE '\\'
                 ORDER BY id ASC;"
            ),
            params![board_id, kind.as_str(), pattern],
        )
    }

    fn save_attribute(&self, attribute: &Attribute) -> RepoResult<()> {
        let updated = self.conn.execute(
            "UPDATE attributes SET name = ?3, description = ?4 WHERE id = ?1 AND kind = ?2;",
            params![
                attribute.id,
                attribute.kind.as_str(),
                attribute.name,
                attribute.description,
            ],
        );
        let changed = match updated {
            Ok(changed) => changed,
            Err(err) if is_unique_violation(&err) => {
                return Err(duplicate(attribute.kind, &attribute.name, attribute.board_id));
            }
            Err(err) => return Err(err.into()),
        };
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: attribute.kind.class().into(),
                id: attribute.id,
            });
        }
        Ok(())
    }

    fn delete_attribute(&self, kind: AttributeKind, id: AttributeId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM attributes WHERE id = ?1 AND kind = ?2;",
            params![id, kind.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::from(kind.class()),
                id,
            });
        }
        Ok(())
    }
}

fn name_taken(
    conn: &Connection,
    board_id: BoardId,
    kind: AttributeKind,
    name: &str,
    excluding: Option<AttributeId>,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM attributes
            WHERE board_id = ?1
              AND kind = ?2
              AND name = ?3 COLLATE NOCASE
              AND (?4 IS NULL OR id <> ?4)
        );",
        params![board_id, kind.as_str(), name, excluding],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn duplicate(kind: AttributeKind, name: &str, board_id: BoardId) -> RepoError {
    RepoError::Duplicate(format!("{kind} `{name}` already exists in board {board_id}"))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_attribute_row(row: &Row<'_>) -> RepoResult<Attribute> {
    let kind_text: String = row.get("kind")?;
    let kind = AttributeKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid attribute kind `{kind_text}` in attributes.kind"))
    })?;

    Ok(Attribute {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        kind,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}
