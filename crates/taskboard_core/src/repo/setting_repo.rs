//! Notification catalog, user preferences and in-app notification storage.
//!
//! # Invariants
//! - `seed_catalog` is idempotent: rows are keyed by `NotificationKind` name.
//! - A missing `UserSetting` is created with schema defaults on first read.

use crate::model::class::Entity;
use crate::model::setting::{
    Notification, NotificationId, NotificationKind, NotificationSetting, NotificationSettingId,
    UserSetting,
};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, ensure_connection_ready, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for notification settings and notifications.
pub trait SettingRepository {
    /// Inserts catalog rows missing for any `NotificationKind`.
    /// Returns the number of rows inserted.
    fn seed_catalog(&self) -> RepoResult<usize>;
    fn list_settings(&self) -> RepoResult<Vec<NotificationSetting>>;
    fn find_setting(&self, kind: NotificationKind) -> RepoResult<Option<NotificationSetting>>;
    fn find_or_create_user_setting(
        &self,
        user_id: UserId,
        setting_id: NotificationSettingId,
    ) -> RepoResult<UserSetting>;
    fn save_user_setting(&self, setting: &UserSetting) -> RepoResult<()>;
    fn insert_notification(
        &self,
        user_id: UserId,
        setting_id: NotificationSettingId,
        message: &str,
    ) -> RepoResult<Notification>;
    fn find_notifications(&self, user_id: UserId) -> RepoResult<Vec<Notification>>;
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
}

pub struct SqliteSettingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["notification_settings", "user_settings", "notifications"],
        )?;
        Ok(Self { conn })
    }

    fn find_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT n.id, n.user_id, s.name, n.message, n.is_read, n.created_at
             FROM notifications n
             INNER JOIN notification_settings s ON s.id = n.setting_id
             WHERE n.id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_row(row)?));
        }
        Ok(None)
    }
}

impl SettingRepository for SqliteSettingRepository<'_> {
    fn seed_catalog(&self) -> RepoResult<usize> {
        let mut inserted = 0;
        for kind in NotificationKind::ALL {
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO notification_settings (name, description) VALUES (?1, ?2);",
                params![kind.as_str(), kind.description()],
            )?;
        }
        Ok(inserted)
    }

    fn list_settings(&self) -> RepoResult<Vec<NotificationSetting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM notification_settings ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut settings = Vec::new();
        while let Some(row) = rows.next()? {
            settings.push(parse_setting_row(row)?);
        }
        Ok(settings)
    }

    fn find_setting(&self, kind: NotificationKind) -> RepoResult<Option<NotificationSetting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM notification_settings WHERE name = ?1;")?;
        let mut rows = stmt.query([kind.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_setting_row(row)?));
        }
        Ok(None)
    }

    fn find_or_create_user_setting(
        &self,
        user_id: UserId,
        setting_id: NotificationSettingId,
    ) -> RepoResult<UserSetting> {
        self.conn.execute(
            "INSERT OR IGNORE INTO user_settings (user_id, setting_id) VALUES (?1, ?2);",
            params![user_id, setting_id],
        )?;

        let row = self
            .conn
            .query_row(
                "SELECT id, user_id, setting_id, in_app, in_email
                 FROM user_settings
                 WHERE user_id = ?1 AND setting_id = ?2;",
                params![user_id, setting_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;
        let (id, in_app, in_email) = row.ok_or(RepoError::NotFound {
            entity: Entity::NotificationSetting,
            id: setting_id,
        })?;

        Ok(UserSetting {
            id,
            user_id,
            setting_id,
            in_app: int_to_bool(in_app, "user_settings.in_app")?,
            in_email: int_to_bool(in_email, "user_settings.in_email")?,
        })
    }

    fn save_user_setting(&self, setting: &UserSetting) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE user_settings SET in_app = ?2, in_email = ?3 WHERE id = ?1;",
            params![
                setting.id,
                bool_to_int(setting.in_app),
                bool_to_int(setting.in_email),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::NotificationSetting,
                id: setting.id,
            });
        }
        Ok(())
    }

    fn insert_notification(
        &self,
        user_id: UserId,
        setting_id: NotificationSettingId,
        message: &str,
    ) -> RepoResult<Notification> {
        self.conn.execute(
            "INSERT INTO notifications (user_id, setting_id, message) VALUES (?1, ?2, ?3);",
            params![user_id, setting_id, message],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_notification(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Notification,
            id,
        })
    }

    fn find_notifications(&self, user_id: UserId) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT n.id, n.user_id, s.name, n.message, n.is_read, n.created_at
             FROM notifications n
             INNER JOIN notification_settings s ON s.id = n.setting_id
             WHERE n.user_id = ?1
             ORDER BY n.id DESC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE notifications SET is_read = 1 WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Notification,
                id,
            });
        }
        Ok(())
    }
}

fn parse_kind(value: &str, column: &str) -> RepoResult<NotificationKind> {
    NotificationKind::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid notification kind `{value}` in {column}"))
    })
}

fn parse_setting_row(row: &Row<'_>) -> RepoResult<NotificationSetting> {
    let name: String = row.get(1)?;
    Ok(NotificationSetting {
        id: row.get(0)?,
        kind: parse_kind(&name, "notification_settings.name")?,
        description: row.get(2)?,
    })
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let name: String = row.get(2)?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: parse_kind(&name, "notification_settings.name")?,
        message: row.get(3)?,
        is_read: int_to_bool(row.get(4)?, "notifications.is_read")?,
        created_at: row.get(5)?,
    })
}
