//! Notification catalog seeding and preference-aware delivery.
//!
//! # Responsibility
//! - Seed the `NotificationSetting` catalog from `NotificationKind`.
//! - Read and change per-user delivery preferences.
//! - Materialize in-app notifications and hand emails to an `EmailSender`.
//!
//! # Invariants
//! - Nothing is delivered on a channel the user switched off.
//! - An email failure never fails the triggering operation; it is logged and
//!   reported as not emailed.

use crate::error::{CoreError, CoreResult};
use crate::model::class::Entity;
use crate::model::setting::{
    Notification, NotificationId, NotificationKind, NotificationSetting, UserSetting,
};
use crate::model::user::{User, UserId};
use crate::repo::Repositories;
use log::{info, warn};

/// Outbound email port. Delivery itself lives outside the core.
pub trait EmailSender {
    fn send(&self, recipient: &User, subject: &str, body: &str) -> Result<(), String>;
}

/// What `notify` actually delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub in_app: Option<Notification>,
    pub emailed: bool,
}

pub struct NotificationService<'r> {
    repos: Repositories<'r>,
    email: &'r dyn EmailSender,
}

impl<'r> NotificationService<'r> {
    pub fn new(repos: Repositories<'r>, email: &'r dyn EmailSender) -> Self {
        Self { repos, email }
    }

    /// Inserts missing catalog entries; safe to call on every start.
    pub fn seed_catalog(&self) -> CoreResult<usize> {
        let inserted = self.repos.settings.seed_catalog()?;
        info!("event=catalog_seed module=notification status=ok inserted={inserted}");
        Ok(inserted)
    }

    pub fn list_settings(&self) -> CoreResult<Vec<NotificationSetting>> {
        Ok(self.repos.settings.list_settings()?)
    }

    /// The user's preference for `kind`, created with defaults if absent.
    pub fn user_setting(&self, user_id: UserId, kind: NotificationKind) -> CoreResult<UserSetting> {
        self.user(user_id)?;
        let setting = self.setting(kind)?;
        Ok(self
            .repos
            .settings
            .find_or_create_user_setting(user_id, setting.id)?)
    }

    pub fn update_user_setting(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        in_app: bool,
        in_email: bool,
    ) -> CoreResult<UserSetting> {
        let mut setting = self.user_setting(user_id, kind)?;
        setting.in_app = in_app;
        setting.in_email = in_email;
        self.repos.settings.save_user_setting(&setting)?;
        Ok(setting)
    }

    /// Delivers one event to one user according to their preference.
    pub fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        message: &str,
    ) -> CoreResult<Delivery> {
        let user = self.user(user_id)?;
        let preference = self.user_setting(user.id, kind)?;

        let in_app = if preference.in_app {
            Some(
                self.repos
                    .settings
                    .insert_notification(user.id, preference.setting_id, message)?,
            )
        } else {
            None
        };

        let emailed = preference.in_email
            && match self.email.send(&user, kind.description(), message) {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        "event=notify_email module=notification status=error user_id={} kind={} error={err}",
                        user.id,
                        kind.as_str()
                    );
                    false
                }
            };

        info!(
            "event=notify module=notification status=ok user_id={} kind={} in_app={} emailed={emailed}",
            user.id,
            kind.as_str(),
            in_app.is_some()
        );
        Ok(Delivery { in_app, emailed })
    }

    /// Newest first.
    pub fn list_notifications(&self, user_id: UserId) -> CoreResult<Vec<Notification>> {
        self.user(user_id)?;
        Ok(self.repos.settings.find_notifications(user_id)?)
    }

    pub fn mark_read(&self, notification_id: NotificationId) -> CoreResult<()> {
        Ok(self.repos.settings.mark_read(notification_id)?)
    }

    fn user(&self, user_id: UserId) -> CoreResult<User> {
        self.repos
            .users
            .find_user(user_id)?
            .ok_or(CoreError::not_found(Entity::User, user_id))
    }

    fn setting(&self, kind: NotificationKind) -> CoreResult<NotificationSetting> {
        self.repos.settings.find_setting(kind)?.ok_or_else(|| {
            CoreError::IllegalInput(format!(
                "notification catalog has no `{}` entry; seed it first",
                kind.as_str()
            ))
        })
    }
}
