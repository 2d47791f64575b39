//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskboard_core` wiring end to
//!   end: config, logging, migrations and catalog seeding.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use std::process::ExitCode;
use taskboard_core::{
    CoreConfig, EmailSender, NotificationService, SqliteRepositories, User,
};

/// Email port for the probe: logs instead of sending.
struct LogOnlyEmail;

impl EmailSender for LogOnlyEmail {
    fn send(&self, recipient: &User, subject: &str, _body: &str) -> Result<(), String> {
        info!(
            "event=email_skip module=cli status=ok user_id={} subject={subject}",
            recipient.id
        );
        Ok(())
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskboard_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = CoreConfig::from_env()?;
    let logging = config.init_logging()?;

    let conn = config.open_database().map_err(|err| err.to_string())?;
    let repos = SqliteRepositories::try_new(&conn).map_err(|err| err.to_string())?;
    let notifications = NotificationService::new(repos.ports(), &LogOnlyEmail);
    let seeded = notifications
        .seed_catalog()
        .map_err(|err| err.to_string())?;
    let catalog = notifications
        .list_settings()
        .map_err(|err| err.to_string())?;

    println!("taskboard_core ping={}", taskboard_core::ping());
    println!("taskboard_core version={}", taskboard_core::core_version());
    println!("logging={}", if logging { "on" } else { "off" });
    println!("notification_catalog seeded={seeded} total={}", catalog.len());
    Ok(())
}
