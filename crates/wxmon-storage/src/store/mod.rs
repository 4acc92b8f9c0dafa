use crate::error::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

pub mod location;
pub mod rule;
pub mod system_alert;

/// Unified access layer for the wxmon database.
///
/// All methods are `async fn` over SeaORM. Safe to share across tasks:
/// the HTTP API and the monitor loop read concurrently.
pub struct AlertStore {
    db: DatabaseConnection,
}

impl AlertStore {
    /// Connects and brings the schema up to date.
    ///
    /// `db_url` examples: `sqlite://data/wxmon.db?mode=rwc`,
    /// `sqlite::memory:` (tests).
    pub async fn new(db_url: &str) -> Result<Self> {
        let db = Database::connect(db_url).await?;

        // WAL mode only applies to SQLite
        if db_url.starts_with("sqlite:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;
        tracing::info!(db_url, "Initialized alert store");
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
