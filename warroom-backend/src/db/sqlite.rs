use chrono::{SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

use crate::error::DbResult;

const MEMORY_DATABASE_URL: &str = ":memory:";

const POOL_SIZE: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed-width RFC 3339 UTC timestamp; sorts lexically in time order
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite store for officers, channels, missions and notes.
///
/// Each operation checks out its own pooled connection, so concurrent
/// officer tasks never share one. An in-memory database is pinned to a
/// single connection because every SQLite `:memory:` connection is a
/// separate database.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn new(database_url: &str) -> DbResult<Self> {
        let (manager, max_size) = if database_url == MEMORY_DATABASE_URL {
            (SqliteConnectionManager::memory(), 1)
        } else {
            // Create parent directory if it doesn't exist
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            (SqliteConnectionManager::file(database_url), POOL_SIZE)
        };

        let manager = manager.with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let mut builder = Pool::builder().max_size(max_size);
        if max_size == 1 {
            // Recycling the only in-memory connection would drop the database
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;
        let db = Self { pool };
        db.init()?;
        log::info!("Database ready at {}", database_url);
        Ok(db)
    }

    #[cfg(test)]
    pub fn in_memory() -> DbResult<Self> {
        Self::new(MEMORY_DATABASE_URL)
    }

    pub(crate) fn conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn init(&self) -> DbResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS officers (
                officer_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                model TEXT NOT NULL,
                capability_class TEXT NOT NULL,
                specialty TEXT NOT NULL,
                system_prompt TEXT NOT NULL,
                color INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS channels (
                channel_id INTEGER PRIMARY KEY,
                channel_name TEXT NOT NULL,
                guild_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Rolling per-officer channel summary; nothing writes it yet
            CREATE TABLE IF NOT EXISTS officer_channel_memory (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                officer_id TEXT NOT NULL REFERENCES officers(officer_id),
                channel_id INTEGER NOT NULL REFERENCES channels(channel_id),
                memory_content TEXT NOT NULL,
                memory_type TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                update_count INTEGER NOT NULL DEFAULT 1,
                metadata TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_officer_channel_mem
                ON officer_channel_memory(officer_id, channel_id);

            CREATE TABLE IF NOT EXISTS mission_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_id INTEGER NOT NULL REFERENCES channels(channel_id),
                mission_brief TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                capability_class_filter TEXT,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                metadata TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_mission_channel
                ON mission_history(channel_id, started_at);

            CREATE TABLE IF NOT EXISTS mission_officer_response (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mission_id INTEGER NOT NULL REFERENCES mission_history(id) ON DELETE CASCADE,
                officer_id TEXT NOT NULL REFERENCES officers(officer_id),
                response_content TEXT NOT NULL,
                tokens_used INTEGER NOT NULL,
                success INTEGER NOT NULL,
                error_message TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mission_responses
                ON mission_officer_response(mission_id);

            CREATE TABLE IF NOT EXISTS manual_notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                officer_id TEXT NOT NULL REFERENCES officers(officer_id),
                channel_id INTEGER NOT NULL REFERENCES channels(channel_id),
                note_content TEXT NOT NULL,
                created_by_user_id INTEGER NOT NULL,
                is_pinned INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                metadata TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_manual_notes
                ON manual_notes(officer_id, channel_id, is_pinned);",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &Database) -> Vec<String> {
        let conn = db.conn().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_schema_created() {
        let db = Database::in_memory().unwrap();
        assert_eq!(
            table_names(&db),
            [
                "channels",
                "manual_notes",
                "mission_history",
                "mission_officer_response",
                "officer_channel_memory",
                "officers"
            ]
        );
    }

    #[test]
    fn test_init_is_idempotent_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("warroom.db");
        let path = path.to_str().unwrap();

        Database::new(path).unwrap();
        let reopened = Database::new(path).unwrap();
        assert_eq!(table_names(&reopened).len(), 6);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }
}
