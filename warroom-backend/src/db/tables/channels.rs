use rusqlite::params;

use crate::error::DbResult;
use super::super::{timestamp, Database};

impl Database {
    /// Create the channel row if it does not exist. Returns true when a row was inserted.
    pub fn ensure_channel(&self, channel_id: i64, channel_name: &str, guild_id: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let now = timestamp();
        let inserted = conn.execute(
            "INSERT INTO channels (channel_id, channel_name, guild_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(channel_id) DO NOTHING",
            params![channel_id, channel_name, guild_id, now],
        )?;
        if inserted > 0 {
            log::info!("Registered channel {} ({})", channel_name, channel_id);
        }
        Ok(inserted > 0)
    }
}

#[cfg(test)]
impl Database {
    pub(crate) fn channel_name(&self, channel_id: i64) -> DbResult<Option<String>> {
        use rusqlite::OptionalExtension;

        let conn = self.conn()?;
        let name = conn
            .query_row(
                "SELECT channel_name FROM channels WHERE channel_id = ?1",
                [channel_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }
}
