use rusqlite::params;

use crate::error::DbResult;
use crate::models::ManualNote;
use super::super::{timestamp, Database};

impl Database {
    pub fn add_manual_note(
        &self,
        channel_id: i64,
        officer_id: &str,
        note_content: &str,
        created_by_user_id: i64,
        is_pinned: bool,
    ) -> DbResult<i64> {
        let conn = self.conn()?;
        let now = timestamp();
        conn.execute(
            "INSERT INTO manual_notes (officer_id, channel_id, note_content, created_by_user_id,
                                       is_pinned, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![officer_id, channel_id, note_content, created_by_user_id, is_pinned, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Notes for one (officer, channel): pinned first, newest first within each group
    pub fn list_manual_notes(
        &self,
        channel_id: i64,
        officer_id: &str,
        limit: usize,
    ) -> DbResult<Vec<ManualNote>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, officer_id, channel_id, note_content, created_by_user_id, is_pinned,
                    created_at, updated_at
             FROM manual_notes
             WHERE officer_id = ?1 AND channel_id = ?2
             ORDER BY is_pinned DESC, created_at DESC, id DESC
             LIMIT ?3",
        )?;
        let notes = stmt
            .query_map(params![officer_id, channel_id, limit as i64], |row| {
                Ok(ManualNote {
                    id: row.get(0)?,
                    officer_id: row.get(1)?,
                    channel_id: row.get(2)?,
                    note_content: row.get(3)?,
                    created_by_user_id: row.get(4)?,
                    is_pinned: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Delete every manual note for (officer, channel). Mission history is untouched.
    pub fn clear_officer_memory(&self, channel_id: i64, officer_id: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM manual_notes WHERE officer_id = ?1 AND channel_id = ?2",
            params![officer_id, channel_id],
        )?;
        log::info!("Cleared {} notes for {} in channel {}", deleted, officer_id, channel_id);
        Ok(deleted)
    }
}
