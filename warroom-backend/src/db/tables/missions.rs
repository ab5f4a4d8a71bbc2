//! Mission history and per-officer responses

use rusqlite::params;
#[cfg(test)]
use rusqlite::{OptionalExtension, Row};

use crate::error::DbResult;
use crate::models::NewMission;
#[cfg(test)]
use crate::models::MissionMetadata;
use crate::text::{estimate_tokens, truncate_chars};
use super::super::{timestamp, Database};

pub const MAX_BRIEF_CHARS: usize = 1000;
pub const MAX_RESPONSE_CHARS: usize = 2000;

impl Database {
    /// Store a mission and one response row per officer result in a single
    /// transaction. Returns the new mission id.
    pub fn save_mission(&self, mission: &NewMission<'_>) -> DbResult<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = timestamp();
        let metadata = serde_json::to_string(&mission.metadata)?;

        tx.execute(
            "INSERT INTO mission_history (channel_id, mission_brief, user_id, capability_class_filter,
                                          started_at, completed_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)",
            params![
                mission.channel_id,
                truncate_chars(mission.brief, MAX_BRIEF_CHARS),
                mission.user_id,
                mission.capability_class_filter,
                now,
                metadata,
            ],
        )?;
        let mission_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO mission_officer_response (mission_id, officer_id, response_content,
                                                       tokens_used, success, error_message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for result in mission.results {
                stmt.execute(params![
                    mission_id,
                    result.officer_id,
                    truncate_chars(&result.response, MAX_RESPONSE_CHARS),
                    estimate_tokens(&result.response) as i64,
                    result.success,
                    result.error,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        log::info!(
            "Saved {} mission {} with {} responses in channel {}",
            mission.metadata.mission_type,
            mission_id,
            mission.results.len(),
            mission.channel_id
        );
        Ok(mission_id)
    }
}

/// A mission row as stored
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct MissionRecord {
    pub id: i64,
    pub channel_id: i64,
    pub mission_brief: String,
    pub user_id: i64,
    pub capability_class_filter: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub metadata: Option<MissionMetadata>,
}

/// A response row as stored
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct OfficerResponseRecord {
    pub id: i64,
    pub mission_id: i64,
    pub officer_id: String,
    pub response_content: String,
    pub tokens_used: i64,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: String,
}

// Read-back helpers for asserting on what a save wrote
#[cfg(test)]
impl Database {
    pub(crate) fn get_mission(&self, mission_id: i64) -> DbResult<Option<MissionRecord>> {
        let conn = self.conn()?;
        let mission = conn
            .query_row(
                "SELECT id, channel_id, mission_brief, user_id, capability_class_filter,
                        started_at, completed_at, metadata
                 FROM mission_history WHERE id = ?1",
                [mission_id],
                Self::row_to_mission,
            )
            .optional()?;
        Ok(mission)
    }

    /// Most recent missions for a channel, newest first
    pub(crate) fn list_channel_missions(&self, channel_id: i64, limit: usize) -> DbResult<Vec<MissionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, channel_id, mission_brief, user_id, capability_class_filter,
                    started_at, completed_at, metadata
             FROM mission_history WHERE channel_id = ?1
             ORDER BY started_at DESC, id DESC LIMIT ?2",
        )?;
        let missions = stmt
            .query_map(params![channel_id, limit as i64], Self::row_to_mission)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(missions)
    }

    pub(crate) fn list_mission_responses(&self, mission_id: i64) -> DbResult<Vec<OfficerResponseRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, mission_id, officer_id, response_content, tokens_used, success,
                    error_message, created_at
             FROM mission_officer_response WHERE mission_id = ?1 ORDER BY id",
        )?;
        let responses = stmt
            .query_map([mission_id], |row| {
                Ok(OfficerResponseRecord {
                    id: row.get(0)?,
                    mission_id: row.get(1)?,
                    officer_id: row.get(2)?,
                    response_content: row.get(3)?,
                    tokens_used: row.get(4)?,
                    success: row.get(5)?,
                    error_message: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(responses)
    }

    fn row_to_mission(row: &Row) -> rusqlite::Result<MissionRecord> {
        let metadata: Option<String> = row.get(7)?;
        Ok(MissionRecord {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            mission_brief: row.get(2)?,
            user_id: row.get(3)?,
            capability_class_filter: row.get(4)?,
            started_at: row.get(5)?,
            completed_at: row.get(6)?,
            metadata: metadata.and_then(|json| serde_json::from_str::<MissionMetadata>(&json).ok()),
        })
    }
}
