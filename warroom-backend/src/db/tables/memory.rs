//! Officer memory: the per-channel context injected into system prompts

use rusqlite::params;

use crate::error::DbResult;
use crate::models::OfficerMemoryStats;
use crate::text::{estimate_tokens, truncate_chars};
use super::super::Database;

pub const MEMORY_NOTE_LIMIT: usize = 10;
pub const MEMORY_MISSION_LIMIT: usize = 5;

const BRIEF_PREVIEW_CHARS: usize = 100;
const RESPONSE_PREVIEW_CHARS: usize = 200;

impl Database {
    /// Prompt-ready memory for one officer in one channel.
    ///
    /// Two sections: manual notes (pinned first) and recent successful
    /// mission responses. Failed responses never appear. Empty string when
    /// there is nothing to remember. Output is cut to `max_tokens * 4`
    /// characters once its estimate exceeds `max_tokens`.
    pub fn load_officer_memory(&self, channel_id: i64, officer_id: &str, max_tokens: usize) -> DbResult<String> {
        let notes = self.list_manual_notes(channel_id, officer_id, MEMORY_NOTE_LIMIT)?;
        let missions = self.recent_successful_responses(channel_id, officer_id)?;

        let mut sections = Vec::with_capacity(2);

        if !notes.is_empty() {
            let lines: Vec<String> = notes
                .iter()
                .map(|note| format!("- {}", note.note_content))
                .collect();
            sections.push(format!("### Manual Notes:\n{}", lines.join("\n")));
        }

        if !missions.is_empty() {
            let lines: Vec<String> = missions
                .iter()
                .map(|(brief, response)| {
                    format!(
                        "- Brief: {}... | Response: {}...",
                        truncate_chars(brief, BRIEF_PREVIEW_CHARS),
                        truncate_chars(response, RESPONSE_PREVIEW_CHARS)
                    )
                })
                .collect();
            sections.push(format!("### Recent Missions:\n{}", lines.join("\n")));
        }

        let context = sections.join("\n\n");
        if estimate_tokens(&context) > max_tokens {
            return Ok(truncate_chars(&context, max_tokens * 4).to_string());
        }
        Ok(context)
    }

    /// (brief, response) pairs, newest mission first
    fn recent_successful_responses(&self, channel_id: i64, officer_id: &str) -> DbResult<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT m.mission_brief, r.response_content
             FROM mission_officer_response r
             JOIN mission_history m ON r.mission_id = m.id
             WHERE r.officer_id = ?1 AND m.channel_id = ?2 AND r.success = 1
             ORDER BY m.started_at DESC, m.id DESC
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![officer_id, channel_id, MEMORY_MISSION_LIMIT as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Note and mission-response counts per officer in one channel, in the given order
    pub fn channel_stats(&self, channel_id: i64, officer_ids: &[String]) -> DbResult<Vec<OfficerMemoryStats>> {
        let conn = self.conn()?;
        let mut notes_stmt = conn.prepare(
            "SELECT COUNT(*) FROM manual_notes WHERE officer_id = ?1 AND channel_id = ?2",
        )?;
        let mut missions_stmt = conn.prepare(
            "SELECT COUNT(*) FROM mission_officer_response r
             JOIN mission_history m ON r.mission_id = m.id
             WHERE r.officer_id = ?1 AND m.channel_id = ?2",
        )?;

        let mut stats = Vec::with_capacity(officer_ids.len());
        for officer_id in officer_ids {
            let notes: i64 = notes_stmt.query_row(params![officer_id, channel_id], |row| row.get(0))?;
            let missions: i64 = missions_stmt.query_row(params![officer_id, channel_id], |row| row.get(0))?;
            stats.push(OfficerMemoryStats {
                officer_id: officer_id.clone(),
                notes,
                missions,
            });
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tables::test_support::{seeded_db, CHANNEL_A, CHANNEL_B, USER};
    use crate::models::{MissionMetadata, MissionType, NewMission, OfficerResult};

    fn save(db: &Database, channel_id: i64, brief: &str, results: &[OfficerResult]) {
        db.save_mission(&NewMission {
            channel_id,
            brief,
            user_id: USER,
            capability_class_filter: None,
            metadata: MissionMetadata::new(MissionType::Mission),
            results,
        })
        .unwrap();
    }

    #[test]
    fn test_empty_memory_is_empty_string() {
        let (db, _) = seeded_db();
        assert_eq!(db.load_officer_memory(CHANNEL_A, "A1", 2000).unwrap(), "");
    }

    #[test]
    fn test_memory_format() {
        let (db, roster) = seeded_db();
        db.add_manual_note(CHANNEL_A, "A1", "Prefers bullet points", USER, true).unwrap();
        save(
            &db,
            CHANNEL_A,
            "Assess the migration",
            &[OfficerResult::success(roster.get("A1").unwrap(), "Migration is low risk".to_string())],
        );

        let memory = db.load_officer_memory(CHANNEL_A, "A1", 2000).unwrap();
        assert_eq!(
            memory,
            "### Manual Notes:\n- Prefers bullet points\n\n\
             ### Recent Missions:\n- Brief: Assess the migration... | Response: Migration is low risk..."
        );
    }

    #[test]
    fn test_failed_responses_never_in_memory() {
        let (db, roster) = seeded_db();
        save(
            &db,
            CHANNEL_A,
            "Broken mission",
            &[OfficerResult::failure(roster.get("A1").unwrap(), "upstream exploded")],
        );
        assert_eq!(db.load_officer_memory(CHANNEL_A, "A1", 2000).unwrap(), "");

        let unusable = OfficerResult::unusable(roster.get("A1").unwrap(), "placeholder".to_string());
        save(&db, CHANNEL_A, "Empty reply mission", &[unusable]);
        assert!(!db.load_officer_memory(CHANNEL_A, "A1", 2000).unwrap().contains("placeholder"));
    }

    #[test]
    fn test_memory_isolated_per_channel_and_officer() {
        let (db, roster) = seeded_db();
        db.add_manual_note(CHANNEL_A, "A1", "secret for A1 in A", USER, false).unwrap();
        save(
            &db,
            CHANNEL_A,
            "channel A brief",
            &[OfficerResult::success(roster.get("A1").unwrap(), "A1 answer".to_string())],
        );

        let other_channel = db.load_officer_memory(CHANNEL_B, "A1", 2000).unwrap();
        let other_officer = db.load_officer_memory(CHANNEL_A, "A2", 2000).unwrap();
        assert_eq!(other_channel, "");
        assert_eq!(other_officer, "");
    }

    #[test]
    fn test_memory_limits_and_order() {
        let (db, roster) = seeded_db();
        let officer = roster.get("A1").unwrap();
        for i in 0..12 {
            db.add_manual_note(CHANNEL_A, "A1", &format!("note {}", i), USER, false).unwrap();
        }
        for i in 0..7 {
            save(
                &db,
                CHANNEL_A,
                &format!("brief {}", i),
                &[OfficerResult::success(officer, format!("answer {}", i))],
            );
        }

        let memory = db.load_officer_memory(CHANNEL_A, "A1", 2000).unwrap();
        let note_lines: Vec<&str> = memory.lines().filter(|l| l.starts_with("- note ")).collect();
        assert_eq!(note_lines.len(), MEMORY_NOTE_LIMIT);
        assert_eq!(note_lines[0], "- note 11");
        assert!(!note_lines.contains(&"- note 1"));
        assert_eq!(memory.matches("- Brief: ").count(), MEMORY_MISSION_LIMIT);
        assert!(memory.contains("brief 6"));
        assert!(!memory.contains("brief 1..."));
        let newest = memory.find("brief 6").unwrap();
        let older = memory.find("brief 2").unwrap();
        assert!(newest < older);
    }

    #[test]
    fn test_memory_truncated_to_budget() {
        let (db, _) = seeded_db();
        db.add_manual_note(CHANNEL_A, "A1", &"z".repeat(500), USER, false).unwrap();
        let memory = db.load_officer_memory(CHANNEL_A, "A1", 10).unwrap();
        assert_eq!(memory.chars().count(), 40);
        assert!(memory.starts_with("### Manual Notes:"));
    }

    #[test]
    fn test_clear_preserves_mission_history() {
        let (db, roster) = seeded_db();
        db.add_manual_note(CHANNEL_A, "A1", "forget me", USER, false).unwrap();
        save(
            &db,
            CHANNEL_A,
            "keep me",
            &[OfficerResult::success(roster.get("A1").unwrap(), "kept answer".to_string())],
        );

        db.clear_officer_memory(CHANNEL_A, "A1").unwrap();
        let memory = db.load_officer_memory(CHANNEL_A, "A1", 2000).unwrap();
        assert!(!memory.contains("forget me"));
        assert!(memory.contains("keep me"));

        let stats = db.channel_stats(CHANNEL_A, &["A1".to_string()]).unwrap();
        assert_eq!(stats[0].notes, 0);
        assert_eq!(stats[0].missions, 1);
    }

    #[test]
    fn test_channel_stats_counts_all_responses() {
        let (db, roster) = seeded_db();
        db.add_manual_note(CHANNEL_A, "A2", "n", USER, false).unwrap();
        save(
            &db,
            CHANNEL_A,
            "m",
            &[
                OfficerResult::success(roster.get("A1").unwrap(), "ok".to_string()),
                OfficerResult::failure(roster.get("A2").unwrap(), "bad"),
            ],
        );
        save(
            &db,
            CHANNEL_B,
            "elsewhere",
            &[OfficerResult::success(roster.get("A1").unwrap(), "ok".to_string())],
        );

        let ids = vec!["A1".to_string(), "A2".to_string(), "B1".to_string()];
        let stats = db.channel_stats(CHANNEL_A, &ids).unwrap();
        assert_eq!(
            stats,
            vec![
                OfficerMemoryStats { officer_id: "A1".to_string(), notes: 0, missions: 1 },
                OfficerMemoryStats { officer_id: "A2".to_string(), notes: 1, missions: 1 },
                OfficerMemoryStats { officer_id: "B1".to_string(), notes: 0, missions: 0 },
            ]
        );
    }
}
