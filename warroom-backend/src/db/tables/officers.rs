//! Officer table: roster sync

use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;

use crate::error::DbResult;
use crate::models::Officer;
use super::super::{timestamp, Database};

/// Counts from one roster sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSync {
    pub created: usize,
    pub updated: usize,
    /// Stored officers missing from the roster; kept for history
    pub retained: Vec<String>,
}

impl Database {
    /// Insert new officers and update existing ones in place.
    /// Officers already stored but absent from `officers` are never deleted.
    pub fn upsert_officers<'a>(
        &self,
        officers: impl IntoIterator<Item = &'a Officer>,
    ) -> DbResult<RosterSync> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = timestamp();
        let mut sync = RosterSync::default();
        let mut seen = HashSet::new();

        for officer in officers {
            seen.insert(officer.id.clone());
            let exists = tx
                .query_row(
                    "SELECT 1 FROM officers WHERE officer_id = ?1",
                    [&officer.id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            if exists {
                tx.execute(
                    "UPDATE officers SET title = ?2, model = ?3, capability_class = ?4,
                            specialty = ?5, system_prompt = ?6, color = ?7, updated_at = ?8
                     WHERE officer_id = ?1",
                    params![
                        officer.id,
                        officer.title,
                        officer.model,
                        officer.capability_class.as_ref(),
                        officer.specialty,
                        officer.system_prompt,
                        officer.color,
                        now,
                    ],
                )?;
                sync.updated += 1;
                log::debug!("Updated officer {}", officer.id);
            } else {
                tx.execute(
                    "INSERT INTO officers (officer_id, title, model, capability_class, specialty,
                                           system_prompt, color, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                    params![
                        officer.id,
                        officer.title,
                        officer.model,
                        officer.capability_class.as_ref(),
                        officer.specialty,
                        officer.system_prompt,
                        officer.color,
                        now,
                    ],
                )?;
                sync.created += 1;
                log::debug!("Created officer {}", officer.id);
            }
        }

        {
            let mut stmt = tx.prepare("SELECT officer_id FROM officers ORDER BY officer_id")?;
            let stored = stmt.query_map([], |row| row.get::<_, String>(0))?;
            for id in stored {
                let id = id?;
                if !seen.contains(&id) {
                    log::warn!("Officer {} in database but not in roster (keeping for history)", id);
                    sync.retained.push(id);
                }
            }
        }

        tx.commit()?;
        log::info!(
            "Roster sync complete: {} created, {} updated, {} retained",
            sync.created,
            sync.updated,
            sync.retained.len()
        );
        Ok(sync)
    }
}

#[cfg(test)]
impl Database {
    /// Stored model for an officer, if the officer is known
    pub(crate) fn officer_model(&self, officer_id: &str) -> DbResult<Option<String>> {
        use rusqlite::OptionalExtension;

        let conn = self.conn()?;
        let model = conn
            .query_row(
                "SELECT model FROM officers WHERE officer_id = ?1",
                [officer_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::roster::{tests::TEST_ROSTER, Roster};

    #[test]
    fn test_upsert_creates_then_updates() {
        let db = Database::in_memory().unwrap();
        let roster = Roster::from_json(TEST_ROSTER).unwrap();

        let first = db.upsert_officers(roster.officers()).unwrap();
        assert_eq!(first.created, 5);
        assert_eq!(first.updated, 0);

        let mut changed = roster.get("A1").unwrap().clone();
        changed.model = "anthropic/claude-3.5-sonnet".to_string();
        let second = db.upsert_officers([&changed]).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(
            db.officer_model("A1").unwrap().as_deref(),
            Some("anthropic/claude-3.5-sonnet")
        );
    }

    #[test]
    fn test_officers_missing_from_roster_are_retained() {
        let db = Database::in_memory().unwrap();
        let roster = Roster::from_json(TEST_ROSTER).unwrap();
        db.upsert_officers(roster.officers()).unwrap();

        let only_a1 = roster.get("A1").unwrap();
        let sync = db.upsert_officers([only_a1]).unwrap();
        assert_eq!(sync.retained, ["A2", "B1", "C1", "S2"]);
        assert!(db.officer_model("S2").unwrap().is_some());
    }

    #[test]
    fn test_unknown_officer_model_is_none() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.officer_model("Z9").unwrap(), None);
    }
}
