//! Table operations - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks for one table group.

mod channels; // channels
mod memory;   // prompt memory assembly + per-channel stats
mod missions; // mission_history, mission_officer_response
mod notes;    // manual_notes
mod officers; // officers (roster sync)

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::Database;
    use crate::roster::{tests::TEST_ROSTER, Roster};

    pub const CHANNEL_A: i64 = 1001;
    pub const CHANNEL_B: i64 = 2002;
    pub const USER: i64 = 42;

    /// In-memory database with the test roster synced and two channels
    pub fn seeded_db() -> (Database, Roster) {
        let roster = Roster::from_json(TEST_ROSTER).unwrap();
        let db = Database::in_memory().unwrap();
        db.upsert_officers(roster.officers()).unwrap();
        db.ensure_channel(CHANNEL_A, "alpha-ops", 1).unwrap();
        db.ensure_channel(CHANNEL_B, "bravo-ops", 1).unwrap();
        (db, roster)
    }
}
