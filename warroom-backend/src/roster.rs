//! Officer roster loaded from the JSON roster file.
//!
//! The roster is read once at startup and shared read-only afterwards.
//! Validation happens here so the rest of the bot can rely on every active
//! officer being fully defined.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::WarRoomError;
use crate::models::{CapabilityClass, Officer, parse_hex_color};

/// Officer used for Red Team rebuttals when the roster does not name one
pub const DEFAULT_RED_TEAM_OFFICER: &str = "O3";
/// Officer used for plans and research synthesis when the roster does not name one
pub const DEFAULT_SYNTHESIS_OFFICER: &str = "O2";

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    version: Option<serde_json::Value>,
    officers: HashMap<String, OfficerEntry>,
    active_roster: Vec<String>,
    #[serde(default)]
    red_team_officer: Option<String>,
    #[serde(default)]
    synthesis_officer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OfficerEntry {
    title: String,
    model: String,
    specialty: String,
    capability_class: String,
    system_prompt: String,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Roster {
    officers: HashMap<String, Officer>,
    active: Vec<String>,
    red_team_officer: String,
    synthesis_officer: String,
}

impl Roster {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WarRoomError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WarRoomError::Roster(format!("Failed to read roster {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, WarRoomError> {
        let file: RosterFile = serde_json::from_str(raw)
            .map_err(|e| WarRoomError::Roster(format!("Invalid roster JSON: {}", e)))?;

        if let Some(version) = &file.version {
            log::debug!("Roster version {}", version);
        }

        let mut officers = HashMap::with_capacity(file.officers.len());
        for (id, entry) in file.officers {
            let officer = Self::validate_officer(&id, entry)?;
            officers.insert(id, officer);
        }

        if file.active_roster.is_empty() {
            return Err(WarRoomError::Roster("active_roster is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for id in &file.active_roster {
            if !seen.insert(id.as_str()) {
                return Err(WarRoomError::Roster(format!(
                    "active_roster lists '{}' more than once",
                    id
                )));
            }
            if !officers.contains_key(id) {
                return Err(WarRoomError::Roster(format!(
                    "active_roster contains '{}' but no matching officer definition found",
                    id
                )));
            }
        }

        let red_team_officer = Self::resolve_role_officer(
            &officers,
            "red_team_officer",
            file.red_team_officer,
            DEFAULT_RED_TEAM_OFFICER,
        )?;
        let synthesis_officer = Self::resolve_role_officer(
            &officers,
            "synthesis_officer",
            file.synthesis_officer,
            DEFAULT_SYNTHESIS_OFFICER,
        )?;

        Ok(Self {
            officers,
            active: file.active_roster,
            red_team_officer,
            synthesis_officer,
        })
    }

    fn validate_officer(id: &str, entry: OfficerEntry) -> Result<Officer, WarRoomError> {
        let required = [
            ("title", &entry.title),
            ("model", &entry.model),
            ("specialty", &entry.specialty),
            ("system_prompt", &entry.system_prompt),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(WarRoomError::Roster(format!(
                    "Officer '{}' has an empty {}",
                    id, field
                )));
            }
        }

        let capability_class = entry
            .capability_class
            .parse::<CapabilityClass>()
            .map_err(|_| {
                WarRoomError::Roster(format!(
                    "Officer '{}' has unknown capability_class: '{}'",
                    id, entry.capability_class
                ))
            })?;

        let color = match entry.color.as_deref() {
            Some(raw) => Some(parse_hex_color(raw).ok_or_else(|| {
                WarRoomError::Roster(format!("Officer '{}' has invalid color '{}'", id, raw))
            })?),
            None => None,
        };

        Ok(Officer {
            id: id.to_string(),
            title: entry.title,
            model: entry.model,
            capability_class,
            specialty: entry.specialty,
            system_prompt: entry.system_prompt,
            color,
        })
    }

    // An explicitly named officer must exist; the defaults may be absent from small rosters.
    fn resolve_role_officer(
        officers: &HashMap<String, Officer>,
        field: &str,
        named: Option<String>,
        default: &str,
    ) -> Result<String, WarRoomError> {
        match named {
            Some(id) if !officers.contains_key(&id) => Err(WarRoomError::Roster(format!(
                "{} '{}' is not defined in officers",
                field, id
            ))),
            Some(id) => Ok(id),
            None => Ok(default.to_string()),
        }
    }

    pub fn get(&self, officer_id: &str) -> Option<&Officer> {
        self.officers.get(officer_id)
    }

    pub fn contains(&self, officer_id: &str) -> bool {
        self.officers.contains_key(officer_id)
    }

    /// Every defined officer, active or not
    pub fn officers(&self) -> impl Iterator<Item = &Officer> {
        self.officers.values()
    }

    /// Active officer ids in roster order
    pub fn active_ids(&self) -> &[String] {
        &self.active
    }

    pub fn red_team_officer(&self) -> &str {
        &self.red_team_officer
    }

    pub fn synthesis_officer(&self) -> &str {
        &self.synthesis_officer
    }

    /// Active officers whose class matches `filter` (case-insensitive), in roster order.
    /// No filter (or a blank one) returns the whole active roster; an unknown class
    /// matches nobody.
    pub fn filter_by_capability(&self, filter: Option<&str>) -> Vec<&Officer> {
        let wanted = filter.map(str::trim).filter(|f| !f.is_empty());
        self.active
            .iter()
            .filter_map(|id| self.officers.get(id))
            .filter(|officer| match wanted {
                None => true,
                Some(f) => officer.capability_class.as_ref().eq_ignore_ascii_case(f),
            })
            .collect()
    }
}
