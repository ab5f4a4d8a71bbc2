use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumString};

use super::officer::{CapabilityClass, Officer};

/// Outcome of one officer query. Always produced, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficerResult {
    pub officer_id: String,
    pub title: String,
    pub model: String,
    pub specialty: String,
    pub capability_class: CapabilityClass,
    pub color: u32,
    /// Research perspective the officer answered from, when in research mode
    pub research_role: Option<String>,
    pub response: String,
    pub success: bool,
    pub error: Option<String>,
}

impl OfficerResult {
    pub fn success(officer: &Officer, response: String) -> Self {
        Self::build(officer, response, true, None)
    }

    /// A reply that arrived but carried no usable text
    pub fn unusable(officer: &Officer, placeholder: String) -> Self {
        Self::build(officer, placeholder, false, None)
    }

    pub fn failure(officer: &Officer, error: impl Into<String>) -> Self {
        let error = error.into();
        Self::build(officer, format!("Error: {}", error), false, Some(error))
    }

    pub fn with_research_role(mut self, role: &str) -> Self {
        self.research_role = Some(role.to_string());
        self
    }

    /// "O1 - Chief of Staff"
    pub fn label(&self) -> String {
        format!("{} - {}", self.officer_id, self.title)
    }

    pub fn status_label(&self) -> &'static str {
        if self.success { "✅ Complete" } else { "❌ Error" }
    }

    fn build(officer: &Officer, response: String, success: bool, error: Option<String>) -> Self {
        Self {
            officer_id: officer.id.clone(),
            title: officer.title.clone(),
            model: officer.model.clone(),
            specialty: officer.specialty.clone(),
            capability_class: officer.capability_class,
            color: officer.display_color(),
            research_role: None,
            response,
            success,
            error,
        }
    }
}

/// What kind of query produced a mission row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissionType {
    Mission,
    Research,
    Continue,
    Pivot,
    ResearchPivot,
    Rebuttal,
    Plan,
    Synthesis,
}

/// Free-form metadata stored alongside a mission row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionMetadata {
    pub mission_type: MissionType,
    /// officer_id -> research role, for research missions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub research_roles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub web_search_enabled: bool,
}

impl MissionMetadata {
    pub fn new(mission_type: MissionType) -> Self {
        Self {
            mission_type,
            research_roles: BTreeMap::new(),
            web_search_enabled: false,
        }
    }

    pub fn research(mission_type: MissionType, results: &[OfficerResult], web_search: bool) -> Self {
        let research_roles = results
            .iter()
            .filter_map(|r| {
                r.research_role
                    .as_ref()
                    .map(|role| (r.officer_id.clone(), role.clone()))
            })
            .collect();
        Self {
            mission_type,
            research_roles,
            web_search_enabled: web_search,
        }
    }
}

/// Everything needed to persist one mission and its responses
#[derive(Debug, Clone)]
pub struct NewMission<'a> {
    pub channel_id: i64,
    pub brief: &'a str,
    pub user_id: i64,
    pub capability_class_filter: Option<&'a str>,
    pub metadata: MissionMetadata,
    pub results: &'a [OfficerResult],
}

/// User-authored memory note for one officer in one channel
#[derive(Debug, Clone, Serialize)]
pub struct ManualNote {
    pub id: i64,
    pub officer_id: String,
    pub channel_id: i64,
    pub note_content: String,
    pub created_by_user_id: i64,
    pub is_pinned: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-officer memory counters for one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficerMemoryStats {
    pub officer_id: String,
    pub notes: i64,
    pub missions: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn officer() -> Officer {
        Officer {
            id: "T1".to_string(),
            title: "Test Officer Alpha".to_string(),
            model: "anthropic/claude-3-haiku".to_string(),
            capability_class: CapabilityClass::Support,
            specialty: "Unit Testing".to_string(),
            system_prompt: "You are Test Officer Alpha.".to_string(),
            color: Some(0xAABBCC),
        }
    }

    #[test]
    fn test_failure_carries_error_text() {
        let result = OfficerResult::failure(&officer(), "Connection refused");
        assert!(!result.success);
        assert_eq!(result.response, "Error: Connection refused");
        assert_eq!(result.error.as_deref(), Some("Connection refused"));
        assert_eq!(result.color, 0xAABBCC);
    }

    #[test]
    fn test_mission_type_round_trips_as_snake_case() {
        assert_eq!(MissionType::ResearchPivot.as_ref(), "research_pivot");
        let json = serde_json::to_string(&MissionMetadata::new(MissionType::ResearchPivot)).unwrap();
        assert_eq!(json, r#"{"mission_type":"research_pivot"}"#);
    }

    #[test]
    fn test_research_metadata_collects_roles() {
        let results = vec![
            OfficerResult::success(&officer(), "ok".to_string()).with_research_role("Critical Analyst"),
        ];
        let meta = MissionMetadata::research(MissionType::Research, &results, true);
        assert_eq!(meta.research_roles.get("T1").map(String::as_str), Some("Critical Analyst"));
        assert!(meta.web_search_enabled);
    }
}
