//! Council orchestration: one completion request per officer, all in flight
//! together, every result collected.

pub mod prompt;
pub mod report;
pub mod roles;

use futures_util::future::join_all;
use std::sync::Arc;

use crate::ai::{ChatRequest, CompletionClient, Message, ProviderRouting, ReplyText};
use crate::db::Database;
use crate::error::WarRoomError;
use crate::models::{Officer, OfficerResult};
use crate::roster::Roster;

pub use roles::{ResearchRole, RESEARCH_COUNCIL_SIZE};

/// What to ask one officer
#[derive(Debug, Clone, Copy)]
pub struct OfficerQuery<'a> {
    pub brief: &'a str,
    pub channel_id: Option<i64>,
    pub research_role: Option<ResearchRole>,
    pub web_search: bool,
}

impl<'a> OfficerQuery<'a> {
    pub fn mission(brief: &'a str, channel_id: Option<i64>) -> Self {
        Self {
            brief,
            channel_id,
            research_role: None,
            web_search: false,
        }
    }
}

pub struct Council {
    client: CompletionClient,
    roster: Arc<Roster>,
    db: Option<Arc<Database>>,
    memory_max_tokens: usize,
}

impl Council {
    pub fn new(
        client: CompletionClient,
        roster: Arc<Roster>,
        db: Option<Arc<Database>>,
        memory_max_tokens: usize,
    ) -> Self {
        Self {
            client,
            roster,
            db,
            memory_max_tokens,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Query a single officer. Never fails: network, status and parse errors
    /// come back as a failed result carrying the error text.
    pub async fn query_officer(&self, officer: &Officer, query: OfficerQuery<'_>) -> OfficerResult {
        let supports_search = prompt::model_supports_web_search(&officer.model);
        let web_search_active = query.web_search && supports_search;

        let memory = query.channel_id.and_then(|channel_id| self.load_memory(channel_id, &officer.id));
        let system = prompt::build_system_prompt(
            &officer.system_prompt,
            query.research_role,
            memory.as_deref(),
            web_search_active,
        );
        let user = match query.research_role {
            Some(role) => prompt::research_user_prompt(query.brief, role, web_search_active),
            None => query.brief.to_string(),
        };

        // Perplexity searches natively; Gemini needs to be routed to Google for grounding
        let provider = (web_search_active && !officer.model.to_lowercase().contains("perplexity"))
            .then(ProviderRouting::google_only);

        let request = ChatRequest {
            model: officer.model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            provider,
        };

        let result = match self.client.complete(&request).await {
            Ok(reply) => {
                let (content, usable) = match reply.classify() {
                    ReplyText::Text(text) => (text, true),
                    ReplyText::ToolCallAttempt { arguments } => {
                        (prompt::tool_call_placeholder(&arguments), false)
                    }
                    ReplyText::Empty => (prompt::EMPTY_REPLY_PLACEHOLDER.to_string(), false),
                };
                let content = if query.web_search && !supports_search {
                    prompt::web_search_disclaimer(&officer.model, &content)
                } else {
                    content
                };
                if usable {
                    OfficerResult::success(officer, content)
                } else {
                    log::warn!("[COUNCIL] {} returned no usable content", officer.id);
                    OfficerResult::unusable(officer, content)
                }
            }
            Err(e) => {
                log::warn!("[COUNCIL] {} ({}) failed: {}", officer.id, officer.model, e);
                OfficerResult::failure(officer, e.message)
            }
        };

        match query.research_role {
            Some(role) => result.with_research_role(role.name()),
            None => result,
        }
    }

    /// Query every active officer matching `filter` concurrently. One result
    /// per officer in roster order; an empty match is an empty result.
    pub async fn query_all(&self, brief: &str, filter: Option<&str>, channel_id: Option<i64>) -> Vec<OfficerResult> {
        let officers = self.roster.filter_by_capability(filter);
        if officers.is_empty() {
            log::info!("[COUNCIL] No officers match filter {:?}", filter);
            return Vec::new();
        }

        log::info!("[COUNCIL] Dispatching brief to {} officers", officers.len());
        let tasks = officers
            .into_iter()
            .map(|officer| self.query_officer(officer, OfficerQuery::mission(brief, channel_id)));
        let results = join_all(tasks).await;
        log_outcome(&results);
        results
    }

    /// Research council: exactly four officers of `class`, one per role in seat order.
    /// Any other count is rejected before anything is sent.
    pub async fn query_research(
        &self,
        topic: &str,
        class: &str,
        channel_id: Option<i64>,
        web_search: bool,
    ) -> Result<Vec<OfficerResult>, WarRoomError> {
        let officers = self.roster.filter_by_capability(Some(class));
        if officers.len() != RESEARCH_COUNCIL_SIZE {
            return Err(WarRoomError::ResearchCouncilSize {
                class: class.to_string(),
                found: officers.len(),
            });
        }

        log::info!(
            "[COUNCIL] Dispatching research topic to {} officers (web search: {})",
            officers.len(),
            web_search
        );
        let tasks = officers.into_iter().zip(roles_in_seat_order()).map(|(officer, role)| {
            self.query_officer(
                officer,
                OfficerQuery {
                    brief: topic,
                    channel_id,
                    research_role: Some(role),
                    web_search,
                },
            )
        });
        let results = join_all(tasks).await;
        log_outcome(&results);
        Ok(results)
    }

    /// Red-team officer critiques the compiled council output
    pub async fn red_team_rebuttal(
        &self,
        brief: &str,
        results: &[OfficerResult],
        channel_id: Option<i64>,
    ) -> Result<OfficerResult, WarRoomError> {
        let officer = self.officer(self.roster.red_team_officer())?;
        let prompt = prompt::rebuttal_prompt(brief, results);
        Ok(self.query_officer(officer, OfficerQuery::mission(&prompt, channel_id)).await)
    }

    /// Synthesis officer turns the council output into a PLAN.md
    pub async fn generate_plan(
        &self,
        brief: &str,
        results: &[OfficerResult],
        channel_id: Option<i64>,
    ) -> Result<OfficerResult, WarRoomError> {
        let officer = self.officer(self.roster.synthesis_officer())?;
        let prompt = prompt::plan_prompt(brief, results);
        Ok(self.query_officer(officer, OfficerQuery::mission(&prompt, channel_id)).await)
    }

    /// Synthesis officer reconciles the research perspectives
    pub async fn synthesize_research(
        &self,
        topic: &str,
        results: &[OfficerResult],
        channel_id: Option<i64>,
    ) -> Result<OfficerResult, WarRoomError> {
        let officer = self.officer(self.roster.synthesis_officer())?;
        let prompt = prompt::synthesis_prompt(topic, results);
        Ok(self.query_officer(officer, OfficerQuery::mission(&prompt, channel_id)).await)
    }

    /// Re-run the same council with every prior response as shared context
    pub async fn continue_mission(
        &self,
        brief: &str,
        results: &[OfficerResult],
        filter: Option<&str>,
        channel_id: Option<i64>,
    ) -> Vec<OfficerResult> {
        let prompt = prompt::continuation_prompt(brief, results);
        self.query_all(&prompt, filter, channel_id).await
    }

    fn officer(&self, officer_id: &str) -> Result<&Officer, WarRoomError> {
        self.roster
            .get(officer_id)
            .ok_or_else(|| WarRoomError::UnknownOfficer(officer_id.to_string()))
    }

    // A memory failure degrades to a query without memory.
    fn load_memory(&self, channel_id: i64, officer_id: &str) -> Option<String> {
        let db = self.db.as_ref()?;
        match db.load_officer_memory(channel_id, officer_id, self.memory_max_tokens) {
            Ok(memory) if !memory.is_empty() => Some(memory),
            Ok(_) => None,
            Err(e) => {
                log::error!("[COUNCIL] Failed to load memory for {} in {}: {}", officer_id, channel_id, e);
                None
            }
        }
    }
}

fn roles_in_seat_order() -> impl Iterator<Item = ResearchRole> {
    (0..RESEARCH_COUNCIL_SIZE).filter_map(ResearchRole::from_index)
}

fn log_outcome(results: &[OfficerResult]) {
    let failed = results.iter().filter(|r| !r.success).count();
    log::info!("[COUNCIL] {} responses, {} failed", results.len(), failed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, ChatReply, MockCompletionClient, ToolCallSummary};
    use crate::db::tables::test_support::{seeded_db, CHANNEL_A, USER};
    use crate::models::{MissionMetadata, MissionType, NewMission};
    use crate::roster::tests::TEST_ROSTER;
    use std::time::Duration;

    const RESEARCH_ROSTER: &str = r#"{
        "active_roster": ["T1", "T2", "T3", "T4", "S1"],
        "officers": {
            "T1": {"title": "One", "model": "perplexity/sonar", "specialty": "a",
                   "capability_class": "Tactical", "system_prompt": "You are One."},
            "T2": {"title": "Two", "model": "google/gemini-2.0-flash-001", "specialty": "b",
                   "capability_class": "Tactical", "system_prompt": "You are Two."},
            "T3": {"title": "Three", "model": "anthropic/claude-3-haiku", "specialty": "c",
                   "capability_class": "Tactical", "system_prompt": "You are Three."},
            "T4": {"title": "Four", "model": "openai/gpt-4o-mini", "specialty": "d",
                   "capability_class": "Tactical", "system_prompt": "You are Four."},
            "S1": {"title": "Solo", "model": "x-ai/grok-4", "specialty": "e",
                   "capability_class": "Support", "system_prompt": "You are Solo."}
        }
    }"#;

    fn council(roster_json: &str, mock: &MockCompletionClient) -> Council {
        let roster = Arc::new(Roster::from_json(roster_json).unwrap());
        Council::new(CompletionClient::Mock(mock.clone()), roster, None, 2000)
    }

    #[tokio::test]
    async fn test_zero_matches_is_empty_not_error() {
        let mock = MockCompletionClient::new();
        let council = council(TEST_ROSTER, &mock);
        let results = council.query_all("brief", Some("Operational"), None).await;
        assert!(results.is_empty());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_one_result_per_officer_despite_failures() {
        let mock = MockCompletionClient::new()
            .with_text("anthropic/claude-3-haiku", "Alpha says go")
            .with_reply("openai/gpt-4o-mini", Err(AiError::with_status("OpenRouter API error (500): down", 500)))
            .with_reply("perplexity/sonar", Ok(ChatReply::default()))
            .with_reply("google/gemini-2.0-flash-001", Err(AiError::new("Failed to parse OpenRouter response")));
        let council = council(TEST_ROSTER, &mock);

        let results = council.query_all("brief", None, None).await;
        let ids: Vec<&str> = results.iter().map(|r| r.officer_id.as_str()).collect();
        assert_eq!(ids, ["A1", "A2", "B1", "C1"]);

        assert!(results[0].success);
        assert_eq!(results[0].response, "Alpha says go");
        assert!(!results[1].success);
        assert_eq!(results[1].response, "Error: OpenRouter API error (500): down");
        assert!(!results[2].success);
        assert_eq!(results[2].response, prompt::EMPTY_REPLY_PLACEHOLDER);
        assert!(!results[3].success);
    }

    #[tokio::test]
    async fn test_results_keep_roster_order_when_replies_arrive_out_of_order() {
        let mock = MockCompletionClient::new()
            .with_delay("anthropic/claude-3-haiku", Duration::from_millis(60))
            .with_delay("openai/gpt-4o-mini", Duration::from_millis(30));
        let council = council(TEST_ROSTER, &mock);

        let results = council.query_all("brief", Some("support"), None).await;
        let ids: Vec<&str> = results.iter().map(|r| r.officer_id.as_str()).collect();
        assert_eq!(ids, ["A1", "A2"]);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mission_request_shape() {
        let mock = MockCompletionClient::new();
        let council = council(TEST_ROSTER, &mock);
        council.query_all("Hold the line", Some("Strategic"), None).await;

        let request = mock.request_for("perplexity/sonar").unwrap();
        assert_eq!(request.system_prompt(), Some("You are Gamma."));
        assert_eq!(request.user_prompt(), Some("Hold the line"));
        assert!(request.provider.is_none());
    }

    #[tokio::test]
    async fn test_tool_call_reply_becomes_placeholder() {
        let mock = MockCompletionClient::new().with_reply(
            "anthropic/claude-3-haiku",
            Ok(ChatReply {
                content: None,
                tool_calls: vec![ToolCallSummary {
                    name: Some("web_search".to_string()),
                    arguments: Some(r#"{"q":"x"}"#.to_string()),
                }],
            }),
        );
        let council = council(TEST_ROSTER, &mock);
        let roster = Roster::from_json(TEST_ROSTER).unwrap();
        let result = council
            .query_officer(roster.get("A1").unwrap(), OfficerQuery::mission("brief", None))
            .await;
        assert!(!result.success);
        assert!(result.response.ends_with(r#"Query: {"q":"x"}"#));
    }

    #[tokio::test]
    async fn test_research_requires_exactly_four() {
        let mock = MockCompletionClient::new();
        let council = council(RESEARCH_ROSTER, &mock);

        let err = council.query_research("topic", "support", None, false).await.unwrap_err();
        assert_eq!(err.to_string(), "Expected 4 officers in support, found 1");
        let err = council.query_research("topic", "strategic", None, false).await.unwrap_err();
        assert!(matches!(err, WarRoomError::ResearchCouncilSize { found: 0, .. }));
        assert!(mock.requests().is_empty());

        let results = council.query_research("topic", "TACTICAL", None, false).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_research_roles_and_web_search() {
        let mock = MockCompletionClient::new()
            .with_text("anthropic/claude-3-haiku", "From memory");
        let council = council(RESEARCH_ROSTER, &mock);

        let results = council.query_research("Fusion", "tactical", None, true).await.unwrap();
        let roles: Vec<&str> = results.iter().filter_map(|r| r.research_role.as_deref()).collect();
        assert_eq!(
            roles,
            [
                "State-of-the-Art Researcher",
                "Critical Analyst",
                "Optimistic Visionary",
                "Historical Context Provider"
            ]
        );

        // Perplexity: search note, no provider hint
        let sonar = mock.request_for("perplexity/sonar").unwrap();
        assert!(sonar.system_prompt().unwrap().contains("## RESEARCH ROLE: State-of-the-Art Researcher"));
        assert!(sonar.system_prompt().unwrap().ends_with(prompt::WEB_SEARCH_NOTE));
        assert!(sonar.user_prompt().unwrap().ends_with(prompt::WEB_SEARCH_USER_NOTE));
        assert!(sonar.provider.is_none());

        // Gemini: pinned to Google
        let gemini = mock.request_for("google/gemini-2.0-flash-001").unwrap();
        assert_eq!(gemini.provider, Some(ProviderRouting::google_only()));

        // Claude: no search, disclaimer on the reply, still a success
        let claude = mock.request_for("anthropic/claude-3-haiku").unwrap();
        assert!(!claude.system_prompt().unwrap().contains("**IMPORTANT"));
        assert!(claude.provider.is_none());
        assert!(results[2].success);
        assert!(results[2].response.starts_with("📚 **Note: Web search not available for this model (anthropic/claude-3-haiku)"));
        assert!(results[2].response.ends_with("From memory"));
    }

    #[tokio::test]
    async fn test_memory_injected_for_channel() {
        let (db, roster) = seeded_db();
        db.add_manual_note(CHANNEL_A, "A1", "Budget is capped at 10k", USER, true).unwrap();
        let results = vec![OfficerResult::success(roster.get("A1").unwrap(), "Earlier answer".to_string())];
        db.save_mission(&NewMission {
            channel_id: CHANNEL_A,
            brief: "Earlier brief",
            user_id: USER,
            capability_class_filter: None,
            metadata: MissionMetadata::new(MissionType::Mission),
            results: &results,
        })
        .unwrap();

        let mock = MockCompletionClient::new();
        let council = Council::new(
            CompletionClient::Mock(mock.clone()),
            Arc::new(roster),
            Some(Arc::new(db)),
            2000,
        );
        council.query_all("Next step?", Some("support"), Some(CHANNEL_A)).await;

        let a1 = mock.request_for("anthropic/claude-3-haiku").unwrap();
        let system = a1.system_prompt().unwrap();
        assert!(system.starts_with("You are Alpha.\n\n## Your Memory for This Channel:\n### Manual Notes:\n- Budget is capped at 10k"));
        assert!(system.contains("- Brief: Earlier brief... | Response: Earlier answer..."));

        // A2 has no memory in this channel
        let a2 = mock.request_for("openai/gpt-4o-mini").unwrap();
        assert_eq!(a2.system_prompt(), Some("You are Beta."));
    }

    #[tokio::test]
    async fn test_follow_ups_use_role_officers() {
        let roster_json = r#"{
            "active_roster": ["R1", "P1"],
            "red_team_officer": "R1",
            "synthesis_officer": "P1",
            "officers": {
                "R1": {"title": "Red", "model": "m/red", "specialty": "a",
                       "capability_class": "Strategic", "system_prompt": "Red."},
                "P1": {"title": "Planner", "model": "m/plan", "specialty": "b",
                       "capability_class": "Strategic", "system_prompt": "Plan."}
            }
        }"#;
        let mock = MockCompletionClient::new()
            .with_text("m/red", "Weak spots")
            .with_text("m/plan", "# PLAN");
        let council = council(roster_json, &mock);
        let prior = council.query_all("Launch?", None, None).await;

        let rebuttal = council.red_team_rebuttal("Launch?", &prior, None).await.unwrap();
        assert_eq!(rebuttal.officer_id, "R1");
        assert_eq!(rebuttal.response, "Weak spots");

        let plan = council.generate_plan("Launch?", &prior, None).await.unwrap();
        assert_eq!(plan.officer_id, "P1");
        let plan_request = mock.requests().into_iter().last().unwrap();
        assert!(plan_request.user_prompt().unwrap().contains("PLAN.md"));

        let continued = council.continue_mission("Launch?", &prior, None, None).await;
        assert_eq!(continued.len(), 2);
        let last = mock.requests().into_iter().last().unwrap();
        assert!(last.user_prompt().unwrap().contains("**Council Responses:**"));
    }

    #[tokio::test]
    async fn test_missing_follow_up_officer_is_error() {
        let mock = MockCompletionClient::new();
        let council = council(TEST_ROSTER, &mock);
        // TEST_ROSTER has no O3
        let err = council.red_team_rebuttal("b", &[], None).await.unwrap_err();
        assert!(matches!(err, WarRoomError::UnknownOfficer(id) if id == "O3"));
    }
}
